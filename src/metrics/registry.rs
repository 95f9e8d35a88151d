//! Metric Registry
//!
//! Insertion-ordered metric store shared between the update path and the
//! pushers. Every value cell is guarded by one registry-wide reader-writer
//! lock; readers copy a value and release the lock immediately.

use super::{MetricDescriptor, MetricSample, RegistryError};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

#[derive(Debug)]
struct MetricSlot {
    name: String,
    value: i64,
    initial_value: i64,
    reset_after_push: bool,
}

#[derive(Debug, Default)]
struct RegistryInner {
    slots: Vec<MetricSlot>,
    by_name: HashMap<String, usize>,
}

/// Named integer metrics in registration order
///
/// Metrics can be added but never removed, so a slot position stays valid
/// for the lifetime of the registry.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    inner: RwLock<RegistryInner>,
}

impl MetricRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // Values are plain integers, so a writer panicking mid-update cannot
    // leave a slot half-written. Poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new metric at the end of the push order
    pub fn register(&self, descriptor: MetricDescriptor) -> Result<(), RegistryError> {
        if descriptor.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut inner = self.write();
        if inner.by_name.contains_key(&descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name));
        }

        let position = inner.slots.len();
        inner.by_name.insert(descriptor.name.clone(), position);
        inner.slots.push(MetricSlot {
            name: descriptor.name,
            value: descriptor.initial_value,
            initial_value: descriptor.initial_value,
            reset_after_push: descriptor.reset_after_push,
        });

        let slot = &inner.slots[position];
        info!(
            metric = %slot.name,
            initial_value = slot.initial_value,
            reset_after_push = slot.reset_after_push,
            "Registered metric"
        );
        Ok(())
    }

    fn update<F>(&self, name: &str, op: F) -> Result<i64, RegistryError>
    where
        F: FnOnce(i64) -> i64,
    {
        let mut inner = self.write();
        let position = *inner
            .by_name
            .get(name)
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))?;
        let slot = &mut inner.slots[position];
        slot.value = op(slot.value);
        Ok(slot.value)
    }

    /// Add `delta` to a metric, returning the new value
    pub fn inc(&self, name: &str, delta: i64) -> Result<i64, RegistryError> {
        self.update(name, |value| value.wrapping_add(delta))
    }

    /// Subtract `delta` from a metric, returning the new value
    pub fn dec(&self, name: &str, delta: i64) -> Result<i64, RegistryError> {
        self.update(name, |value| value.wrapping_sub(delta))
    }

    /// Overwrite a metric value
    pub fn set(&self, name: &str, value: i64) -> Result<(), RegistryError> {
        self.update(name, |_| value).map(|_| ())
    }

    /// Current value of a metric
    pub fn get(&self, name: &str) -> Result<i64, RegistryError> {
        let inner = self.read();
        inner
            .by_name
            .get(name)
            .map(|&position| inner.slots[position].value)
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.read().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a lazy pass over the registry in registration order
    ///
    /// Each metric is read under its own short read lock when the iterator
    /// reaches it. Nothing is locked between items.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            registry: self,
            position: 0,
        }
    }

    /// Serialize all current values as the generic host JSON snapshot
    ///
    /// Shape: `{"metrics":[{"name":"...","value":N},...]}` in push order.
    pub fn to_json(&self) -> crate::Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct HostSnapshot {
            metrics: Vec<MetricSample>,
        }

        let metrics = self.snapshot().map(SampledMetric::into_sample).collect();
        Ok(serde_json::to_vec(&HostSnapshot { metrics })?)
    }

    fn reset_slot(&self, position: usize) {
        let mut inner = self.write();
        if let Some(slot) = inner.slots.get_mut(position) {
            slot.value = slot.initial_value;
            debug!(metric = %slot.name, value = slot.value, "Reset metric after push");
        }
    }
}

/// One-shot, lazy iterator over the registry
pub struct Snapshot<'a> {
    registry: &'a MetricRegistry,
    position: usize,
}

impl<'a> Iterator for Snapshot<'a> {
    type Item = SampledMetric<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (sample, reset_after_push) = {
            let inner = self.registry.read();
            let slot = inner.slots.get(self.position)?;
            (
                MetricSample::new(slot.name.clone(), slot.value),
                slot.reset_after_push,
            )
        };

        let position = self.position;
        self.position += 1;

        Some(SampledMetric {
            sample,
            reset_after_push,
            position,
            registry: self.registry,
        })
    }
}

/// A value copied out of the registry, plus its pending reset
///
/// Dropping it without calling [`SampledMetric::finish`] skips the reset.
pub struct SampledMetric<'a> {
    sample: MetricSample,
    reset_after_push: bool,
    position: usize,
    registry: &'a MetricRegistry,
}

impl SampledMetric<'_> {
    pub fn sample(&self) -> &MetricSample {
        &self.sample
    }

    pub fn reset_after_push(&self) -> bool {
        self.reset_after_push
    }

    /// Complete this metric for the cycle, resetting it when flagged
    ///
    /// The reset takes the write lock separately from the read that produced
    /// the sample; an update landing in between is overwritten. Returns
    /// whether a reset happened.
    pub fn finish(self) -> bool {
        if self.reset_after_push {
            self.registry.reset_slot(self.position);
        }
        self.reset_after_push
    }

    fn into_sample(self) -> MetricSample {
        self.sample
    }
}
