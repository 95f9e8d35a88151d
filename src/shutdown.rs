//! Graceful Shutdown Handling
//!
//! Listens for SIGTERM/SIGINT and broadcasts a shutdown signal to the push
//! scheduler, which finishes its current cycle and stops.

use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use crate::Result;

/// Shutdown coordinator that manages the graceful shutdown process
pub struct ShutdownCoordinator {
    /// Broadcast sender for shutdown signal
    shutdown_tx: broadcast::Sender<()>,
    /// How long to wait for a running push cycle to finish
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new(timeout: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_tx,
            timeout,
        }
    }

    /// Get a shutdown receiver for components to listen for shutdown signals
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Broadcast the shutdown signal without waiting for an OS signal
    pub fn trigger(&self) {
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal: {}", e);
        }
    }

    /// Wait for SIGTERM, SIGINT or Ctrl+C, then broadcast shutdown
    pub async fn listen_for_signals(&self) -> Result<()> {
        info!("Starting shutdown signal listener");

        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                }
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                }
            }
        }

        #[cfg(windows)]
        {
            signal::ctrl_c().await?;
            info!("Received Ctrl+C, initiating graceful shutdown");
        }

        self.trigger();
        Ok(())
    }

    /// Wait for a task to stop after shutdown, aborting it on timeout
    ///
    /// A push cycle can take up to one socket timeout per metric, so the
    /// timeout should be chosen with the registry size in mind. Aborting only
    /// cancels the async task; a cycle already running on the blocking pool
    /// carries on until its last POST returns.
    pub async fn wait_for_task(&self, name: &str, mut handle: JoinHandle<()>) -> Result<()> {
        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(())) => {
                info!("{} stopped", name);
                Ok(())
            }
            Ok(Err(e)) if e.is_cancelled() => Ok(()),
            Ok(Err(e)) => {
                error!("{} failed: {}", name, e);
                Err(anyhow::anyhow!("{} failed: {}", name, e))
            }
            Err(_) => {
                warn!(
                    "{} did not stop within {:?}, aborting it; a push cycle in progress keeps running until it finishes",
                    name, self.timeout
                );
                handle.abort();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_shutdown_signal_broadcast() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let mut receiver = coordinator.subscribe();

        coordinator.trigger();

        assert!(receiver.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_wait_for_task_completes() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let mut shutdown_rx = coordinator.subscribe();

        let handle = tokio::spawn(async move {
            let _ = shutdown_rx.recv().await;
        });

        coordinator.trigger();
        assert!(coordinator.wait_for_task("test task", handle).await.is_ok());
    }

    #[tokio::test]
    async fn test_wait_for_task_aborts_on_timeout() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));

        let handle = tokio::spawn(async {
            sleep(Duration::from_secs(30)).await;
        });

        assert!(coordinator.wait_for_task("slow task", handle).await.is_ok());
    }

    #[tokio::test]
    async fn test_abort_does_not_cancel_blocking_cycle() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));
        let finished = Arc::new(AtomicBool::new(false));

        let flag = finished.clone();
        let handle = tokio::spawn(async move {
            let _ = tokio::task::spawn_blocking(move || {
                std::thread::sleep(Duration::from_millis(300));
                flag.store(true, Ordering::SeqCst);
            })
            .await;
        });

        assert!(coordinator.wait_for_task("push scheduler", handle).await.is_ok());
        assert!(!finished.load(Ordering::SeqCst));

        sleep(Duration::from_millis(600)).await;
        assert!(finished.load(Ordering::SeqCst));
    }
}
