//! Configuration Module
//! 
//! Handles configuration loading, validation, and the push target string.

pub mod manager;
pub mod target;
pub mod types;

pub use manager::ConfigManager;
pub use target::ExporterConfig;
pub use types::*;
