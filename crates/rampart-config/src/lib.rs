//! Engine configuration: typed sections with RON persistence.

pub mod config;
pub mod error;

pub use config::{DebugConfig, EngineConfig, WorkerConfig, WorldConfig};
pub use error::ConfigError;
