//! Infrastructure layer: roll persistence and process configuration.

pub mod config;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use store::{InMemoryRollStore, PostgresRollStore, RollStore, StoreError};
