//! Roll persistence boundary.
//!
//! The store assigns ids, records soft deletes and hands out consistent
//! snapshots for the stats engine. It never computes statistics itself.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryRollStore;
pub use postgres::PostgresRollStore;

use chrono::{DateTime, Utc};
use thiserror::Error;

use rollstock_core::{DomainError, RollId};
use rollstock_inventory::{NewRoll, Roll, RollFilter, StatsWindow};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("roll not found: {0}")]
    NotFound(RollId),

    /// A domain rule rejected the operation (validation, double removal).
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Async persistence interface for rolls.
#[async_trait::async_trait]
pub trait RollStore: Send + Sync {
    /// Persist a new active roll; the store assigns its id.
    async fn create(&self, new: NewRoll, added_at: DateTime<Utc>) -> Result<Roll, StoreError>;

    /// Set `removed_date` on an active roll and return the updated record.
    async fn soft_delete(&self, id: RollId, removed_at: DateTime<Utc>) -> Result<Roll, StoreError>;

    async fn get(&self, id: RollId) -> Result<Option<Roll>, StoreError>;

    /// Rolls matching every range in `filter`, ordered by id.
    async fn list(&self, filter: &RollFilter) -> Result<Vec<Roll>, StoreError>;

    /// Rolls added within `window` whose removal (if any) is no later than its
    /// end, ordered by id. The result is one consistent snapshot.
    async fn stats_snapshot(&self, window: &StatsWindow) -> Result<Vec<Roll>, StoreError>;
}
