use std::sync::Arc;

use rollstock_core::DomainError;
use rollstock_infra::{AppConfig, InMemoryRollStore, PostgresRollStore, RollStore, StoreError};

/// Handles shared by every request.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn RollStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn RollStore>) -> Self {
        Self { store }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRollStore::new()))
    }

    pub fn store(&self) -> &dyn RollStore {
        self.store.as_ref()
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    if !config.use_persistent_stores {
        tracing::info!("using in-memory roll store");
        return Ok(AppServices::in_memory());
    }

    let database_url = config.database_url.as_deref().ok_or_else(|| {
        StoreError::Domain(DomainError::validation(
            "DATABASE_URL must be set when USE_PERSISTENT_STORES=true",
        ))
    })?;

    let store = PostgresRollStore::connect(database_url, config.database_max_connections).await?;
    store.ensure_schema().await?;
    tracing::info!(
        max_connections = config.database_max_connections,
        "using postgres roll store"
    );

    Ok(AppServices::new(Arc::new(store)))
}
