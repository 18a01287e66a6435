//! SQLite-backed collaborators over the repository layer.

use async_trait::async_trait;
use std::sync::Arc;

use crate::db::Repository;
use crate::domain::SessionKey;
use crate::engine::CalculatorSession;

use super::{EntitlementGate, SnapshotStore, StoreError};

/// Snapshot store that keeps one JSON document per session key.
pub struct SqliteStore {
    repo: Arc<Repository>,
}

impl SqliteStore {
    pub fn new(repo: Arc<Repository>) -> Self {
        SqliteStore { repo }
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<CalculatorSession>, StoreError> {
        let Some(document) = self.repo.fetch_snapshot(key.as_str()).await? else {
            return Ok(None);
        };
        let session =
            serde_json::from_str(&document).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Some(session))
    }

    async fn save(&self, key: &SessionKey, session: &CalculatorSession) -> Result<(), StoreError> {
        let document =
            serde_json::to_string(session).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.repo.upsert_snapshot(key.as_str(), &document).await?;
        Ok(())
    }
}

/// Gate backed by the entitlements table.
pub struct SqliteGate {
    repo: Arc<Repository>,
}

impl SqliteGate {
    pub fn new(repo: Arc<Repository>) -> Self {
        SqliteGate { repo }
    }
}

#[async_trait]
impl EntitlementGate for SqliteGate {
    async fn has_active(&self, key: &SessionKey) -> Result<bool, StoreError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        Ok(self.repo.entitlement_active(key.as_str(), now_ms).await?)
    }
}
