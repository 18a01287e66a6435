//! In-memory collaborators for tests and entitlement-free deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::SessionKey;
use crate::engine::CalculatorSession;

use super::{EntitlementGate, SnapshotStore, StoreError};

/// Snapshot store over a plain map. Documents go through JSON like the SQLite
/// store does, so serialization bugs surface in tests too.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<SessionKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().expect("memory store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<CalculatorSession>, StoreError> {
        let documents = self.documents.lock().expect("memory store lock");
        documents
            .get(key)
            .map(|doc| serde_json::from_str(doc).map_err(|e| StoreError::Corrupt(e.to_string())))
            .transpose()
    }

    async fn save(&self, key: &SessionKey, session: &CalculatorSession) -> Result<(), StoreError> {
        let doc =
            serde_json::to_string(session).map_err(|e| StoreError::Backend(e.to_string()))?;
        let mut documents = self.documents.lock().expect("memory store lock");
        documents.insert(key.clone(), doc);
        Ok(())
    }
}

/// Gate that admits every key; used when entitlement enforcement is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllGate;

#[async_trait]
impl EntitlementGate for AllowAllGate {
    async fn has_active(&self, _key: &SessionKey) -> Result<bool, StoreError> {
        Ok(true)
    }
}
