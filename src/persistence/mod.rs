//! Boundary contracts for the external collaborators: snapshot persistence
//! and entitlement checks.
//!
//! The calculator core never touches these; the orchestration layer consults
//! the gate before initialize/fast-forward and hands session documents to the
//! store after mutations.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::SessionKey;
use crate::engine::CalculatorSession;

pub mod memory;
pub mod sqlite;

pub use memory::{AllowAllGate, MemoryStore};
pub use sqlite::{SqliteGate, SqliteStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage failure: {0}")]
    Backend(String),
    #[error("stored snapshot is not decodable: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Persists full session documents (live state plus history stacks).
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved session document, or `None` for a fresh key.
    async fn load(&self, key: &SessionKey) -> Result<Option<CalculatorSession>, StoreError>;

    /// Idempotent upsert of the full session document.
    async fn save(&self, key: &SessionKey, session: &CalculatorSession) -> Result<(), StoreError>;
}

/// Decides whether a key may run initialize or fast-forward.
#[async_trait]
pub trait EntitlementGate: Send + Sync {
    async fn has_active(&self, key: &SessionKey) -> Result<bool, StoreError>;
}
