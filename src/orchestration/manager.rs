//! Session ownership and the operations the API exposes.
//!
//! The manager owns the live sessions, rehydrates them lazily from the
//! snapshot store, consults the entitlement gate before the resetting
//! operations and schedules an autosave after every mutation. The calculator
//! core itself stays synchronous; each operation completes atomically under
//! the session map lock.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{SessionKey, TradingParams};
use crate::engine::{CalculatorSession, Outcome, SessionError, SessionView};
use crate::persistence::{EntitlementGate, SnapshotStore, StoreError};

use super::autosave::Autosaver;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("active entitlement required")]
    EntitlementDenied,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct SessionManager {
    sessions: Mutex<HashMap<SessionKey, CalculatorSession>>,
    store: Arc<dyn SnapshotStore>,
    gate: Arc<dyn EntitlementGate>,
    autosaver: Autosaver,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        gate: Arc<dyn EntitlementGate>,
        autosaver: Autosaver,
    ) -> Self {
        SessionManager {
            sessions: Mutex::new(HashMap::new()),
            store,
            gate,
            autosaver,
        }
    }

    /// Mint a key with an empty session behind it.
    pub async fn create(&self) -> SessionKey {
        let key = SessionKey::generate();
        let mut sessions = self.sessions.lock().await;
        sessions.insert(key.clone(), CalculatorSession::new());
        key
    }

    /// Number of sessions currently held live in memory.
    pub async fn live_session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Run a read-only closure against the session for `key`.
    ///
    /// A key with neither a live nor a persisted session answers with an
    /// empty session without entering the map, so probing reads with random
    /// keys cannot grow it.
    async fn inspect<T>(
        &self,
        key: &SessionKey,
        op: impl FnOnce(&CalculatorSession) -> T,
    ) -> Result<T, ManagerError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(key) {
            return Ok(op(session));
        }
        match self.store.load(key).await? {
            Some(restored) => {
                let session = sessions.entry(key.clone()).or_insert(restored);
                Ok(op(session))
            }
            None => Ok(op(&CalculatorSession::new())),
        }
    }

    /// Run a mutating closure and schedule an autosave of the result.
    ///
    /// The session enters the live map only when the operation succeeds; a
    /// failed mutation on an unknown key leaves no trace.
    async fn mutate<T>(
        &self,
        key: &SessionKey,
        op: impl FnOnce(&mut CalculatorSession) -> Result<T, SessionError>,
    ) -> Result<T, ManagerError> {
        let mut sessions = self.sessions.lock().await;
        let live = sessions.remove(key);
        let was_live = live.is_some();
        let mut session = match live {
            Some(session) => session,
            None => self.store.load(key).await?.unwrap_or_default(),
        };
        match op(&mut session) {
            Ok(out) => {
                self.autosaver.schedule(key.clone(), session.clone());
                sessions.insert(key.clone(), session);
                Ok(out)
            }
            Err(err) => {
                // Failed operations leave session state untouched, so a
                // previously live session goes back as-is.
                if was_live {
                    sessions.insert(key.clone(), session);
                }
                Err(err.into())
            }
        }
    }

    async fn ensure_entitled(&self, key: &SessionKey) -> Result<(), ManagerError> {
        if self.gate.has_active(key).await? {
            Ok(())
        } else {
            Err(ManagerError::EntitlementDenied)
        }
    }

    pub async fn view(&self, key: &SessionKey) -> Result<SessionView, ManagerError> {
        self.inspect(key, |session| session.view()).await
    }

    pub async fn initialize(
        &self,
        key: &SessionKey,
        initial_amount: f64,
        params: TradingParams,
    ) -> Result<SessionView, ManagerError> {
        self.ensure_entitled(key).await?;
        self.mutate(key, |session| {
            session.initialize(initial_amount, params)?;
            Ok(session.view())
        })
        .await
    }

    pub async fn record_outcome(
        &self,
        key: &SessionKey,
        outcome: Outcome,
    ) -> Result<SessionView, ManagerError> {
        self.mutate(key, |session| {
            session.record_outcome(outcome)?;
            Ok(session.view())
        })
        .await
    }

    pub async fn fast_forward(
        &self,
        key: &SessionKey,
        initial_amount: f64,
        params: TradingParams,
        target_serial: u32,
    ) -> Result<SessionView, ManagerError> {
        self.ensure_entitled(key).await?;
        self.mutate(key, |session| {
            session.fast_forward(initial_amount, params, target_serial)?;
            Ok(session.view())
        })
        .await
    }

    pub async fn set_params(
        &self,
        key: &SessionKey,
        params: TradingParams,
    ) -> Result<SessionView, ManagerError> {
        self.mutate(key, |session| {
            session.set_params(params)?;
            Ok(session.view())
        })
        .await
    }

    /// Undo one step. A session that was never initialized errors; undoing at
    /// the history floor is a no-op that returns the unchanged view.
    pub async fn undo(&self, key: &SessionKey) -> Result<SessionView, ManagerError> {
        self.mutate(key, |session| {
            if !session.is_initialized() {
                return Err(SessionError::NotInitialized);
            }
            session.undo();
            Ok(session.view())
        })
        .await
    }

    /// Redo one step; a no-op with nothing undone.
    pub async fn redo(&self, key: &SessionKey) -> Result<SessionView, ManagerError> {
        self.mutate(key, |session| {
            if !session.is_initialized() {
                return Err(SessionError::NotInitialized);
            }
            session.redo();
            Ok(session.view())
        })
        .await
    }
}
