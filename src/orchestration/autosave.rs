//! Debounced persistence of session documents.
//!
//! Mutations hand the saver a full document copy and return immediately;
//! rapid edits to the same key coalesce into one write after a quiet period.
//! Each key debounces on its own clock, so a steadily mutating session never
//! postpones the flush of an idle one. Flushes run sequentially, so there is
//! at most one in-flight save per key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::warn;

use crate::domain::SessionKey;
use crate::engine::CalculatorSession;
use crate::persistence::SnapshotStore;

#[derive(Clone)]
pub struct Autosaver {
    tx: mpsc::Sender<(SessionKey, CalculatorSession)>,
}

impl Autosaver {
    /// Spawn the saver task on the current runtime.
    pub fn spawn(store: Arc<dyn SnapshotStore>, quiet_period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(run(rx, store, quiet_period));
        Autosaver { tx }
    }

    /// Queue a document for saving. Fire-and-forget: a full queue drops this
    /// copy, a later mutation re-queues the key.
    pub fn schedule(&self, key: SessionKey, session: CalculatorSession) {
        if self.tx.try_send((key, session)).is_err() {
            warn!("autosave queue full; snapshot dropped until next mutation");
        }
    }
}

async fn run(
    mut rx: mpsc::Receiver<(SessionKey, CalculatorSession)>,
    store: Arc<dyn SnapshotStore>,
    quiet_period: Duration,
) {
    let mut pending: HashMap<SessionKey, (Instant, CalculatorSession)> = HashMap::new();

    loop {
        let next_due = pending.values().map(|(due, _)| *due).min();

        tokio::select! {
            received = rx.recv() => {
                match received {
                    Some((key, session)) => {
                        // Latest document wins per key; only that key's
                        // quiet period restarts.
                        pending.insert(key, (Instant::now() + quiet_period, session));
                    }
                    None => break,
                }
            }
            _ = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                flush_due(store.as_ref(), &mut pending, Instant::now()).await;
            }
        }
    }

    // Channel closed: drain whatever is still pending.
    for (key, (_, session)) in pending.drain() {
        save(store.as_ref(), &key, &session).await;
    }
}

/// Flush every key whose quiet period has elapsed.
async fn flush_due(
    store: &dyn SnapshotStore,
    pending: &mut HashMap<SessionKey, (Instant, CalculatorSession)>,
    now: Instant,
) {
    let due: Vec<SessionKey> = pending
        .iter()
        .filter(|(_, (deadline, _))| *deadline <= now)
        .map(|(key, _)| key.clone())
        .collect();
    for key in due {
        if let Some((_, session)) = pending.remove(&key) {
            save(store, &key, &session).await;
        }
    }
}

async fn save(store: &dyn SnapshotStore, key: &SessionKey, session: &CalculatorSession) {
    if let Err(err) = store.save(key, session).await {
        warn!(key = %key, "autosave failed: {}", err);
    }
}
