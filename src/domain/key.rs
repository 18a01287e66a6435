//! Opaque per-user session identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key under which a calculator session is stored and gated.
///
/// The surrounding application decides what the key encodes (user id,
/// device, ...); the service treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: String) -> Self {
        SessionKey(key)
    }

    /// Mint a fresh random key.
    pub fn generate() -> Self {
        SessionKey(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
