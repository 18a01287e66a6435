//! Orchestration around the synchronous calculator core: session ownership,
//! entitlement gating and debounced persistence.

pub mod autosave;
pub mod manager;

pub use autosave::Autosaver;
pub use manager::{ManagerError, SessionManager};
