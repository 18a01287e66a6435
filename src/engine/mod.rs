//! Pure, synchronous calculator core.
//!
//! Step math, the session state machine, and the undo/redo history manager.
//! Nothing in this module does I/O or depends on the async runtime.

pub mod history;
pub mod session;
pub mod steps;

pub use history::History;
pub use session::{
    CalculatorSession, LedgerStats, Outcome, SessionError, SessionState, SessionView,
};
pub use steps::Change;
