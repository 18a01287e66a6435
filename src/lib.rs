pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod persistence;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{round4, Coefficients, RowResult, SessionKey, TradeRow, TradingParams};
pub use engine::{CalculatorSession, Change, History, LedgerStats, Outcome, SessionError, SessionState};
pub use error::AppError;
pub use orchestration::{Autosaver, SessionManager};
pub use persistence::{
    AllowAllGate, EntitlementGate, MemoryStore, SnapshotStore, SqliteGate, SqliteStore,
};
