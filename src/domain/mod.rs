//! Domain types for the money-management calculator.
//!
//! This module provides:
//! - Trading parameters and the coefficients derived from them
//! - Ledger rows with the pending-result sentinel and 4 dp rounding
//! - Opaque session keys

pub mod key;
pub mod params;
pub mod row;

pub use key::SessionKey;
pub use params::{Coefficients, ParamsError, TradingParams};
pub use row::{round4, RowResult, TradeRow};
