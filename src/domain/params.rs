//! Trading parameters and the coefficients derived from them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The five user-tunable inputs of the calculator.
///
/// `l`, `m` and `f` are percentages; `t` is a plain multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingParams {
    /// Trades until the first expected win (`n`); exponent of the sizing curve.
    pub n_trades: u32,
    /// Loss % captured per trade (`l`).
    pub loss_capture_pct: f64,
    /// Profit % captured per trade (`m`).
    pub profit_capture_pct: f64,
    /// Leverage multiplier (`t`).
    pub leverage: f64,
    /// Fee % per trade (`f`).
    pub fee_pct: f64,
}

/// Coefficients derived from [`TradingParams`].
///
/// Every trade-size computation downstream consumes these rather than the raw
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// Converts an account balance into the next position size.
    pub divisor: f64,
    /// Effective loss rate per trade, fees included (percent).
    pub p: f64,
    /// Effective profit rate per trade, fees excluded (percent).
    pub q: f64,
}

/// Parameter combinations that would feed non-finite values into the ledger.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParamsError {
    #[error("nTrades must be at least 1")]
    ZeroTrades,
    #[error("nTrades exceeds the supported maximum")]
    ExcessiveTrades,
    #[error("parameters must be finite numbers")]
    NonFinite,
    #[error("profit capture and fee cancel out; base ratio is undefined")]
    ProfitFeeCancel,
    #[error("effective profit rate q is zero; loss recovery sizing is undefined")]
    ZeroProfitRate,
    #[error("derived divisor is zero or non-finite")]
    DegenerateDivisor,
}

impl TradingParams {
    /// Derive the sizing coefficients.
    ///
    /// Total and pure: degenerate inputs produce non-finite outputs instead of
    /// errors. Callers that are about to mutate session state validate first
    /// via [`TradingParams::validate`].
    ///
    /// The operation order is fixed so replays are bit-identical: `base_ratio`
    /// and `q` are computed once and the divisor expression reuses that `q`.
    pub fn resolve(&self) -> Coefficients {
        let l = self.loss_capture_pct;
        let m = self.profit_capture_pct;
        let t = self.leverage;
        let f = self.fee_pct;

        let base_ratio = (l + m) / (m - f);
        let q = (m - f) * t;
        let p = (l + f) * t;
        // Saturate rather than wrap; validate rejects exponents beyond i32.
        let exponent = i32::try_from(self.n_trades.saturating_sub(1)).unwrap_or(i32::MAX);
        let divisor = base_ratio.powi(exponent) * (1.0 + q / 100.0) - q / 100.0;

        Coefficients { divisor, p, q }
    }

    /// Reject parameter sets with no usable sizing coefficients.
    ///
    /// `m == f` leaves the base ratio undefined, `q == 0` breaks the `p/q`
    /// loss-recovery term, and a zero or non-finite divisor makes every trade
    /// size undefined.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.n_trades < 1 {
            return Err(ParamsError::ZeroTrades);
        }
        if self.n_trades - 1 > i32::MAX as u32 {
            return Err(ParamsError::ExcessiveTrades);
        }
        let scalars = [
            self.loss_capture_pct,
            self.profit_capture_pct,
            self.leverage,
            self.fee_pct,
        ];
        if scalars.iter().any(|v| !v.is_finite()) {
            return Err(ParamsError::NonFinite);
        }
        if self.profit_capture_pct - self.fee_pct == 0.0 {
            return Err(ParamsError::ProfitFeeCancel);
        }

        let coeffs = self.resolve();
        if coeffs.q == 0.0 {
            return Err(ParamsError::ZeroProfitRate);
        }
        if !coeffs.divisor.is_finite() || coeffs.divisor == 0.0 {
            return Err(ParamsError::DegenerateDivisor);
        }
        Ok(())
    }
}
