//! The calculator session state machine.
//!
//! A session starts uninitialized; `initialize` moves it to ready and every
//! mutating operation self-loops on ready, pushing a snapshot onto history.
//! All operations are synchronous and complete atomically; persistence and
//! entitlement checks live with the orchestration layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{round4, Coefficients, ParamsError, RowResult, TradeRow, TradingParams};
use crate::engine::history::History;
use crate::engine::steps::{self, Change};

/// Outcome that settles the pending trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("session has not been initialized")]
    NotInitialized,
}

impl From<ParamsError> for SessionError {
    fn from(err: ParamsError) -> Self {
        SessionError::InvalidInput(err.to_string())
    }
}

/// Full mutable state of a ready session.
///
/// `total_result`, `current_trade`, `win_baseline` and `loss_accumulator`
/// carry full precision; rounding happens only when a ledger row is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub initial_amount: f64,
    pub params: TradingParams,
    /// Cumulative P/L across all settled trades.
    pub total_result: f64,
    /// Size of the next trade to place.
    pub current_trade: f64,
    /// Trade size anchor, reset on every win.
    pub win_baseline: f64,
    /// Sum of trade sizes lost since the last win.
    pub loss_accumulator: f64,
    /// Serial of the pending row.
    pub trade_count: u32,
    pub rows: Vec<TradeRow>,
}

/// Win/loss counts over the settled rows of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: f64,
    pub loss_pct: f64,
}

impl LedgerStats {
    fn empty() -> Self {
        LedgerStats {
            total: 0,
            wins: 0,
            losses: 0,
            win_pct: 0.0,
            loss_pct: 0.0,
        }
    }
}

impl SessionState {
    /// Coefficients for the parameters as they stand right now.
    pub fn coefficients(&self) -> Coefficients {
        self.params.resolve()
    }

    /// Balance shown on the latest ledger row.
    pub fn final_amount(&self) -> f64 {
        self.rows
            .last()
            .map(|row| row.final_amount)
            .unwrap_or(self.initial_amount)
    }

    pub fn change(&self) -> Change {
        steps::change(self.final_amount(), self.initial_amount)
    }

    /// Counts over settled rows; the trailing pending row is excluded.
    pub fn stats(&self) -> LedgerStats {
        if self.rows.is_empty() {
            return LedgerStats::empty();
        }
        let mut wins = 0u32;
        let mut losses = 0u32;
        for row in &self.rows[..self.rows.len() - 1] {
            match row.result.settled() {
                Some(v) if v > 0.0 => wins += 1,
                Some(v) if v < 0.0 => losses += 1,
                _ => {}
            }
        }
        let total = (self.rows.len() - 1) as u32;
        let (win_pct, loss_pct) = if total > 0 {
            (
                f64::from(wins) / f64::from(total) * 100.0,
                f64::from(losses) / f64::from(total) * 100.0,
            )
        } else {
            (0.0, 0.0)
        };
        LedgerStats {
            total,
            wins,
            losses,
            win_pct,
            loss_pct,
        }
    }

    /// Settle the pending row per the outcome and append the next pending row.
    fn apply(&mut self, outcome: Outcome, coeffs: &Coefficients) {
        let (result, next_trade) = match outcome {
            Outcome::Win => {
                let result = steps::win_result(self.current_trade, coeffs.q);
                self.total_result += result;
                let final_amount = self.initial_amount + self.total_result;
                let next = steps::next_trade_after_win(final_amount, coeffs.divisor);
                self.win_baseline = next;
                self.loss_accumulator = 0.0;
                (result, next)
            }
            Outcome::Loss => {
                let result = steps::loss_result(self.current_trade, coeffs.p);
                self.total_result += result;
                // The size that just lost joins the accumulator before the
                // recovery size is computed.
                self.loss_accumulator += self.current_trade;
                let next = steps::next_trade_after_loss(
                    self.win_baseline,
                    self.loss_accumulator,
                    coeffs.p,
                    coeffs.q,
                );
                (result, next)
            }
        };

        let final_amount = self.initial_amount + self.total_result;
        self.trade_count += 1;

        if let Some(last) = self.rows.last_mut() {
            last.result = RowResult::Settled(round4(result));
            last.total = round4(self.total_result);
            last.final_amount = round4(final_amount);
        }
        self.rows.push(TradeRow {
            serial: self.trade_count,
            trade_amount: next_trade,
            result: RowResult::Pending,
            total: round4(self.total_result),
            final_amount: round4(final_amount),
        });

        self.current_trade = next_trade;
    }
}

/// Read-only projection of a session for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<Coefficients>,
    pub change: Change,
    pub stats: LedgerStats,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// A calculator session: the live state plus its undo/redo history.
///
/// Serializes as the full session document that the snapshot store persists,
/// history stacks included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorSession {
    state: Option<SessionState>,
    history: History,
}

impl CalculatorSession {
    pub fn new() -> Self {
        CalculatorSession::default()
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    pub fn view(&self) -> SessionView {
        match &self.state {
            Some(state) => SessionView {
                initialized: true,
                coefficients: Some(state.coefficients()),
                change: state.change(),
                stats: state.stats(),
                state: Some(state.clone()),
                can_undo: self.can_undo(),
                can_redo: self.can_redo(),
            },
            None => SessionView {
                initialized: false,
                state: None,
                coefficients: None,
                change: Change::zero(),
                stats: LedgerStats::empty(),
                can_undo: false,
                can_redo: false,
            },
        }
    }

    fn validated(initial_amount: f64, params: &TradingParams) -> Result<Coefficients, SessionError> {
        if !initial_amount.is_finite() || initial_amount <= 0.0 {
            return Err(SessionError::InvalidInput(
                "initial amount must be a positive finite number".to_string(),
            ));
        }
        params.validate()?;
        Ok(params.resolve())
    }

    fn seed_state(
        initial_amount: f64,
        params: TradingParams,
        coeffs: &Coefficients,
    ) -> SessionState {
        let current_trade = steps::initial_trade(initial_amount, coeffs.divisor);
        SessionState {
            initial_amount,
            params,
            total_result: 0.0,
            current_trade,
            win_baseline: current_trade,
            loss_accumulator: 0.0,
            trade_count: 1,
            rows: vec![TradeRow {
                serial: 1,
                trade_amount: current_trade,
                result: RowResult::Pending,
                total: 0.0,
                final_amount: initial_amount,
            }],
        }
    }

    /// Hard reset: validate, seed the first pending row, drop all history and
    /// push the fresh state as the sole history entry. Callable at any time.
    pub fn initialize(
        &mut self,
        initial_amount: f64,
        params: TradingParams,
    ) -> Result<&SessionState, SessionError> {
        let coeffs = Self::validated(initial_amount, &params)?;
        let state = Self::seed_state(initial_amount, params, &coeffs);
        self.history.clear();
        self.history.push(state.clone());
        Ok(self.state.insert(state))
    }

    /// Settle the pending trade as a win or a loss.
    ///
    /// Coefficients are re-resolved from the current parameters on every call
    /// so mid-sequence parameter edits take effect on the next trade.
    pub fn record_outcome(&mut self, outcome: Outcome) -> Result<&SessionState, SessionError> {
        let state = self.state.as_mut().ok_or(SessionError::NotInitialized)?;
        let coeffs = state.params.resolve();
        state.apply(outcome, &coeffs);
        self.history.push(state.clone());
        Ok(state)
    }

    /// Replay an unbroken win streak up to `target_serial`.
    ///
    /// Equivalent to initialize followed by `target_serial - 1` wins, but
    /// computed in one loop: history is reset first and only the final state
    /// is pushed.
    pub fn fast_forward(
        &mut self,
        initial_amount: f64,
        params: TradingParams,
        target_serial: u32,
    ) -> Result<&SessionState, SessionError> {
        if target_serial < 1 {
            return Err(SessionError::InvalidInput(
                "target serial must be at least 1".to_string(),
            ));
        }
        let coeffs = Self::validated(initial_amount, &params)?;
        let mut state = Self::seed_state(initial_amount, params, &coeffs);
        for _ in 2..=target_serial {
            state.apply(Outcome::Win, &coeffs);
        }
        self.history.clear();
        self.history.push(state.clone());
        Ok(self.state.insert(state))
    }

    /// Swap in new parameters for subsequent trades.
    ///
    /// No history push: the snapshot taken by the next mutating operation
    /// captures the edited parameters, as in the interactive tool.
    pub fn set_params(&mut self, params: TradingParams) -> Result<&SessionState, SessionError> {
        params.validate()?;
        let state = self.state.as_mut().ok_or(SessionError::NotInitialized)?;
        state.params = params;
        Ok(state)
    }

    /// Restore the previous snapshot; `None` when at the history floor.
    pub fn undo(&mut self) -> Option<&SessionState> {
        let snapshot = self.history.undo()?;
        Some(self.state.insert(snapshot))
    }

    /// Restore the most recently undone snapshot; `None` when there is none.
    pub fn redo(&mut self) -> Option<&SessionState> {
        let snapshot = self.history.redo()?;
        Some(self.state.insert(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TradingParams {
        TradingParams {
            n_trades: 7,
            loss_capture_pct: 0.5,
            profit_capture_pct: 0.8,
            leverage: 50.0,
            fee_pct: 0.12,
        }
    }

    #[test]
    fn test_initialize_seeds_pending_row() {
        let mut session = CalculatorSession::new();
        let state = session.initialize(6500.0, params()).expect("initialize");

        assert_eq!(state.trade_count, 1);
        assert_eq!(state.total_result, 0.0);
        assert_eq!(state.loss_accumulator, 0.0);
        assert_eq!(state.current_trade, state.win_baseline);
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.rows[0].serial, 1);
        assert_eq!(state.rows[0].result, RowResult::Pending);
        assert_eq!(state.rows[0].final_amount, 6500.0);
        assert_eq!(session.history_depth(), 1);
    }

    #[test]
    fn test_initialize_rejects_bad_amount() {
        let mut session = CalculatorSession::new();
        assert!(matches!(
            session.initialize(0.0, params()),
            Err(SessionError::InvalidInput(_))
        ));
        assert!(matches!(
            session.initialize(f64::NAN, params()),
            Err(SessionError::InvalidInput(_))
        ));
        assert!(!session.is_initialized());
    }

    #[test]
    fn test_record_outcome_requires_initialize() {
        let mut session = CalculatorSession::new();
        assert!(matches!(
            session.record_outcome(Outcome::Win),
            Err(SessionError::NotInitialized)
        ));
    }

    #[test]
    fn test_win_settles_row_and_appends_pending() {
        let mut session = CalculatorSession::new();
        session.initialize(6500.0, params()).unwrap();
        let state = session.record_outcome(Outcome::Win).expect("win");

        assert_eq!(state.trade_count, 2);
        assert_eq!(state.rows.len(), 2);
        assert!(state.rows[0].is_settled());
        assert_eq!(state.rows[1].result, RowResult::Pending);
        assert_eq!(state.loss_accumulator, 0.0);
        assert_eq!(state.win_baseline, state.current_trade);
        // ~ +34 on the reference vector.
        assert!((state.total_result - 34.0).abs() < 1e-2);
    }

    #[test]
    fn test_loss_accumulates_before_sizing() {
        let mut session = CalculatorSession::new();
        session.initialize(6500.0, params()).unwrap();
        let lost_size = session.state().unwrap().current_trade;
        let state = session.record_outcome(Outcome::Loss).expect("loss");

        assert_eq!(state.loss_accumulator, lost_size);
        assert!(state.total_result < 0.0);
        // Recovery size exceeds the baseline.
        assert!(state.current_trade > state.win_baseline);
    }

    #[test]
    fn test_set_params_applies_to_next_trade() {
        let mut session = CalculatorSession::new();
        session.initialize(6500.0, params()).unwrap();
        session.record_outcome(Outcome::Win).unwrap();
        let depth_before = session.history_depth();

        let halved = TradingParams {
            leverage: 25.0,
            ..params()
        };
        session.set_params(halved).expect("set_params");
        assert_eq!(session.history_depth(), depth_before);

        let trade = session.state().unwrap().current_trade;
        let state = session.record_outcome(Outcome::Win).unwrap();
        let settled = state.rows[state.rows.len() - 2].result.settled().unwrap();
        // q halved with leverage: settled result is trade * 17%.
        assert!((settled - trade * 0.17).abs() < 1e-3);
    }

    #[test]
    fn test_set_params_rejects_degenerate() {
        let mut session = CalculatorSession::new();
        session.initialize(6500.0, params()).unwrap();
        let bad = TradingParams {
            profit_capture_pct: 0.12,
            ..params()
        };
        assert!(matches!(
            session.set_params(bad),
            Err(SessionError::InvalidInput(_))
        ));
        // Live params unchanged.
        assert_eq!(session.state().unwrap().params, params());
    }

    #[test]
    fn test_fast_forward_rejects_zero_serial() {
        let mut session = CalculatorSession::new();
        assert!(matches!(
            session.fast_forward(6500.0, params(), 0),
            Err(SessionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_stats_counts_settled_rows_only() {
        let mut session = CalculatorSession::new();
        session.initialize(6500.0, params()).unwrap();
        session.record_outcome(Outcome::Win).unwrap();
        session.record_outcome(Outcome::Loss).unwrap();
        session.record_outcome(Outcome::Win).unwrap();

        let stats = session.state().unwrap().stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert!((stats.win_pct - 2.0 / 3.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_of_uninitialized_session() {
        let view = CalculatorSession::new().view();
        assert!(!view.initialized);
        assert!(view.state.is_none());
        assert_eq!(view.change, Change::zero());
        assert!(!view.can_undo && !view.can_redo);
    }
}
