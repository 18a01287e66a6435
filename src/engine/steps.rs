//! Step math of the sizing recurrence.
//!
//! Pure functions over explicit inputs; the session state machine owns all
//! bookkeeping. Percent coefficients (`p`, `q`) are divided by 100 here and
//! nowhere else.

use serde::Serialize;

/// First position size: the balance spread over the divisor.
pub fn initial_trade(initial_amount: f64, divisor: f64) -> f64 {
    initial_amount / divisor
}

/// P/L of a winning trade.
pub fn win_result(current_trade: f64, q: f64) -> f64 {
    current_trade * (q / 100.0)
}

/// Next position size after a win: resize from the new balance.
pub fn next_trade_after_win(final_amount: f64, divisor: f64) -> f64 {
    final_amount / divisor
}

/// P/L of a losing trade (negative).
pub fn loss_result(current_trade: f64, p: f64) -> f64 {
    -current_trade * (p / 100.0)
}

/// Next position size after a loss.
///
/// Recovery is anchored on the size in effect at the last win plus the
/// accumulated losses scaled by `p/q`, targeting breakeven-plus-profit
/// across the loss/profit-rate asymmetry.
pub fn next_trade_after_loss(win_baseline: f64, loss_accumulator: f64, p: f64, q: f64) -> f64 {
    win_baseline + loss_accumulator * (p / q)
}

/// Relative and absolute change of a balance against the starting amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Change {
    pub percent: f64,
    pub amount: f64,
}

impl Change {
    pub fn zero() -> Self {
        Change {
            percent: 0.0,
            amount: 0.0,
        }
    }
}

pub fn change(final_amount: f64, initial_amount: f64) -> Change {
    Change {
        percent: (final_amount - initial_amount) / initial_amount * 100.0,
        amount: final_amount - initial_amount,
    }
}
