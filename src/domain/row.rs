//! Ledger rows of the trade simulation.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Round to 4 decimal places for ledger-row presentation.
///
/// Feed-forward state (totals, trade sizes, accumulators) is never rounded;
/// only the settled fields of a row are, so drift cannot compound.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Result column of a ledger row.
///
/// The last row of a ledger is always `Pending` until a win/loss event
/// settles it. Serializes as the `"-"` sentinel or a plain number, matching
/// the persisted document format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowResult {
    Pending,
    Settled(f64),
}

impl RowResult {
    pub fn settled(&self) -> Option<f64> {
        match self {
            RowResult::Pending => None,
            RowResult::Settled(v) => Some(*v),
        }
    }
}

impl Serialize for RowResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowResult::Pending => serializer.serialize_str("-"),
            RowResult::Settled(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for RowResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowResultVisitor;

        impl<'de> Visitor<'de> for RowResultVisitor {
            type Value = RowResult;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number or the pending marker \"-\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<RowResult, E> {
                Ok(RowResult::Settled(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RowResult, E> {
                Ok(RowResult::Settled(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RowResult, E> {
                Ok(RowResult::Settled(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RowResult, E> {
                if v == "-" {
                    Ok(RowResult::Pending)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(RowResultVisitor)
    }
}

/// One row of the simulation ledger.
///
/// `trade_amount` carries full precision; `result`, `total` and
/// `final_amount` are rounded to 4 dp when the row is written. The first
/// row's `final_amount` is the raw initial amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRow {
    /// 1-based serial number, monotonically increasing.
    pub serial: u32,
    /// Position size for this step.
    pub trade_amount: f64,
    /// Signed P/L of this step once settled.
    pub result: RowResult,
    /// Cumulative P/L after this step.
    pub total: f64,
    /// Account balance after this step.
    pub final_amount: f64,
}

impl TradeRow {
    pub fn is_settled(&self) -> bool {
        self.result.settled().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round4_half_cases() {
        assert_eq!(round4(100.52314), 100.5231);
        assert_eq!(round4(-31.16216), -31.1622);
        assert_eq!(round4(0.0), 0.0);
        assert_eq!(round4(1.23455), 1.2346);
    }

    #[test]
    fn test_row_result_serializes_sentinel() {
        let pending = serde_json::to_value(RowResult::Pending).unwrap();
        assert_eq!(pending, serde_json::json!("-"));

        let settled = serde_json::to_value(RowResult::Settled(34.0)).unwrap();
        assert_eq!(settled, serde_json::json!(34.0));
    }

    #[test]
    fn test_row_result_roundtrip() {
        let row = TradeRow {
            serial: 1,
            trade_amount: 100.0,
            result: RowResult::Pending,
            total: 0.0,
            final_amount: 6500.0,
        };
        let json = serde_json::to_string(&row).unwrap();
        let back: TradeRow = serde_json::from_str(&json).unwrap();
        assert_eq!(row, back);

        let settled = TradeRow {
            result: RowResult::Settled(-31.1622),
            ..row
        };
        let json = serde_json::to_string(&settled).unwrap();
        let back: TradeRow = serde_json::from_str(&json).unwrap();
        assert_eq!(settled, back);
    }

    #[test]
    fn test_row_result_rejects_other_strings() {
        let err = serde_json::from_str::<RowResult>("\"pending\"");
        assert!(err.is_err());
    }
}
