//! CSV projection of a session ledger.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::api::sessions::parse_session_key;
use crate::api::AppState;
use crate::domain::{RowResult, TradeRow};
use crate::engine::Change;
use crate::error::AppError;

/// Export all ledger rows plus a change-summary footer as CSV.
pub async fn ledger_csv(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let key = parse_session_key(&key)?;
    let view = state.manager.view(&key).await?;
    let session_state = view.state.ok_or(AppError::NotInitialized)?;

    let body = render_csv(&session_state.rows, &view.change)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    )
        .into_response())
}

fn render_csv(rows: &[TradeRow], change: &Change) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["serial", "tradeAmount", "result", "total", "finalAmount"])?;

    for row in rows {
        let result = match row.result {
            RowResult::Pending => "-".to_string(),
            RowResult::Settled(v) => format!("{:.4}", v),
        };
        writer.write_record([
            row.serial.to_string(),
            format!("{:.4}", row.trade_amount),
            result,
            format!("{:.4}", row.total),
            format!("{:.4}", row.final_amount),
        ])?;
    }

    // Footer: overall change against the initial amount.
    writer.write_record([
        "change".to_string(),
        format!("{:.2}%", change.percent),
        format!("{:.2}", change.amount),
        String::new(),
        String::new(),
    ])?;

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
