use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{SessionKey, TradingParams};
use crate::engine::{Outcome, SessionView};
use crate::error::AppError;

pub(crate) fn parse_session_key(input: &str) -> Result<SessionKey, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Invalid session key".to_string()));
    }
    Ok(SessionKey::new(trimmed.to_string()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_key: SessionKey,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    pub initial_amount: f64,
    pub params: TradingParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRequest {
    pub outcome: Outcome,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastForwardRequest {
    pub initial_amount: f64,
    pub params: TradingParams,
    pub target_serial: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetParamsRequest {
    pub params: TradingParams,
}

pub async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let session_key = state.manager.create().await;
    Ok(Json(CreateSessionResponse { session_key }))
}

pub async fn get_session(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionView>, AppError> {
    let key = parse_session_key(&key)?;
    let view = state.manager.view(&key).await?;
    Ok(Json(view))
}

pub async fn initialize(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<InitializeRequest>,
) -> Result<Json<SessionView>, AppError> {
    let key = parse_session_key(&key)?;
    let view = state
        .manager
        .initialize(&key, req.initial_amount, req.params)
        .await?;
    Ok(Json(view))
}

pub async fn record_outcome(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<OutcomeRequest>,
) -> Result<Json<SessionView>, AppError> {
    let key = parse_session_key(&key)?;
    let view = state.manager.record_outcome(&key, req.outcome).await?;
    Ok(Json(view))
}

pub async fn fast_forward(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<FastForwardRequest>,
) -> Result<Json<SessionView>, AppError> {
    let key = parse_session_key(&key)?;
    let view = state
        .manager
        .fast_forward(&key, req.initial_amount, req.params, req.target_serial)
        .await?;
    Ok(Json(view))
}

pub async fn set_params(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<SetParamsRequest>,
) -> Result<Json<SessionView>, AppError> {
    let key = parse_session_key(&key)?;
    let view = state.manager.set_params(&key, req.params).await?;
    Ok(Json(view))
}

pub async fn undo(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionView>, AppError> {
    let key = parse_session_key(&key)?;
    let view = state.manager.undo(&key).await?;
    Ok(Json(view))
}

pub async fn redo(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionView>, AppError> {
    let key = parse_session_key(&key)?;
    let view = state.manager.redo(&key).await?;
    Ok(Json(view))
}
