pub mod export;
pub mod health;
pub mod sessions;

use crate::orchestration::SessionManager;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/v1/sessions", post(sessions::create_session))
        .route("/v1/sessions/:key", get(sessions::get_session))
        .route("/v1/sessions/:key/initialize", post(sessions::initialize))
        .route("/v1/sessions/:key/outcome", post(sessions::record_outcome))
        .route(
            "/v1/sessions/:key/fast-forward",
            post(sessions::fast_forward),
        )
        .route("/v1/sessions/:key/undo", post(sessions::undo))
        .route("/v1/sessions/:key/redo", post(sessions::redo))
        .route("/v1/sessions/:key/params", put(sessions::set_params))
        .route("/v1/sessions/:key/ledger.csv", get(export::ledger_csv))
        .layer(cors)
        .with_state(state)
}
