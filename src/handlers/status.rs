//! Status handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
    model_trained: bool,
    model_type: String,
    version: &'static str,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let current = state.model.current();
    let model_type = current
        .as_ref()
        .map(|m| m.kind())
        .unwrap_or(state.config.model_kind);

    Json(StatusResponse {
        status: "running",
        model_trained: current.is_some(),
        model_type: model_type.to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
