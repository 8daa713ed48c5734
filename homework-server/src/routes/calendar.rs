//! Calendar feed and configuration endpoints

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;

use homework_core::Config;

use crate::routes::AppError;
use crate::state::AppState;

pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(calendar))
        .route("/config", get(config))
}

#[derive(Serialize)]
pub struct ConfigResponse<'a> {
    pub config: &'a Config,
}

/// GET / - Export a fresh calendar and return what was written
async fn calendar(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let exported = state.projector().export()?;

    Ok(([(header::CONTENT_TYPE, CALENDAR_CONTENT_TYPE)], exported.ics))
}

/// GET /config - The loaded configuration
async fn config(State(state): State<AppState>) -> impl IntoResponse {
    Json(ConfigResponse {
        config: state.config(),
    })
    .into_response()
}
