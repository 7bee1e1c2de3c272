// HTTP request handlers
use crate::application::control_service::DispatchError;
use crate::domain::control::Command;
use crate::infrastructure::chunked_json::stream_from_feed;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::json_mapper::{ack_to_dto, control_to_dto, dashboard_to_dto, ErrorDto};
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Response, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Mount a monitoring view and return its dashboard
pub async fn monitoring_snapshot(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let dashboard = state.monitoring_service.snapshot();
    respond(StatusCode::OK, &dashboard_to_dto(dashboard), accepts_brotli(&headers)).await
}

/// Mount a monitoring view and stream its ticks until the client disconnects
pub async fn monitoring_stream(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let feed = state.monitoring_service.open_feed().await;
    stream_from_feed(feed, accepts_brotli(&headers)).await
}

/// Current control panel state
pub async fn control_panel(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let snapshot = state.dispatcher.snapshot().await;
    let dto = control_to_dto(snapshot, &state.device);
    respond(StatusCode::OK, &dto, accepts_brotli(&headers)).await
}

/// Dispatch a command to the solar manager
pub async fn send_command(
    Path(command): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);

    let command: Command = match command.parse() {
        Ok(command) => command,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string(), compress).await,
    };

    // Run on its own task so a client that goes away does not cancel a
    // command that is already on the wire.
    let dispatcher = state.dispatcher.clone();
    let outcome = tokio::spawn(async move { dispatcher.dispatch(command).await }).await;

    match outcome {
        Ok(Ok(ack)) => respond(StatusCode::OK, &ack_to_dto(&ack), compress).await,
        Ok(Err(e)) => {
            let status = match &e {
                DispatchError::Rejected(_) | DispatchError::Busy => StatusCode::CONFLICT,
                DispatchError::Transport { .. } => StatusCode::BAD_GATEWAY,
            };
            error_response(status, e.to_string(), compress).await
        }
        Err(e) => {
            tracing::error!("Command task for {} failed: {}", command, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response<Body> {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn error_response(status: StatusCode, error: String, compress: bool) -> Response<Body> {
    respond(status, &ErrorDto { error }, compress).await
}
