use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::app_state::AppState;

/// Full counter map, copied under the lock. No pagination, no auth.
pub async fn zone_counters(State(state): State<AppState>) -> Response {
    state.metrics().http_requests.inc(&[("route", "zone_counters")]);
    let snapshot = state.counters().snapshot();

    (
        StatusCode::OK,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(snapshot),
    )
        .into_response()
}
