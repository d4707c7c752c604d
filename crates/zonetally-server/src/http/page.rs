use axum::extract::State;
use axum::response::Html;

use crate::app_state::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

pub async fn index(State(state): State<AppState>) -> Html<&'static str> {
    state.metrics().http_requests.inc(&[("route", "page")]);
    state.activator().ensure_started().await;
    Html(INDEX_HTML)
}
