//! Handlers called directly with `State`, no socket involved.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use zonetally_core::error::Result;
use zonetally_core::{Count, CounterMap};
use zonetally_server::activation::Detector;
use zonetally_server::app_state::AppState;
use zonetally_server::config::PersistenceSection;
use zonetally_server::{http, ops};

#[derive(Default)]
struct StubDetector {
    starts: AtomicUsize,
}

#[async_trait]
impl Detector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn start(&self, _counters: CounterMap) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn state(dir: &tempfile::TempDir) -> (AppState, Arc<StubDetector>) {
    let cfg = PersistenceSection {
        path: dir.path().join("counters.json"),
        save_interval_ms: 5000,
    };
    let detector = Arc::new(StubDetector::default());
    let d: Arc<dyn Detector> = detector.clone();
    (AppState::new(&cfg, d), detector)
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn zone_counters_returns_json_object() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = state(&dir);
    state.counters().update(|m| {
        m.insert("north".into(), Count::Int(4));
        m.insert("south".into(), Count::Int(9));
    });

    let resp = http::api::zone_counters(State(state.clone())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body, serde_json::json!({ "north": 4, "south": 9 }));
}

#[tokio::test]
async fn zone_counters_empty_map() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = state(&dir);
    let resp = http::api::zone_counters(State(state)).await;
    assert_eq!(body_string(resp).await, "{}");
}

#[tokio::test]
async fn page_view_starts_detector_once() {
    let dir = tempfile::tempdir().unwrap();
    let (state, detector) = state(&dir);

    // Reads alone never activate.
    let _ = http::api::zone_counters(State(state.clone())).await;
    assert_eq!(detector.starts.load(Ordering::SeqCst), 0);

    for _ in 0..3 {
        let page = http::page::index(State(state.clone())).await.into_response();
        assert_eq!(page.status(), StatusCode::OK);
        assert!(body_string(page).await.contains("/api/zone_counters"));
    }
    assert_eq!(detector.starts.load(Ordering::SeqCst), 1);
    assert!(state.activator().is_started());
}

#[tokio::test]
async fn readyz_reports_draining() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = state(&dir);

    let ready = ops::readyz(State(state.clone())).await.into_response();
    assert_eq!(ready.status(), StatusCode::OK);

    state.set_draining();
    let draining = ops::readyz(State(state)).await.into_response();
    assert_eq!(draining.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn metrics_render_zone_gauge_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = state(&dir);
    state.counters().update(|m| m.insert("a".into(), Count::Int(1)));
    assert!(state.persistence().save());

    let body = body_string(ops::metrics(State(state)).await).await;
    assert!(body.contains("zonetally_zones 1"));
    assert!(body.contains("zonetally_snapshot_saves_total{result=\"ok\"} 1"));
    assert!(body.contains("zonetally_draining 0"));
}

#[test]
fn router_builds() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = state(&dir);
    let _app = zonetally_server::router::build_router(state);
}
