use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use outpass::workflows::outpass::{outpass_router, Calendar, OutpassRepository, OutpassService};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn with_outpass_routes<R, C>(service: Arc<OutpassService<R, C>>) -> axum::Router
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    outpass_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::build_service;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use outpass::config::CalendarConfig;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        // A standalone recorder keeps tests from fighting over the global one.
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(handle),
        };
        with_outpass_routes(build_service(&CalendarConfig::default())).layer(Extension(state))
    }

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .header("x-actor-id", "warden-1")
                    .header("x-actor-role", "warden")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let (status, body) = get(app(false), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], json!("initializing"));

        let (status, body) = get(app(true), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], json!("ready"));
    }

    #[tokio::test]
    async fn metrics_render_as_text() {
        let (status, _) = get(app(true), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn outpass_routes_are_mounted() {
        let (status, body) = get(app(true), "/api/v1/outpass/statistics").await;
        assert_eq!(status, StatusCode::OK);
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["data"]["total"], json!(0));

        let (status, _) = get(app(true), "/api/v1/outpass/pending").await;
        assert_eq!(status, StatusCode::OK);
    }
}
