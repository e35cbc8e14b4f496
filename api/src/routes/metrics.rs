//! Prometheus scrape endpoint.
//!
//! Exposes every metric in the application registry in the text exposition
//! format, including the collection count gauges the publisher maintains.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Content type of the Prometheus text exposition format.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// Creates the metrics exposition routes.
pub fn metrics_routes(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(scrape_metrics))
        .with_state(state)
}

/// Handler for GET /metrics
///
/// Encodes the registry at scrape time; values reflect the most recent
/// completed refresh of each counter.
async fn scrape_metrics(State(state): State<AppState>) -> Response {
    match state.registry().encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn scrape(state: AppState) -> (StatusCode, String, Option<String>) {
        let app = metrics_routes(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();

        (status, String::from_utf8(body.to_vec()).unwrap(), content_type)
    }

    #[tokio::test]
    async fn test_scrape_returns_registered_gauges() {
        let state = AppState::with_fresh_registry();
        let gauge = state
            .registry()
            .register_int_gauge("items_total", "Total number of items")
            .unwrap();
        gauge.set(42);

        let (status, body, content_type) = scrape(state).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(TEXT_FORMAT));
        assert!(body.contains("# HELP items_total Total number of items"));
        assert!(body.contains("# TYPE items_total gauge"));
        assert!(body.contains("items_total 42"));
    }

    #[tokio::test]
    async fn test_scrape_of_an_empty_registry_is_ok() {
        let (status, body, _) = scrape(AppState::with_fresh_registry()).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }
}
