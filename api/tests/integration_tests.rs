//! Integration tests for the Tallyvane API.
//!
//! These tests verify the complete flow: counters registered against
//! in-memory sources, refreshed by the publisher, and read back through
//! the Prometheus scrape endpoint.

use api::publisher::CounterPublisher;
use api::{create_router, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use shared::config::{default_counter_specs, CounterSpec, Subsystem};
use shared::source::InMemoryCountSource;
use std::sync::Arc;
use std::time::Duration;

/// Creates a test router around a fresh registry.
fn test_app() -> (Router, AppState) {
    let state = AppState::with_fresh_registry();
    let router = create_router(state.clone());
    (router, state)
}

/// Creates a publisher writing into the given state's registry.
fn test_publisher(state: &AppState) -> CounterPublisher {
    CounterPublisher::new(Arc::clone(state.registry()), Duration::from_secs(5)).unwrap()
}

/// A counter spec with a short refresh interval for test schedules.
fn spec(name: &str, collection: &str, interval_ms: u64) -> CounterSpec {
    CounterSpec::new(
        Subsystem::Items,
        name,
        format!("Total number of {collection}"),
        collection,
    )
    .with_interval_ms(interval_ms)
}

/// Helper to make a GET request expecting a JSON body.
async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}

/// Helper to scrape the metrics endpoint, returning the raw text body.
async fn scrape(app: Router) -> (StatusCode, String) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri("/metrics")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

/// Polls until `predicate` holds or roughly a second has passed.
async fn wait_for(mut predicate: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    predicate()
}

// ============================================================================
// PUBLISHING TESTS
// ============================================================================

mod publishing {
    use super::*;

    #[tokio::test]
    async fn test_counts_flow_from_sources_to_scrape() {
        let (app, state) = test_app();
        let mut publisher = test_publisher(&state);

        publisher
            .register(
                spec("items_total", "items", 20),
                Arc::new(InMemoryCountSource::with_count(5)),
            )
            .unwrap();
        publisher
            .register(
                spec("dietaries_total", "dietaries", 20),
                Arc::new(InMemoryCountSource::with_count(2)),
            )
            .unwrap();

        let items = Arc::clone(&publisher.counters()[0]);
        let dietaries = Arc::clone(&publisher.counters()[1]);
        let handle = publisher.start();
        assert!(wait_for(|| items.value() == 5 && dietaries.value() == 2).await);

        let (status, body) = scrape(app).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("items_total 5"));
        assert!(body.contains("dietaries_total 2"));

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_first_refresh_is_immediate_despite_a_long_interval() {
        let (app, state) = test_app();
        let mut publisher = test_publisher(&state);

        publisher
            .register(
                spec("items_total", "items", 600_000),
                Arc::new(InMemoryCountSource::with_count(7)),
            )
            .unwrap();

        let items = Arc::clone(&publisher.counters()[0]);
        let handle = publisher.start();
        assert!(wait_for(|| items.value() == 7).await);

        let (_, body) = scrape(app).await;
        assert!(body.contains("items_total 7"));

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_default_counter_set_is_scrapable() {
        let (app, state) = test_app();
        let mut publisher = test_publisher(&state);

        for (i, default_spec) in default_counter_specs().into_iter().enumerate() {
            let count = 10 + i as u64;
            publisher
                .register(default_spec, Arc::new(InMemoryCountSource::with_count(count)))
                .unwrap();
        }
        for counter in publisher.counters() {
            counter.refresh(Duration::from_secs(5)).await;
        }

        let (status, body) = scrape(app).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("# HELP dietaries_total Total number of dietaries"));
        assert!(body.contains("# HELP items_total Total number of items"));
        assert!(body.contains("# HELP campaigns_total Total number of campaigns"));
        assert!(body.contains("# HELP coupons_total Total number of coupons"));
        assert!(body.contains("dietaries_total 10"));
        assert!(body.contains("items_total 11"));
        assert!(body.contains("campaigns_total 12"));
        assert!(body.contains("coupons_total 13"));
    }

    #[tokio::test]
    async fn test_failing_source_keeps_the_last_published_value() {
        let (app, state) = test_app();
        let mut publisher = test_publisher(&state);

        let source = Arc::new(InMemoryCountSource::with_count(5));
        publisher
            .register(spec("items_total", "items", 20), source.clone())
            .unwrap();

        let items = Arc::clone(&publisher.counters()[0]);
        let handle = publisher.start();
        assert!(wait_for(|| items.value() == 5).await);

        source.set_failing(true);
        assert!(wait_for(|| items.failures() >= 1).await);

        let (_, body) = scrape(app).await;
        assert!(body.contains("items_total 5"));
        assert!(body.contains("tallyvane_refresh_failures_total{counter=\"items_total\"}"));

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_stopped_publisher_leaves_values_scrapable() {
        let (app, state) = test_app();
        let mut publisher = test_publisher(&state);

        publisher
            .register(
                spec("items_total", "items", 20),
                Arc::new(InMemoryCountSource::with_count(5)),
            )
            .unwrap();

        let items = Arc::clone(&publisher.counters()[0]);
        let handle = publisher.start();
        assert!(wait_for(|| items.value() == 5).await);
        handle.stop().await;

        let (status, body) = scrape(app).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("items_total 5"));
    }
}

// ============================================================================
// SCRAPE FORMAT TESTS
// ============================================================================

mod scraping {
    use super::*;

    #[tokio::test]
    async fn test_scrape_uses_the_text_exposition_format() {
        let (app, state) = test_app();
        state
            .registry()
            .register_int_gauge("items_total", "Total number of items")
            .unwrap();

        let response = tower::ServiceExt::oneshot(
            app,
            Request::builder()
                .method("GET")
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; version=0.0.4"
        );

        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(body.contains("# TYPE items_total gauge"));
    }

    #[tokio::test]
    async fn test_scrape_includes_publisher_health_metrics() {
        let (app, state) = test_app();
        let mut publisher = test_publisher(&state);

        publisher
            .register(
                spec("items_total", "items", 60_000),
                Arc::new(InMemoryCountSource::with_count(1)),
            )
            .unwrap();
        publisher.counters()[0].refresh(Duration::from_secs(5)).await;

        let (_, body) = scrape(app).await;
        assert!(body.contains("tallyvane_last_refresh_timestamp_seconds{counter=\"items_total\"}"));
    }
}

// ============================================================================
// SERVICE TESTS
// ============================================================================

mod service {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let (app, _state) = test_app();

        let (status, response) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["status"], "healthy");
        assert_eq!(response["service"], "tallyvane-api");
    }

    #[tokio::test]
    async fn test_scrape_of_a_fresh_service_is_empty_but_ok() {
        let (app, _state) = test_app();

        let (status, body) = scrape(app).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }
}
