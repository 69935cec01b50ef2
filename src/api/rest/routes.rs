//! # REST Routes
//!
//! Route definitions for the routing surface.
//!
//! # Route Structure
//!
//! ```text
//! /routing
//! ├── /quote/v2           POST - price a conversion request
//! ├── /execute/v2         POST - reserve a quote, issue deposit
//! ├── /webhooks/deposit   POST - deposit notifier callback
//! ├── /status             GET  - execution state
//! ├── /quotes             GET  - cached-edge inspection
//! └── /health             GET  - liveness probe
//! ```

use crate::api::rest::handlers::{
    AppState, cached_quotes, deposit_webhook, execute_v2, execution_status, health_check,
    quote_v2,
};
use axum::{Router, routing::get, routing::post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Creates the routing API router with middleware.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/routing", routing_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Creates a minimal router without middleware, for tests.
#[must_use]
pub fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/routing", routing_routes())
        .with_state(state)
}

fn routing_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quote/v2", post(quote_v2))
        .route("/execute/v2", post(execute_v2))
        .route("/webhooks/deposit", post(deposit_webhook))
        .route("/status", get(execution_status))
        .route("/quotes", get(cached_quotes))
        .route("/health", get(health_check))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::pipeline::{
        DepositConfig, DepositService, ExecutionService, QuoteService, RoutingPipeline,
        SimulatedOtcDesk, SimulatedStepExecutor,
    };
    use crate::application::router::Router as RouteFinder;
    use crate::application::scorer::{ScoringConfig, SettlementScorer};
    use crate::infrastructure::cache::EdgeCache;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_test_state() -> Arc<AppState> {
        let clock = Arc::new(ManualClock::at(0));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let cache = Arc::new(EdgeCache::new(store.clone(), clock.clone()));
        let pipeline = RoutingPipeline::new(
            Arc::new(RouteFinder::new(cache.clone(), clock.clone())),
            Arc::new(SettlementScorer::new(ScoringConfig::default())),
            Arc::new(QuoteService::new(store.clone(), clock.clone())),
            Arc::new(DepositService::new(
                store.clone(),
                clock.clone(),
                DepositConfig::default(),
            )),
            Arc::new(ExecutionService::new(
                store,
                clock.clone(),
                Arc::new(SimulatedStepExecutor::new(Duration::from_millis(1))),
            )),
            Arc::new(SimulatedOtcDesk),
        );
        Arc::new(AppState {
            pipeline: Arc::new(pipeline),
            cache,
        })
    }

    #[tokio::test]
    async fn health_endpoint_answers_ok() {
        let router = create_test_router(create_test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/routing/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn quote_with_non_positive_amount_is_400() {
        let router = create_test_router(create_test_state());
        let body = serde_json::json!({
            "amountIn": 0,
            "fromToken": "USDC",
            "toToken": "EUR"
        });
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/routing/quote/v2")
                    .header("Content-Type", "application/json")
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn quote_for_unknown_pair_is_200_with_empty_list() {
        let router = create_test_router(create_test_state());
        let body = serde_json::json!({
            "amountIn": 100.0,
            "fromToken": "NGN",
            "toToken": "MXN",
            "intermediates": []
        });
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/routing/quote/v2")
                    .header("Content-Type", "application/json")
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["quotes"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn execute_with_missing_client_is_400() {
        let router = create_test_router(create_test_state());
        let body = serde_json::json!({
            "quoteId": "550e8400-e29b-41d4-a716-446655440000",
            "clientId": ""
        });
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/routing/execute/v2")
                    .header("Content-Type", "application/json")
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn execute_of_unknown_quote_is_404() {
        let router = create_test_router(create_test_state());
        let body = serde_json::json!({
            "quoteId": "550e8400-e29b-41d4-a716-446655440000",
            "clientId": "c1"
        });
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/routing/execute/v2")
                    .header("Content-Type", "application/json")
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn webhook_with_unknown_reference_is_200_unsuccessful() {
        let router = create_test_router(create_test_state());
        let body = serde_json::json!({
            "paymentReference": "r00000000-cx",
            "amountReceived": 100.0
        });
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/routing/webhooks/deposit")
                    .header("Content-Type", "application/json")
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn status_of_unknown_execution_is_404() {
        let router = create_test_router(create_test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .uri(
                        "/routing/status?executionId=550e8400-e29b-41d4-a716-446655440000",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cached_quotes_for_empty_pair_is_200() {
        let router = create_test_router(create_test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/routing/quotes?fromToken=USDC&toToken=EUR")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
