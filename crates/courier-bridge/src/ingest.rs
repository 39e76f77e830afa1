// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingest endpoint for events posted by the client-host service.
//!
//! Mounted alongside the gateway routes. The host authenticates with the
//! same bearer token as API clients; events for tenants without a live
//! session are acknowledged and dropped.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::debug;

use courier_core::TenantId;

use crate::client::HttpMessengerFactory;
use crate::events::BridgeEvent;

#[derive(Clone)]
struct IngestState {
    factory: Arc<HttpMessengerFactory>,
    bearer_token: Option<String>,
}

/// Router exposing `POST /v1/tenants/{tenant}/events`.
pub fn ingest_router(
    factory: Arc<HttpMessengerFactory>,
    bearer_token: Option<String>,
) -> Router {
    Router::new()
        .route("/v1/tenants/{tenant}/events", post(post_event))
        .with_state(IngestState {
            factory,
            bearer_token,
        })
}

async fn post_event(
    State(state): State<IngestState>,
    Path(tenant): Path<String>,
    headers: axum::http::HeaderMap,
    Json(event): Json<BridgeEvent>,
) -> impl IntoResponse {
    // Fail closed, mirroring the API middleware.
    let Some(ref expected) = state.bearer_token else {
        return StatusCode::UNAUTHORIZED;
    };
    let provided = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if provided != Some(expected.as_str()) {
        return StatusCode::UNAUTHORIZED;
    }

    let tenant = TenantId::new(tenant);
    let delivered = state.factory.ingest(&tenant, event.into()).await;
    debug!(tenant = %tenant, delivered, "bridge event ingested");
    // 200 either way: the host must not retry events for dead sessions.
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::model::BridgeConfig;

    fn factory() -> Arc<HttpMessengerFactory> {
        Arc::new(
            HttpMessengerFactory::new(&BridgeConfig {
                base_url: Some("http://127.0.0.1:9".to_string()),
                api_key: None,
                timeout_secs: 1,
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn ingest_rejects_without_token() {
        use tower::util::ServiceExt;

        let app = ingest_router(factory(), Some("token".to_string()));
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/tenants/acme/events")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"event": "ready"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn ingest_accepts_with_token() {
        use courier_core::MessengerFactory;
        use tower::util::ServiceExt;

        let factory = factory();
        let tenant = TenantId::from("acme");
        let (_client, mut rx) = factory.create(&tenant).await.unwrap();

        let app = ingest_router(Arc::clone(&factory), Some("token".to_string()));
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/tenants/acme/events")
            .header("authorization", "Bearer token")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"event": "ready"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(matches!(
            rx.recv().await,
            Some(courier_core::MessengerEvent::Ready)
        ));
    }
}
