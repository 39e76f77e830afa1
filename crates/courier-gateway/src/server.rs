// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use courier_campaign::CampaignBroadcaster;
use courier_config::model::GatewayConfig;
use courier_core::CourierError;
use courier_dispatch::MessageDispatcher;
use courier_session::SessionEngine;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;
use crate::ws::{self, WsPublisher};

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Arc<SessionEngine>,
    pub dispatcher: Arc<MessageDispatcher>,
    pub broadcaster: Arc<CampaignBroadcaster>,
    pub realtime: Arc<WsPublisher>,
    pub auth: AuthConfig,
    pub health: HealthState,
}

/// Build the gateway router:
/// - GET  /health                                     (public)
/// - POST /v1/tenants/{tenant}/connect                (auth)
/// - POST /v1/tenants/{tenant}/disconnect             (auth)
/// - POST /v1/tenants/{tenant}/reset                  (auth)
/// - GET  /v1/tenants/{tenant}/state                  (auth)
/// - POST /v1/tenants/{tenant}/messages               (auth)
/// - POST /v1/tenants/{tenant}/campaigns/{id}/run     (auth)
/// - GET  /ws?tenant=<id>                             (subscription)
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/tenants/{tenant}/connect", post(handlers::post_connect))
        .route(
            "/v1/tenants/{tenant}/disconnect",
            post(handlers::post_disconnect),
        )
        .route("/v1/tenants/{tenant}/reset", post(handlers::post_reset))
        .route("/v1/tenants/{tenant}/state", get(handlers::get_state))
        .route(
            "/v1/tenants/{tenant}/messages",
            post(handlers::post_message),
        )
        .route(
            "/v1/tenants/{tenant}/campaigns/{campaign}/run",
            post(handlers::post_campaign_run),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state.clone());

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway HTTP/WebSocket server. Runs until `shutdown` resolves.
///
/// `app` is usually [`build_router`]'s output, optionally merged with
/// extra routes (e.g. the bridge ingest endpoint).
pub async fn start_server(
    config: &GatewayConfig,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), CourierError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Messenger {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CourierError::Messenger {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_state_tracks_uptime() {
        let health = HealthState {
            start_time: std::time::Instant::now(),
        };
        assert!(health.start_time.elapsed().as_secs() < 1);
    }
}
