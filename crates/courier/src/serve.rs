// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server wiring: construct every component once at process start and pass
//! them down by reference. No lazy global singletons.

use std::sync::Arc;

use tracing::info;

use courier_bridge::{ingest_router, HttpMessengerFactory};
use courier_campaign::CampaignBroadcaster;
use courier_config::CourierConfig;
use courier_core::{CourierError, NullAutomation};
use courier_dispatch::{ChatIdResolver, MessageDispatcher};
use courier_gateway::{build_router, AuthConfig, GatewayState, HealthState, WsPublisher};
use courier_session::{
    drain_sessions, install_signal_handler, EventRouter, SessionEngine, SessionRegistry,
};
use courier_storage::{FileCredentialStore, SqliteStore};
use courier_webhook::WebhookNotifier;

pub async fn run(config: CourierConfig) -> Result<(), CourierError> {
    let store = Arc::new(SqliteStore::open(&config.storage.database_path).await?);
    info!(path = %config.storage.database_path, "storage ready");

    let credentials = Arc::new(FileCredentialStore::new(&config.storage.credentials_dir));
    let realtime = Arc::new(WsPublisher::new());
    let registry = Arc::new(SessionRegistry::new());

    let factory = Arc::new(HttpMessengerFactory::new(&config.bridge)?);
    let webhook = Arc::new(WebhookNotifier::new(&config.webhook, store.clone()));
    let router = Arc::new(EventRouter::new(
        store.clone(),
        realtime.clone(),
        webhook,
        Arc::new(NullAutomation),
        config.resolver.clone(),
        &config.session,
    ));

    let shutdown = install_signal_handler();
    let engine = SessionEngine::new(
        Arc::clone(&registry),
        factory.clone(),
        credentials,
        realtime.clone(),
        router,
        config.session.clone(),
        shutdown.clone(),
    );

    let resolver = Arc::new(ChatIdResolver::new(
        Arc::clone(&registry),
        config.resolver.clone(),
        &config.cache,
    ));
    let dispatcher = Arc::new(MessageDispatcher::new(Arc::clone(&registry), resolver));
    let broadcaster = Arc::new(CampaignBroadcaster::new(
        Arc::clone(&registry),
        dispatcher.clone(),
        store.clone(),
        config.campaign.clone(),
    ));

    let state = GatewayState {
        engine: engine.clone(),
        dispatcher,
        broadcaster,
        realtime,
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
        },
    };

    // The client host posts events to the same listener the API uses.
    let app = build_router(state).merge(ingest_router(
        factory,
        config.gateway.bearer_token.clone(),
    ));

    info!(name = %config.platform.name, "courier starting");
    courier_gateway::start_server(
        &config.gateway,
        app,
        shutdown.clone().cancelled_owned(),
    )
    .await?;

    // Graceful wind-down: disconnect sessions (credentials kept) and flush.
    drain_sessions(&engine).await;
    store.close().await?;
    info!("courier stopped");
    Ok(())
}
