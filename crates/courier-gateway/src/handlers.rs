// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for tenant lifecycle, sends, and campaigns.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use courier_core::types::{CampaignFilter, MessageContent};
use courier_core::{CourierError, TenantId};
use courier_dispatch::StructuredMessage;

use crate::server::GatewayState;

/// Map domain errors onto HTTP statuses.
///
/// Readiness errors get 409 so clients prompt a reconnect instead of
/// retrying blindly; invalid input gets 400 and is never retried.
pub struct ApiError(CourierError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CourierError::NotReady { .. } => StatusCode::CONFLICT,
            CourierError::InvalidRecipient(_) | CourierError::Config(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<CourierError> for ApiError {
    fn from(e: CourierError) -> Self {
        Self(e)
    }
}

/// GET /health (unauthenticated).
pub async fn get_public_health(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptime_secs": state.health.start_time.elapsed().as_secs(),
    }))
}

/// POST /v1/tenants/{tenant}/connect
pub async fn post_connect(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
) -> impl IntoResponse {
    let tenant = TenantId::new(tenant);
    let snapshot = state.engine.connect(&tenant).await;
    Json(snapshot)
}

/// POST /v1/tenants/{tenant}/disconnect
pub async fn post_disconnect(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
) -> impl IntoResponse {
    let tenant = TenantId::new(tenant);
    state.engine.disconnect(&tenant).await;
    Json(state.engine.snapshot(&tenant))
}

/// POST /v1/tenants/{tenant}/reset
///
/// A manual reset: credentials deleted, retry counter zeroed.
pub async fn post_reset(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
) -> impl IntoResponse {
    let tenant = TenantId::new(tenant);
    state.engine.reset_session(&tenant, false).await;
    Json(state.engine.snapshot(&tenant))
}

/// GET /v1/tenants/{tenant}/state
pub async fn get_state(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
) -> impl IntoResponse {
    let tenant = TenantId::new(tenant);
    Json(state.engine.snapshot(&tenant))
}

/// Body of POST /v1/tenants/{tenant}/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to: String,
    #[serde(flatten)]
    pub content: MessageContent,
    #[serde(default)]
    pub quoted_message_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message_id: String,
}

/// POST /v1/tenants/{tenant}/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let tenant = TenantId::new(tenant);
    let message_id = match request.content {
        MessageContent::Text { body } => {
            state
                .dispatcher
                .send_text(&tenant, &request.to, &body, request.quoted_message_id)
                .await?
        }
        MessageContent::Media {
            mime_type,
            data,
            filename,
            caption,
        } => {
            state
                .dispatcher
                .send_media(&tenant, &request.to, &mime_type, &data, filename, caption)
                .await?
        }
        MessageContent::Buttons { body, buttons } => {
            state
                .dispatcher
                .send_structured(
                    &tenant,
                    &request.to,
                    StructuredMessage::Buttons { body, buttons },
                )
                .await?
        }
        MessageContent::List {
            body,
            button_text,
            sections,
        } => {
            state
                .dispatcher
                .send_structured(
                    &tenant,
                    &request.to,
                    StructuredMessage::List {
                        body,
                        button_text,
                        sections,
                    },
                )
                .await?
        }
        MessageContent::ContactCard { name, phone } => {
            state
                .dispatcher
                .send_structured(
                    &tenant,
                    &request.to,
                    StructuredMessage::ContactCard { name, phone },
                )
                .await?
        }
        MessageContent::Location { .. } | MessageContent::Unspecified => {
            return Err(ApiError(CourierError::Config(
                "unsupported outbound message kind".to_string(),
            )));
        }
    };
    Ok(Json(SendMessageResponse { message_id }))
}

/// Body of POST /v1/tenants/{tenant}/campaigns/{campaign}/run.
#[derive(Debug, Deserialize)]
pub struct RunCampaignRequest {
    pub template: String,
    #[serde(flatten)]
    pub filter: CampaignFilter,
}

/// POST /v1/tenants/{tenant}/campaigns/{campaign}/run
///
/// The run executes in the background; progress is persisted after every
/// attempt and observable via the store and the realtime channel.
pub async fn post_campaign_run(
    State(state): State<GatewayState>,
    Path((tenant, campaign)): Path<(String, String)>,
    Json(request): Json<RunCampaignRequest>,
) -> impl IntoResponse {
    let tenant = TenantId::new(tenant);
    let broadcaster = state.broadcaster.clone();
    tokio::spawn(async move {
        if let Err(e) = broadcaster
            .run(&tenant, &campaign, &request.template, &request.filter)
            .await
        {
            error!(tenant = %tenant, campaign = %campaign, error = %e, "campaign run failed");
        }
    });
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "processing" })),
    )
}
