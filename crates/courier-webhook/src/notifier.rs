// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook delivery to tenant-configured endpoints.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, error, warn};

use courier_core::types::WebhookPayload;
use courier_core::{CourierError, DataStore, TenantId};
use courier_config::model::WebhookConfig;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC-SHA256 of the request body.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Delivers signed JSON notifications with bounded retry.
pub struct WebhookNotifier {
    client: reqwest::Client,
    store: Arc<dyn DataStore>,
    retry_delays: Vec<Duration>,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig, store: Arc<dyn DataStore>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            store,
            retry_delays: config
                .retry_delays_secs
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        }
    }

    /// Total delivery attempts: initial try plus one per retry delay.
    pub fn max_attempts(&self) -> usize {
        1 + self.retry_delays.len()
    }

    /// Deliver `payload` to the tenant's configured endpoint.
    ///
    /// No-op when the tenant has no webhook URL. Any non-2xx status or
    /// network error triggers the next retry; exhausting all retries logs
    /// the failure and returns the final error.
    pub async fn notify(
        &self,
        tenant: &TenantId,
        payload: &WebhookPayload,
    ) -> Result<(), CourierError> {
        let settings = self.store.tenant_settings(tenant).await?;
        let Some(url) = settings.webhook_url else {
            return Ok(());
        };

        // Serialize once; the signature covers these exact bytes.
        let body = serde_json::to_vec(payload)
            .map_err(|e| CourierError::Internal(format!("webhook payload: {e}")))?;
        let signature = settings
            .webhook_secret
            .as_deref()
            .and_then(|secret| sign(secret, &body));

        let mut last_error = String::new();
        for attempt in 0..self.max_attempts() {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delays[attempt - 1]).await;
            }

            match self.attempt(&url, &body, signature.as_deref()).await {
                Ok(status) if status.is_success() => {
                    debug!(
                        tenant = %tenant,
                        event = %payload.event,
                        attempt = attempt + 1,
                        "webhook delivered"
                    );
                    return Ok(());
                }
                Ok(status) => {
                    last_error = format!("endpoint returned {status}");
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            warn!(
                tenant = %tenant,
                event = %payload.event,
                attempt = attempt + 1,
                error = %last_error,
                "webhook attempt failed"
            );
        }

        error!(
            tenant = %tenant,
            event = %payload.event,
            message_id = %payload.message_id,
            attempts = self.max_attempts(),
            error = %last_error,
            "webhook delivery gave up"
        );
        Err(CourierError::Webhook(last_error))
    }

    async fn attempt(
        &self,
        url: &str,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<reqwest::StatusCode, reqwest::Error> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_vec());
        if let Some(sig) = signature {
            request = request.header(SIGNATURE_HEADER, sig);
        }
        Ok(request.send().await?.status())
    }
}

/// Hex-encoded HMAC-SHA256 over `body`.
fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}
