// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limited, resumable campaign broadcasting.
//!
//! Recipients are sent sequentially with a uniform jitter delay to avoid
//! bulk-send throttling by the network. Every attempt is logged to the
//! delivery log immediately and progress counters persisted, so a crash
//! mid-run loses at most one in-flight recipient. Re-invoking `run` after
//! a partial failure naturally skips recipients already logged `sent`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use courier_core::types::{
    CampaignFilter, CampaignOutcome, CampaignStatus, DeliveryStatus, SessionStatus,
};
use courier_core::{CourierError, DataStore, TenantId};
use courier_config::model::CampaignConfig;
use courier_dispatch::MessageDispatcher;
use courier_session::SessionRegistry;

/// Operator-facing message when a run aborts on a dropped session.
const SESSION_DROPPED: &str =
    "session dropped mid-campaign; reconnect and resume to continue from where it stopped";

/// One deduplicated campaign recipient.
#[derive(Debug, Clone)]
struct Recipient {
    phone: String,
    name: String,
}

pub struct CampaignBroadcaster {
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<MessageDispatcher>,
    store: Arc<dyn DataStore>,
    config: CampaignConfig,
}

impl CampaignBroadcaster {
    pub fn new(
        registry: Arc<SessionRegistry>,
        dispatcher: Arc<MessageDispatcher>,
        store: Arc<dyn DataStore>,
        config: CampaignConfig,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            store,
            config,
        }
    }

    /// Run (or resume) a campaign broadcast.
    pub async fn run(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        template: &str,
        filter: &CampaignFilter,
    ) -> Result<CampaignOutcome, CourierError> {
        self.store
            .update_campaign_progress(tenant, campaign_id, CampaignStatus::Processing, 0, 0, None)
            .await?;

        let recipients = self.gather_recipients(tenant, filter).await?;
        let total = recipients.len();
        if recipients.is_empty() {
            info!(tenant = %tenant, campaign = %campaign_id, "no recipients match the filter");
            return self
                .finish(tenant, campaign_id, CampaignStatus::Completed, 0, 0, 0, None)
                .await;
        }

        // Idempotent resume: recipients already logged `sent` are excluded.
        let already_sent = self.store.sent_phones(tenant, campaign_id).await?;
        let pending: Vec<Recipient> = recipients
            .into_iter()
            .filter(|r| !already_sent.contains(&r.phone))
            .collect();
        info!(
            tenant = %tenant,
            campaign = %campaign_id,
            total,
            skipped = total - pending.len(),
            "campaign run starting"
        );

        if self.registry.status(tenant) != SessionStatus::Ready {
            return self
                .finish(
                    tenant,
                    campaign_id,
                    CampaignStatus::Failed,
                    total,
                    0,
                    0,
                    Some("messaging session is not connected; connect before broadcasting"),
                )
                .await;
        }

        let mut sent = 0usize;
        let mut failed = 0usize;

        for recipient in pending {
            // Uniform jitter between sends; the Rng is dropped before the await.
            let delay = {
                let mut rng = rand::thread_rng();
                Duration::from_millis(
                    rng.gen_range(self.config.jitter_min_ms..=self.config.jitter_max_ms),
                )
            };
            tokio::time::sleep(delay).await;

            let message = render_template(template, &recipient);
            let dialable = dialable_phone(&recipient.phone, &self.config.default_region_code);

            match self
                .dispatcher
                .send_text(tenant, &dialable, &message, None)
                .await
            {
                Ok(_) => {
                    sent += 1;
                    self.store
                        .append_delivery(
                            tenant,
                            campaign_id,
                            &recipient.phone,
                            DeliveryStatus::Sent,
                            None,
                        )
                        .await?;
                }
                Err(e) if e.is_not_ready() => {
                    // The session dropped under us: stop without logging the
                    // in-flight recipient, so a resume retries them.
                    warn!(tenant = %tenant, campaign = %campaign_id, "session dropped mid-run");
                    return self
                        .finish(
                            tenant,
                            campaign_id,
                            CampaignStatus::Failed,
                            total,
                            sent,
                            failed,
                            Some(SESSION_DROPPED),
                        )
                        .await;
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        tenant = %tenant,
                        campaign = %campaign_id,
                        phone = %recipient.phone,
                        error = %e,
                        "campaign send failed"
                    );
                    self.store
                        .append_delivery(
                            tenant,
                            campaign_id,
                            &recipient.phone,
                            DeliveryStatus::Failed,
                            Some(&e.to_string()),
                        )
                        .await?;
                }
            }

            // Counters persisted after every attempt for live progress.
            self.store
                .update_campaign_progress(
                    tenant,
                    campaign_id,
                    CampaignStatus::Processing,
                    sent,
                    failed,
                    None,
                )
                .await?;

            // Readiness re-check: a dropped session aborts immediately.
            if self.registry.status(tenant) != SessionStatus::Ready {
                return self
                    .finish(
                        tenant,
                        campaign_id,
                        CampaignStatus::Failed,
                        total,
                        sent,
                        failed,
                        Some(SESSION_DROPPED),
                    )
                    .await;
            }
        }

        self.finish(
            tenant,
            campaign_id,
            CampaignStatus::Completed,
            total,
            sent,
            failed,
            None,
        )
        .await
    }

    /// Gather candidates from both audience sources, apply the filter, and
    /// deduplicate by normalized phone (last seen wins).
    async fn gather_recipients(
        &self,
        tenant: &TenantId,
        filter: &CampaignFilter,
    ) -> Result<Vec<Recipient>, CourierError> {
        let customers = self.store.list_customers(tenant).await?;
        let contacts = self.store.list_contacts(tenant).await?;

        // (phone, name, active, segment) across both sources; contacts have
        // no activity flag and count as active.
        let candidates = customers
            .into_iter()
            .map(|c| (c.phone, c.name, c.active, c.segment))
            .chain(
                contacts
                    .into_iter()
                    .map(|c| (c.phone, c.name, true, c.segment)),
            );

        let mut order: Vec<String> = Vec::new();
        let mut by_phone: HashMap<String, Recipient> = HashMap::new();

        for (phone, name, active, segment) in candidates {
            let matches = match filter {
                CampaignFilter::All => true,
                CampaignFilter::Active => active,
                CampaignFilter::Segment { name: wanted } => {
                    segment.as_deref() == Some(wanted.as_str())
                }
            };
            if !matches {
                continue;
            }

            let Some(normalized) = self.dispatcher.resolver().normalize(&phone) else {
                warn!(tenant = %tenant, phone = %phone, "skipping unresolvable audience phone");
                continue;
            };

            if !by_phone.contains_key(&normalized) {
                order.push(normalized.clone());
            }
            // Last seen wins on duplicate phones.
            by_phone.insert(
                normalized.clone(),
                Recipient {
                    phone: normalized,
                    name,
                },
            );
        }

        Ok(order
            .into_iter()
            .filter_map(|phone| by_phone.remove(&phone))
            .collect())
    }

    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        status: CampaignStatus,
        total: usize,
        sent: usize,
        failed: usize,
        message: Option<&str>,
    ) -> Result<CampaignOutcome, CourierError> {
        self.store
            .update_campaign_progress(tenant, campaign_id, status, sent, failed, message)
            .await?;
        info!(
            tenant = %tenant,
            campaign = %campaign_id,
            status = %status,
            sent,
            failed,
            "campaign run finished"
        );
        Ok(CampaignOutcome {
            status,
            total,
            sent,
            failed,
            message: message.map(str::to_string),
        })
    }
}

/// Substitute `{{name}}` and `{{phone}}` placeholders.
fn render_template(template: &str, recipient: &Recipient) -> String {
    template
        .replace("{{name}}", &recipient.name)
        .replace("{{phone}}", &recipient.phone)
}

/// Normalize digits into a region-appropriate dialable form: a leading zero
/// is replaced by the region code, and short local numbers get it prepended.
fn dialable_phone(digits: &str, region_code: &str) -> String {
    if digits.starts_with(region_code) {
        return digits.to_string();
    }
    if let Some(rest) = digits.strip_prefix('0') {
        return format!("{region_code}{rest}");
    }
    if digits.len() <= 10 {
        return format!("{region_code}{digits}");
    }
    digits.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_substitutes_placeholders() {
        let recipient = Recipient {
            phone: "201001234567".into(),
            name: "Samir".into(),
        };
        assert_eq!(
            render_template("Hi {{name}}, offer for {{phone}}!", &recipient),
            "Hi Samir, offer for 201001234567!"
        );
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let recipient = Recipient {
            phone: "201001234567".into(),
            name: "Samir".into(),
        };
        assert_eq!(render_template("Flat text", &recipient), "Flat text");
    }

    #[test]
    fn dialable_replaces_leading_zero_with_region() {
        assert_eq!(dialable_phone("01001234567", "20"), "201001234567");
    }

    #[test]
    fn dialable_prepends_region_to_short_numbers() {
        assert_eq!(dialable_phone("1001234567", "20"), "201001234567");
    }

    #[test]
    fn dialable_keeps_already_regional_numbers() {
        assert_eq!(dialable_phone("201001234567", "20"), "201001234567");
    }
}
