// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier platform.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Platform identity and logging settings.
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Session lifecycle settings (pairing window, retry caps, reconnect).
    #[serde(default)]
    pub session: SessionConfig,

    /// Chat-identifier resolution heuristics.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Contact cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Webhook delivery settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Campaign broadcast settings.
    #[serde(default)]
    pub campaign: CampaignConfig,

    /// HTTP/WebSocket gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Messaging-client bridge settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Platform identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Display name of this deployment.
    #[serde(default = "default_platform_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            name: default_platform_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_platform_name() -> String {
    "courier".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// QR pairing window before a silent reset, in seconds.
    #[serde(default = "default_qr_timeout_secs")]
    pub qr_timeout_secs: u64,

    /// Maximum automatic QR retries before terminal error.
    #[serde(default = "default_max_qr_attempts")]
    pub max_qr_attempts: u32,

    /// Delay before the single auto-reconnect attempt, in seconds.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Delay before downstream automation fires on an inbound message,
    /// in milliseconds. Avoids racing the sender's own echo.
    #[serde(default = "default_automation_delay_ms")]
    pub automation_delay_ms: u64,

    /// Disconnect-reason needles treated as an explicit logout
    /// (case-insensitive substring match).
    #[serde(default = "default_logout_reasons")]
    pub logout_reasons: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            qr_timeout_secs: default_qr_timeout_secs(),
            max_qr_attempts: default_max_qr_attempts(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            automation_delay_ms: default_automation_delay_ms(),
            logout_reasons: default_logout_reasons(),
        }
    }
}

fn default_qr_timeout_secs() -> u64 {
    180 // 3 minutes
}

fn default_max_qr_attempts() -> u32 {
    3
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_automation_delay_ms() -> u64 {
    1500
}

fn default_logout_reasons() -> Vec<String> {
    vec![
        "logout".to_string(),
        "logged_out".to_string(),
        "conflict".to_string(),
    ]
}

/// Chat-identifier resolution heuristics.
///
/// These mirror the external network's identifier format and are
/// deliberately configurable: the format is observed, not guaranteed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Minimum digit count for a plausible phone number.
    #[serde(default = "default_min_phone_digits")]
    pub min_phone_digits: usize,

    /// Maximum digit count; longer strings are internal identifiers.
    #[serde(default = "default_max_phone_digits")]
    pub max_phone_digits: usize,

    /// Addressing suffix for person chats.
    #[serde(default = "default_person_suffix")]
    pub person_suffix: String,

    /// Addressing suffix for group chats.
    #[serde(default = "default_group_suffix")]
    pub group_suffix: String,

    /// Digit prefixes that mark an identifier as network-internal rather
    /// than a dialable phone number.
    #[serde(default = "default_internal_prefixes")]
    pub internal_prefixes: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_phone_digits: default_min_phone_digits(),
            max_phone_digits: default_max_phone_digits(),
            person_suffix: default_person_suffix(),
            group_suffix: default_group_suffix(),
            internal_prefixes: default_internal_prefixes(),
        }
    }
}

fn default_min_phone_digits() -> usize {
    8
}

fn default_max_phone_digits() -> usize {
    15
}

fn default_person_suffix() -> String {
    "@c.us".to_string()
}

fn default_group_suffix() -> String {
    "@g.us".to_string()
}

fn default_internal_prefixes() -> Vec<String> {
    vec!["120363".to_string()]
}

/// Contact cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Contact cache entry lifetime, in seconds.
    #[serde(default = "default_contact_ttl_secs")]
    pub contact_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            contact_ttl_secs: default_contact_ttl_secs(),
        }
    }
}

fn default_contact_ttl_secs() -> u64 {
    1800 // 30 minutes
}

/// Webhook delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Delay before each retry, in seconds. Length determines retry count:
    /// total attempts = 1 + retry_delays_secs.len().
    #[serde(default = "default_retry_delays_secs")]
    pub retry_delays_secs: Vec<u64>,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            retry_delays_secs: default_retry_delays_secs(),
            timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

fn default_retry_delays_secs() -> Vec<u64> {
    vec![1, 3, 7]
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

/// Campaign broadcast configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CampaignConfig {
    /// Lower bound of the per-recipient jitter delay, in milliseconds.
    #[serde(default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,

    /// Upper bound of the per-recipient jitter delay, in milliseconds.
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,

    /// Country calling code prepended to phones lacking one.
    #[serde(default = "default_region_code")]
    pub default_region_code: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            jitter_min_ms: default_jitter_min_ms(),
            jitter_max_ms: default_jitter_max_ms(),
            default_region_code: default_region_code(),
        }
    }
}

fn default_jitter_min_ms() -> u64 {
    2000
}

fn default_jitter_max_ms() -> u64 {
    5000
}

fn default_region_code() -> String {
    "20".to_string()
}

/// HTTP/WebSocket gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token for API auth. `None` rejects all API requests (fail-closed).
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8750
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory holding per-tenant credential blobs.
    #[serde(default = "default_credentials_dir")]
    pub credentials_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            credentials_dir: default_credentials_dir(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("courier").join("courier.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("courier.db"))
        .to_string_lossy()
        .into_owned()
}

/// Messaging-client bridge configuration.
///
/// The bridge talks to an external service hosting the actual network
/// clients; Courier never speaks the network's wire protocol itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Base URL of the client-host service. `None` disables the bridge;
    /// `serve` refuses to start without it.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key sent to the client-host service.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_bridge_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_bridge_timeout_secs(),
        }
    }
}

fn default_bridge_timeout_secs() -> u64 {
    30
}

fn default_credentials_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("courier").join("credentials"))
        .unwrap_or_else(|| std::path::PathBuf::from("credentials"))
        .to_string_lossy()
        .into_owned()
}
