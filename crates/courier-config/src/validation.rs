// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: ordering between bounds, non-empty paths, sane timer values.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.session.qr_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.qr_timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.session.max_qr_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "session.max_qr_attempts must be at least 1".to_string(),
        });
    }

    if config.resolver.min_phone_digits == 0
        || config.resolver.min_phone_digits > config.resolver.max_phone_digits
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "resolver digit bounds invalid: min {} must be in 1..=max {}",
                config.resolver.min_phone_digits, config.resolver.max_phone_digits
            ),
        });
    }

    if config.resolver.person_suffix.trim().is_empty()
        || config.resolver.group_suffix.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "resolver suffixes must not be empty".to_string(),
        });
    }

    if config.campaign.jitter_min_ms > config.campaign.jitter_max_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "campaign.jitter_min_ms {} must not exceed campaign.jitter_max_ms {}",
                config.campaign.jitter_min_ms, config.campaign.jitter_max_ms
            ),
        });
    }

    if config.webhook.retry_delays_secs.is_empty() {
        errors.push(ConfigError::Validation {
            message: "webhook.retry_delays_secs must contain at least one delay".to_string(),
        });
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.credentials_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.credentials_dir must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = CourierConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_qr_timeout_fails_validation() {
        let mut config = CourierConfig::default();
        config.session.qr_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("qr_timeout_secs"))));
    }

    #[test]
    fn inverted_digit_bounds_fail_validation() {
        let mut config = CourierConfig::default();
        config.resolver.min_phone_digits = 20;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("digit bounds"))));
    }

    #[test]
    fn inverted_jitter_bounds_fail_validation() {
        let mut config = CourierConfig::default();
        config.campaign.jitter_min_ms = 9000;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("jitter_min_ms"))));
    }

    #[test]
    fn empty_retry_delays_fail_validation() {
        let mut config = CourierConfig::default();
        config.webhook.retry_delays_secs = Vec::new();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("retry_delays_secs"))));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = CourierConfig::default();
        config.gateway.host = "0.0.0.0".to_string();
        config.storage.database_path = "/tmp/test.db".to_string();
        config.session.qr_timeout_secs = 60;
        assert!(validate_config(&config).is_ok());
    }
}
