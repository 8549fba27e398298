//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required telemetry credentials are present
//! - Value ranges (sizes and timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} '{value}' is not a valid socket address")]
    BadAddress { field: &'static str, value: String },

    #[error("telemetry.api_host '{0}' is not a valid http(s) URL")]
    BadApiHost(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let telemetry = &config.telemetry;

    if is_blank(telemetry.write_key.as_deref()) {
        errors.push(ValidationError::Missing("telemetry.write_key"));
    }
    if is_blank(telemetry.dataset.as_deref()) {
        errors.push(ValidationError::Missing("telemetry.dataset"));
    }
    if telemetry.host_field.trim().is_empty() {
        errors.push(ValidationError::Missing("telemetry.host_field"));
    }

    match Url::parse(&telemetry.api_host) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::BadApiHost(telemetry.api_host.clone())),
    }

    let positive = [
        ("telemetry.batch_size", telemetry.batch_size as u64),
        ("telemetry.flush_interval_ms", telemetry.flush_interval_ms),
        ("telemetry.queue_capacity", telemetry.queue_capacity as u64),
        ("telemetry.request_timeout_secs", telemetry.request_timeout_secs),
        ("server.request_timeout_secs", config.server.request_timeout_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    check_address(&mut errors, "server.bind_address", &config.server.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.telemetry.write_key = Some("abc".into());
        config.telemetry.dataset = Some("http-requests".into());
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_credentials_reported_together() {
        let mut config = valid();
        config.telemetry.write_key = None;
        config.telemetry.dataset = Some("   ".into());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::Missing("telemetry.write_key")));
        assert!(errors.contains(&ValidationError::Missing("telemetry.dataset")));
    }

    #[test]
    fn test_zero_batch_size_and_bad_host() {
        let mut config = valid();
        config.telemetry.batch_size = 0;
        config.telemetry.api_host = "ftp://example.com".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::Zero { field: "telemetry.batch_size" }));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = valid();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
