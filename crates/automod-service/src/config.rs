//! Environment-sourced service configuration
//!
//! All knobs come from environment variables and are validated once at
//! startup; an invalid value aborts the process with a descriptive error
//! before the listener binds.

use automod_core::{Error, Result};
use std::time::Duration;
use tracing::info;

/// Default model checkpoint
const DEFAULT_MODEL: &str = "irlab-udc/MetaHateBERT";

/// Configuration for the moderation service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Model identifier: local directory or Hugging Face repo id (`MODEL`)
    pub model: String,

    /// Minimum HATE confidence that triggers a block (`HATE_THRESHOLD`)
    pub confidence_threshold: f32,

    /// TCP port to listen on (`MODERATION_SERVICE_PORT`)
    pub port: u16,

    /// Bind host (`API_HOST`)
    pub host: String,

    /// Inactivity period before self-termination (`MODERATION_IDLE_TIMEOUT`, minutes)
    pub idle_timeout: Duration,

    /// Per-field text truncation limit in characters (`MAX_TEXT_LENGTH`)
    pub max_text_length: usize,

    /// Budget for a single classification call (`REQUEST_TIMEOUT`, seconds)
    pub request_timeout: Duration,

    /// Default tracing filter (`LOG_LEVEL`)
    pub log_level: String,
}

impl ServiceConfig {
    /// Load and validate configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut errors: Vec<String> = Vec::new();

        let model = lookup("MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let confidence_threshold =
            parse_var(&lookup, "HATE_THRESHOLD", 0.7_f32, &mut errors);
        let port = parse_var(&lookup, "MODERATION_SERVICE_PORT", 8001_u16, &mut errors);
        let idle_minutes = parse_var(&lookup, "MODERATION_IDLE_TIMEOUT", 30_u64, &mut errors);
        let max_text_length = parse_var(&lookup, "MAX_TEXT_LENGTH", 2048_usize, &mut errors);
        let timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT", 10_u64, &mut errors);

        if !(0.0..=1.0).contains(&confidence_threshold) {
            errors.push("HATE_THRESHOLD must be between 0.0 and 1.0".to_string());
        }
        if port < 1024 {
            errors.push("MODERATION_SERVICE_PORT must be between 1024 and 65535".to_string());
        }
        if idle_minutes < 1 {
            errors.push("MODERATION_IDLE_TIMEOUT must be at least 1 minute".to_string());
        }
        if max_text_length == 0 {
            errors.push("MAX_TEXT_LENGTH must be greater than zero".to_string());
        }
        if timeout_secs < 1 {
            errors.push("REQUEST_TIMEOUT must be at least 1 second".to_string());
        }
        if model.trim().is_empty() {
            errors.push("MODEL must not be empty".to_string());
        }

        if !errors.is_empty() {
            return Err(Error::config(errors.join("; ")));
        }

        Ok(Self {
            model,
            confidence_threshold,
            port,
            host,
            idle_timeout: Duration::from_secs(idle_minutes * 60),
            max_text_length,
            request_timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }

    /// Log the effective configuration at startup
    pub fn log_summary(&self) {
        info!(model = %self.model, "model");
        info!(threshold = self.confidence_threshold, "confidence threshold");
        info!(host = %self.host, port = self.port, "listen address");
        info!(
            idle_timeout_min = self.idle_timeout.as_secs() / 60,
            "idle timeout"
        );
        info!(max_text_length = self.max_text_length, "max text length");
        info!(
            request_timeout_s = self.request_timeout.as_secs(),
            "per-request classification timeout"
        );
    }
}

/// Parse an optional environment variable, recording parse failures
fn parse_var<T: std::str::FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    errors: &mut Vec<String>,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                errors.push(format!("{key} has invalid value {raw:?}"));
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServiceConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_service_contract() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.model, "irlab-udc/MetaHateBERT");
        assert_eq!(config.confidence_threshold, 0.7);
        assert_eq!(config.port, 8001);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.idle_timeout, Duration::from_secs(30 * 60));
        assert_eq!(config.max_text_length, 2048);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn overrides_are_honored() {
        let config = config_from(&[
            ("MODEL", "./models/metahate"),
            ("HATE_THRESHOLD", "0.9"),
            ("MODERATION_SERVICE_PORT", "9100"),
            ("MODERATION_IDLE_TIMEOUT", "5"),
        ])
        .unwrap();
        assert_eq!(config.model, "./models/metahate");
        assert_eq!(config.confidence_threshold, 0.9);
        assert_eq!(config.port, 9100);
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
    }

    #[test]
    fn out_of_range_values_are_fatal() {
        assert!(config_from(&[("HATE_THRESHOLD", "1.5")]).is_err());
        assert!(config_from(&[("MODERATION_SERVICE_PORT", "80")]).is_err());
        assert!(config_from(&[("MODERATION_IDLE_TIMEOUT", "0")]).is_err());
        assert!(config_from(&[("MAX_TEXT_LENGTH", "0")]).is_err());
        assert!(config_from(&[("REQUEST_TIMEOUT", "0")]).is_err());
    }

    #[test]
    fn unparseable_values_are_fatal_with_every_violation_reported() {
        let err = config_from(&[
            ("HATE_THRESHOLD", "lots"),
            ("MODERATION_SERVICE_PORT", "not-a-port"),
        ])
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("HATE_THRESHOLD"));
        assert!(message.contains("MODERATION_SERVICE_PORT"));
    }
}
