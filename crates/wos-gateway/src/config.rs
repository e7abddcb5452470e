//! Gateway configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wos_core::{GatewayError, GatewayResult, GatingPolicy};

/// Base URL used when neither the config file nor the environment sets one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding `base_url`.
pub const API_URL_ENV: &str = "WOS_API_URL";

/// Gateway configuration, fixed at client construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Backend base URL; request paths are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-attempt timeout (ms). Default: 10,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Credential keys tried in order for the bearer token; first hit wins.
    #[serde(default = "default_token_keys")]
    pub token_keys: Vec<String>,
    /// Credential key holding the tenant id.
    #[serde(default = "default_tenant_key")]
    pub tenant_key: String,
    /// Tenant sent when none is stored.
    #[serde(default = "default_tenant")]
    pub default_tenant: String,
    /// Redirect target on 401.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Transmissions per call, first attempt included. Default: 2 (one 5xx retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Hardware signature gating rules.
    #[serde(default)]
    pub policy: GatingPolicy,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_token_keys() -> Vec<String> {
    vec![
        "widget_os_token".to_string(),
        "token".to_string(),
        "auth_token".to_string(),
    ]
}

fn default_tenant_key() -> String {
    "widget_os_tenant_id".to_string()
}

fn default_tenant() -> String {
    "default".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_max_attempts() -> u32 {
    2
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            token_keys: default_token_keys(),
            tenant_key: default_tenant_key(),
            default_tenant: default_tenant(),
            login_path: default_login_path(),
            max_attempts: default_max_attempts(),
            policy: GatingPolicy::default(),
        }
    }
}

impl GatewayConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Apply `WOS_API_URL` if set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(GatewayError::InvalidConfig(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(GatewayError::InvalidConfig(
                "timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(GatewayError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        self.policy.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(
            config.token_keys,
            vec!["widget_os_token", "token", "auth_token"]
        );
        assert_eq!(config.default_tenant, "default");
        assert_eq!(config.max_attempts, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"base_url": "https://api.example.com"}"#).unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.policy, GatingPolicy::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_url = GatewayConfig::default().with_base_url("localhost:8000");
        assert!(bad_url.validate().is_err());

        let zero_attempts = GatewayConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(zero_attempts.validate().is_err());

        let zero_timeout = GatewayConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }
}
