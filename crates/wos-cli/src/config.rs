//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wos_gateway::GatewayConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "WOS_CONFIG";

/// Config file used when neither `--config` nor `WOS_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Where tokens and the tenant id are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CredentialsConfig {
    /// JSON object file (e.g. written by a login flow).
    File { path: PathBuf },
    /// Environment variables (`widget_os_token` -> `WIDGET_OS_TOKEN`).
    Env {
        #[serde(default)]
        prefix: String,
    },
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        CredentialsConfig::Env {
            prefix: String::new(),
        }
    }
}

/// Which signer answers gated calls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SignerConfig {
    /// No device: every gated call fails before sending.
    #[default]
    None,
    /// Signing service endpoint.
    Http {
        url: String,
        /// Approval wait (ms). Default: 60,000.
        #[serde(default = "default_signer_timeout_ms")]
        timeout_ms: u64,
    },
    /// Local secp256k1 key; exactly one of `key_env` / `key_file`.
    Local {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_env: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_file: Option<PathBuf>,
    },
}

fn default_signer_timeout_ms() -> u64 {
    60_000
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub signer: SignerConfig,
}

impl AppConfig {
    /// Resolve the config path (argument > `WOS_CONFIG` > default) and load it.
    ///
    /// A missing file yields defaults. `WOS_API_URL` is applied afterwards.
    pub fn load(path: Option<String>) -> AppResult<Self> {
        let config_path = path
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!(path = %config_path, "Loading configuration");
            Self::from_file(&config_path)?
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };

        config.gateway.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn validate(&self) -> AppResult<()> {
        self.gateway
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        match &self.signer {
            SignerConfig::Http { url, timeout_ms } => {
                if url.trim().is_empty() {
                    return Err(AppError::Config("signer.url must not be empty".to_string()));
                }
                if *timeout_ms == 0 {
                    return Err(AppError::Config(
                        "signer.timeout_ms must be positive".to_string(),
                    ));
                }
            }
            SignerConfig::Local { key_env, key_file } => {
                if key_env.is_some() == key_file.is_some() {
                    return Err(AppError::Config(
                        "local signer needs exactly one of key_env or key_file".to_string(),
                    ));
                }
            }
            SignerConfig::None => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wos_core::{ApiRequest, GateDecision};

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.signer, SignerConfig::None);
        assert_eq!(config.gateway.max_attempts, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config_parsing() {
        let config = AppConfig::from_toml(
            r#"
            [gateway]
            base_url = "https://api.widget-os.example/api"
            timeout_ms = 5000

            [[gateway.policy.rules]]
            pattern = "/treasury/sweep"
            threshold = "1000"

            [[gateway.policy.rules]]
            pattern = "/risk/kill-switch"

            [credentials]
            kind = "file"
            path = "/tmp/wos-credentials.json"

            [signer]
            kind = "http"
            url = "http://127.0.0.1:7420/sign"
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.base_url, "https://api.widget-os.example/api");
        assert_eq!(config.gateway.timeout_ms, 5000);
        assert_eq!(config.gateway.policy.rules.len(), 2);
        assert_eq!(config.gateway.policy.rules[0].threshold, Some(dec!(1000)));
        assert_eq!(
            config.credentials,
            CredentialsConfig::File {
                path: PathBuf::from("/tmp/wos-credentials.json")
            }
        );
        assert_eq!(
            config.signer,
            SignerConfig::Http {
                url: "http://127.0.0.1:7420/sign".to_string(),
                timeout_ms: 60_000
            }
        );

        let decision = config.gateway.policy.evaluate(&ApiRequest::post(
            "/treasury/sweep",
            serde_json::json!({"amount": 5000}),
        ));
        assert!(matches!(decision, GateDecision::Required(_)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_local_signer_needs_one_key_source() {
        let both = AppConfig::from_toml(
            r#"
            [signer]
            kind = "local"
            key_env = "WOS_SIGNER_KEY"
            key_file = "/etc/wos/signer.key"
            "#,
        )
        .unwrap();
        assert!(matches!(both.validate(), Err(AppError::Config(_))));

        let neither = AppConfig::from_toml("[signer]\nkind = \"local\"\n").unwrap();
        assert!(matches!(neither.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_gateway_rejected() {
        let config = AppConfig::from_toml("[gateway]\nmax_attempts = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        assert!(AppConfig::from_toml("[signer]\nkind = \"yubikey\"\n").is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = AppConfig::load(Some(path.display().to_string())).unwrap();
        assert_eq!(config.gateway.max_attempts, 2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wos.toml");
        std::fs::write(&path, "[gateway]\nlogin_path = \"/signin\"\n").unwrap();

        let config = AppConfig::load(Some(path.display().to_string())).unwrap();
        assert_eq!(config.gateway.login_path, "/signin");
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("kind"));
    }
}
