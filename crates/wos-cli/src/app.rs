//! Command execution.
//!
//! Builds an [`ApiClient`] from [`AppConfig`] and runs one command:
//! - `get` / `post` / `put` / `patch` / `delete`: call the gateway, print payload
//! - `check`: print the gating decision without sending anything
//! - `metrics`: print the Prometheus registry

use crate::config::{AppConfig, CredentialsConfig, SignerConfig};
use crate::error::{AppError, AppResult};
use clap::Subcommand;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wos_core::{ApiRequest, GateDecision, Method};
use wos_gateway::{
    ApiClient, CredentialStore, EnvStore, FileStore, HardwareSigner, HttpSigner, KeySource,
    LocalKeySigner, LogNavigator, UnavailableSigner,
};

/// CLI commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// GET a resource
    Get {
        path: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_parser = parse_key_val)]
        query: Vec<(String, String)>,
    },
    /// POST a JSON body
    Post {
        path: String,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// PUT a JSON body
    Put {
        path: String,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// PATCH a JSON body
    Patch {
        path: String,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// DELETE a resource
    Delete { path: String },
    /// Show whether a call would need a hardware signature
    Check {
        path: String,
        #[arg(short, long, default_value = "POST")]
        method: Method,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Print metrics in Prometheus text format
    Metrics,
}

/// Parse `key=value`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_body(data: Option<&str>) -> AppResult<Option<Value>> {
    data.map(|raw| {
        serde_json::from_str(raw)
            .map_err(|e| AppError::InvalidArgument(format!("--data is not valid JSON: {e}")))
    })
    .transpose()
}

/// Main application.
pub struct Application {
    client: ApiClient,
}

impl Application {
    /// Create the application and its gateway client.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let credentials = build_credentials(&config.credentials);
        let signer = build_signer(&config.signer)?;
        let navigator = Arc::new(LogNavigator::new(config.gateway.base_url.clone()));

        let client = ApiClient::builder(config.gateway.clone())
            .credentials(credentials)
            .signer(signer)
            .navigator(navigator)
            .build()?;

        info!(base_url = %config.gateway.base_url, "Gateway client ready");
        Ok(Self { client })
    }

    /// Run `command` and return what should be printed.
    pub async fn run(&self, command: Command) -> AppResult<String> {
        match command {
            Command::Get { path, query } => {
                let request = query
                    .into_iter()
                    .fold(ApiRequest::get(path), |req, (k, v)| req.with_query(k, v));
                self.send(request).await
            }
            Command::Post { path, data } => {
                self.call(Method::Post, &path, data.as_deref()).await
            }
            Command::Put { path, data } => self.call(Method::Put, &path, data.as_deref()).await,
            Command::Patch { path, data } => {
                self.call(Method::Patch, &path, data.as_deref()).await
            }
            Command::Delete { path } => self.send(ApiRequest::delete(path)).await,
            Command::Check { path, method, data } => {
                let mut request = ApiRequest::new(method, path);
                request.body = parse_body(data.as_deref())?;
                Ok(serde_json::to_string_pretty(&self.check(&request))?)
            }
            Command::Metrics => Ok(wos_telemetry::gather_text()?),
        }
    }

    async fn call(&self, method: Method, path: &str, data: Option<&str>) -> AppResult<String> {
        let mut request = ApiRequest::new(method, path);
        request.body = parse_body(data)?;
        self.send(request).await
    }

    async fn send(&self, request: ApiRequest) -> AppResult<String> {
        let payload = self.client.execute(request).await?;
        Ok(serde_json::to_string_pretty(&payload)?)
    }

    /// Gating decision as JSON.
    pub fn check(&self, request: &ApiRequest) -> Value {
        match self.client.gate_decision(request) {
            GateDecision::Open => json!({
                "method": request.method,
                "path": request.path,
                "signature_required": false,
            }),
            GateDecision::Required(requirement) => json!({
                "method": request.method,
                "path": request.path,
                "signature_required": true,
                "reason": requirement.reason.label(),
                "threshold": requirement.reason.threshold().map(|t| t.to_string()),
                "amount": requirement.amount.map(|a| a.to_string()),
            }),
        }
    }
}

fn build_credentials(config: &CredentialsConfig) -> Arc<dyn CredentialStore> {
    match config {
        CredentialsConfig::File { path } => {
            info!(path = %path.display(), "Reading credentials from file");
            Arc::new(FileStore::new(path.clone()))
        }
        CredentialsConfig::Env { prefix } => Arc::new(EnvStore::with_prefix(prefix.clone())),
    }
}

fn build_signer(config: &SignerConfig) -> AppResult<Arc<dyn HardwareSigner>> {
    let signer: Arc<dyn HardwareSigner> = match config {
        SignerConfig::None => Arc::new(UnavailableSigner),
        SignerConfig::Http { url, timeout_ms } => Arc::new(HttpSigner::with_timeout(
            url.clone(),
            Duration::from_millis(*timeout_ms),
        )?),
        SignerConfig::Local { key_env, key_file } => {
            let source = match (key_env, key_file) {
                (Some(var_name), None) => KeySource::EnvVar {
                    var_name: var_name.clone(),
                },
                (None, Some(path)) => KeySource::File { path: path.clone() },
                _ => {
                    return Err(AppError::Config(
                        "local signer needs exactly one of key_env or key_file".to_string(),
                    ))
                }
            };
            Arc::new(LocalKeySigner::load(&source)?)
        }
    };
    Ok(signer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use wos_gateway::GatewayConfig;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        TestCli::try_parse_from(std::iter::once("wos").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    fn offline_app() -> Application {
        Application::new(AppConfig {
            gateway: GatewayConfig::default().with_base_url("http://127.0.0.1:9"),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("period=1d").unwrap(),
            ("period".to_string(), "1d".to_string())
        );
        assert_eq!(
            parse_key_val("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(
            parse(&["get", "/portfolio/summary", "-q", "period=1d"]),
            Command::Get {
                path: "/portfolio/summary".to_string(),
                query: vec![("period".to_string(), "1d".to_string())],
            }
        );
        assert_eq!(
            parse(&["check", "/withdraw", "--data", r#"{"amount": 1}"#]),
            Command::Check {
                path: "/withdraw".to_string(),
                method: Method::Post,
                data: Some(r#"{"amount": 1}"#.to_string()),
            }
        );
        assert_eq!(
            parse(&["check", "/transfer", "--method", "put"]),
            Command::Check {
                path: "/transfer".to_string(),
                method: Method::Put,
                data: None,
            }
        );
        assert_eq!(parse(&["metrics"]), Command::Metrics);
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(None).unwrap(), None);
        assert_eq!(
            parse_body(Some(r#"{"amount": 5}"#)).unwrap(),
            Some(json!({"amount": 5}))
        );
        assert!(matches!(
            parse_body(Some("{not json")),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_check_reports_decision_without_network() {
        let app = offline_app();

        let out = app
            .run(Command::Check {
                path: "/withdraw".to_string(),
                method: Method::Post,
                data: Some(r#"{"amount": 300000}"#.to_string()),
            })
            .await
            .unwrap();
        let report: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["signature_required"], json!(true));
        assert_eq!(report["reason"], json!("high_value"));
        assert_eq!(report["threshold"], json!("200000"));

        let report = app.check(&ApiRequest::get("/withdraw"));
        assert_eq!(report["signature_required"], json!(false));
    }

    #[tokio::test]
    async fn test_gated_post_fails_without_signer() {
        let app = offline_app();
        let err = app
            .run(Command::Post {
                path: "/risk/kill-switch".to_string(),
                data: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Gateway(e) if e.is_gating_failure()));
    }

    #[tokio::test]
    async fn test_metrics_command() {
        let app = offline_app();
        let _ = app
            .run(Command::Post {
                path: "/risk/kill-switch".to_string(),
                data: Some("{}".to_string()),
            })
            .await;

        let out = app.run(Command::Metrics).await.unwrap();
        assert!(out.contains("wos_signature_failures_total"));
        assert!(out.contains("wos_requests_total"));
    }

    #[test]
    fn test_local_signer_from_missing_env_fails() {
        let err = build_signer(&SignerConfig::Local {
            key_env: Some("WOS_TEST_KEY_THAT_IS_NOT_SET".to_string()),
            key_file: None,
        });
        assert!(matches!(err, Err(AppError::Signer(_))));
    }
}
