//! API gateway client.
//!
//! # Request pipeline (per transmission)
//!
//! 1. Bearer token from the first configured credential key that has a value
//! 2. `X-Tenant-ID` from storage, else the default tenant
//! 3. Gating policy; gated calls get a fresh `X-Hardware-Signature` or fail
//!    without touching the network
//!
//! # Response handling
//!
//! - 2xx -> JSON payload only
//! - 401 -> redirect to login, `Unauthorized`
//! - 429 -> `RateLimited` (no backoff here, callers decide)
//! - 5xx -> retried while attempts remain, then `Server`
//! - other -> `Status`
//!
//! Transport failures and timeouts are never retried.

use crate::config::GatewayConfig;
use crate::credentials::{lookup_first, CredentialStore, MemoryStore};
use crate::loading::LoadingTracker;
use crate::navigator::{LogNavigator, Navigator};
use crate::signer::{HardwareSigner, SignatureRequest, UnavailableSigner};
use crate::transport::{RawResponse, ReqwestTransport, Transport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wos_core::{
    headers, ApiRequest, GateDecision, GateReason, GateRequirement, GatewayError, GatewayResult,
    Method, SignerError,
};
use wos_telemetry::Metrics;

/// Builder for [`ApiClient`]. Unset collaborators get production defaults.
pub struct ApiClientBuilder {
    config: GatewayConfig,
    transport: Option<Arc<dyn Transport>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    signer: Option<Arc<dyn HardwareSigner>>,
    navigator: Option<Arc<dyn Navigator>>,
    loading: Option<LoadingTracker>,
}

impl ApiClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn HardwareSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Share an existing tracker (e.g. one tracker across several clients).
    pub fn loading(mut self, loading: LoadingTracker) -> Self {
        self.loading = Some(loading);
        self
    }

    /// Validate the configuration and build the client.
    ///
    /// Defaults: reqwest transport, empty in-memory credentials, a signer that
    /// fails every gated call, and a logging navigator.
    pub fn build(self) -> GatewayResult<ApiClient> {
        self.config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(
                self.config.base_url.clone(),
                self.config.timeout(),
            )?),
        };

        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(LogNavigator::new(self.config.base_url.clone())));

        Ok(ApiClient {
            transport,
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(MemoryStore::new())),
            signer: self.signer.unwrap_or_else(|| Arc::new(UnavailableSigner)),
            navigator,
            loading: self.loading.unwrap_or_default(),
            config: self.config,
        })
    }
}

/// Gateway client. Cheap to share behind an `Arc`.
pub struct ApiClient {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    signer: Arc<dyn HardwareSigner>,
    navigator: Arc<dyn Navigator>,
    loading: LoadingTracker,
}

impl ApiClient {
    pub fn builder(config: GatewayConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            transport: None,
            credentials: None,
            signer: None,
            navigator: None,
            loading: None,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// In-flight state shared by every call on this client.
    pub fn loading(&self) -> &LoadingTracker {
        &self.loading
    }

    /// Gating decision for `request` without sending anything.
    pub fn gate_decision(&self, request: &ApiRequest) -> GateDecision {
        self.config.policy.evaluate(request)
    }

    pub async fn get(&self, path: &str) -> GatewayResult<Value> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> GatewayResult<Value> {
        self.execute(ApiRequest::post(path, body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> GatewayResult<Value> {
        self.execute(ApiRequest::put(path, body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> GatewayResult<Value> {
        self.execute(ApiRequest::patch(path, body)).await
    }

    pub async fn delete(&self, path: &str) -> GatewayResult<Value> {
        self.execute(ApiRequest::delete(path)).await
    }

    /// Call with an explicit method (used by the CLI).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> GatewayResult<Value> {
        let mut request = ApiRequest::new(method, path);
        request.body = body;
        self.execute(request).await
    }

    /// GET and decode the payload into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let value = self.get(path).await?;
        decode(value)
    }

    /// POST a serializable body and decode the payload into `T`.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        let body = serde_json::to_value(body)
            .map_err(|e| GatewayError::InvalidRequest(format!("Failed to serialize body: {e}")))?;
        let value = self.post(path, body).await?;
        decode(value)
    }

    /// Run `request` through the full pipeline and return the response payload.
    pub async fn execute(&self, request: ApiRequest) -> GatewayResult<Value> {
        let _in_flight = self.loading.begin();
        let started = Instant::now();
        let method = request.method;
        let path = request.path.clone();

        let result = self.execute_with_retry(request).await;

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        Metrics::request_finished(method.as_str(), outcome_label(&result), latency_ms);
        match &result {
            Ok(_) => debug!(%method, %path, latency_ms, "Request completed"),
            Err(e) => debug!(%method, %path, latency_ms, error = %e, "Request failed"),
        }

        result
    }

    async fn execute_with_retry(&self, request: ApiRequest) -> GatewayResult<Value> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt: u32 = 1;

        loop {
            let prepared = self.prepare(request.clone()).await?;
            let response = self.transport.send(prepared).await?;

            match self.classify(response) {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(
                        method = %request.method,
                        path = %request.path,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Server error, retrying"
                    );
                    Metrics::retry(request.method.as_str());
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Attach auth, tenant and (when gated) hardware signature headers.
    async fn prepare(&self, mut request: ApiRequest) -> GatewayResult<ApiRequest> {
        if let Some((key, token)) = lookup_first(self.credentials.as_ref(), &self.config.token_keys)
        {
            debug!(credential_key = key, "Attaching bearer token");
            request.set_header(headers::AUTHORIZATION, &format!("Bearer {token}"))?;
        }

        let tenant = self
            .credentials
            .get(&self.config.tenant_key)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.config.default_tenant.clone());
        request.set_header(headers::TENANT_ID, &tenant)?;

        let decision = self.config.policy.evaluate(&request);
        Metrics::gate_decision(decision.label());

        if let GateDecision::Required(requirement) = decision {
            let signature = self.sign(&request, requirement).await?;
            request.set_header(headers::HARDWARE_SIGNATURE, &signature)?;
        }

        Ok(request)
    }

    async fn sign(
        &self,
        request: &ApiRequest,
        requirement: GateRequirement,
    ) -> GatewayResult<String> {
        let reason = requirement.reason;
        info!(
            endpoint = %requirement.endpoint,
            reason = reason.label(),
            amount = ?requirement.amount,
            "Hardware signature required"
        );

        let signature_request = SignatureRequest {
            endpoint: requirement.endpoint.clone(),
            method: request.method,
            amount: requirement.amount.unwrap_or_default(),
            body: request.body.clone(),
        };

        let result = self
            .signer
            .request_signature(signature_request)
            .await
            .and_then(|sig| {
                if sig.trim().is_empty() {
                    Err(SignerError::Rejected("empty signature".to_string()))
                } else {
                    Ok(sig)
                }
            });

        result.map_err(|source| {
            Metrics::signature_failed(reason.label());
            warn!(
                endpoint = %requirement.endpoint,
                reason = reason.label(),
                error = %source,
                "Hardware signature failed, request not sent"
            );
            match reason {
                GateReason::Critical => GatewayError::CriticalSignatureRequired {
                    endpoint: requirement.endpoint,
                    source,
                },
                GateReason::HighValue { threshold } | GateReason::AmountMissing { threshold } => {
                    GatewayError::HighValueSignatureRequired {
                        endpoint: requirement.endpoint,
                        amount: requirement.amount,
                        threshold,
                        source,
                    }
                }
            }
        })
    }

    fn classify(&self, response: RawResponse) -> GatewayResult<Value> {
        let status = response.status;

        if response.is_success() {
            let body = response.body.trim();
            if body.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(body)
                .map_err(|e| GatewayError::Decode(format!("Invalid JSON payload: {e}")));
        }

        match status {
            401 => {
                warn!("Unauthorized, redirecting to {}", self.config.login_path);
                self.navigator.redirect(&self.config.login_path);
                Err(GatewayError::Unauthorized {
                    body: response.body,
                })
            }
            429 => {
                let retry_after = response
                    .header(&headers::RETRY_AFTER)
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                warn!(?retry_after, "Rate limited");
                Err(GatewayError::RateLimited {
                    retry_after,
                    body: response.body,
                })
            }
            s if s >= 500 => Err(GatewayError::Server {
                status: s,
                body: response.body,
            }),
            s => Err(GatewayError::Status {
                status: s,
                body: response.body,
            }),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> GatewayResult<T> {
    serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
}

fn outcome_label(result: &GatewayResult<Value>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(GatewayError::Unauthorized { .. }) => "unauthorized",
        Err(GatewayError::RateLimited { .. }) => "rate_limited",
        Err(GatewayError::Server { .. }) => "server_error",
        Err(GatewayError::Status { .. }) => "client_error",
        Err(GatewayError::Transport(_) | GatewayError::Timeout) => "transport",
        Err(
            GatewayError::CriticalSignatureRequired { .. }
            | GatewayError::HighValueSignatureRequired { .. },
        ) => "gated",
        Err(GatewayError::Decode(_)) => "decode",
        Err(GatewayError::InvalidRequest(_) | GatewayError::InvalidConfig(_)) => "invalid",
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}
