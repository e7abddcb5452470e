//! HTTP client for an out-of-band signing service.
//!
//! The service receives the signature payload as JSON and answers with
//! `{"signature": "<token>"}` once the operator approves on the device.

use crate::signer::{HardwareSigner, SignatureRequest};
use crate::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use wos_core::SignerError;

/// Default time to wait for device approval.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct SignatureResponse {
    signature: String,
}

/// Signer backed by a signing service endpoint.
pub struct HttpSigner {
    client: Client,
    url: String,
}

impl HttpSigner {
    /// Create a signer posting to `url` (e.g. "http://127.0.0.1:7420/sign").
    pub fn new(url: impl Into<String>) -> Result<Self, SignerError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, SignerError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            SignerError::Unavailable(format!("Failed to create HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn sign(&self, request: SignatureRequest) -> Result<String, SignerError> {
        info!(
            url = %self.url,
            endpoint = %request.endpoint,
            amount = %request.amount,
            "Requesting signature from signing service"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&request.payload())
            .send()
            .await
            .map_err(|e| SignerError::Unavailable(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Signing service rejected request");
            return Err(SignerError::Rejected(format!("HTTP {status}: {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SignerError::Unavailable(format!("HTTP {status}: {body}")));
        }

        let parsed: SignatureResponse = response.json().await.map_err(|e| {
            SignerError::Unavailable(format!("Failed to parse signing response: {e}"))
        })?;

        if parsed.signature.trim().is_empty() {
            return Err(SignerError::Rejected(
                "signing service returned an empty signature".to_string(),
            ));
        }

        // Never log the signature itself.
        debug!("Signature received");
        Ok(parsed.signature)
    }
}

impl HardwareSigner for HttpSigner {
    fn request_signature(
        &self,
        request: SignatureRequest,
    ) -> BoxFuture<'_, Result<String, SignerError>> {
        Box::pin(self.sign(request))
    }
}
