//! Hardware signer abstraction.
//!
//! Gated calls ask a [`HardwareSigner`] for an attestation token before they
//! are sent. A fresh token is requested for every transmission; tokens are
//! never cached.

use crate::BoxFuture;
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use wos_core::{Method, SignerError};

/// What the signer is asked to attest.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureRequest {
    /// Request path (e.g. "/brokerage/trade").
    pub endpoint: String,
    pub method: Method,
    /// Resolved transaction amount (zero when the body carries none).
    pub amount: Decimal,
    pub body: Option<Value>,
}

impl SignatureRequest {
    /// JSON payload sent to the signing device: the body fields plus
    /// `endpoint` and `amount`. Non-object bodies are nested under `data`.
    pub fn payload(&self) -> Value {
        let mut fields = match &self.body {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("data".to_string(), other.clone());
                map
            }
            None => Map::new(),
        };
        fields.insert("endpoint".to_string(), Value::String(self.endpoint.clone()));
        fields.insert("amount".to_string(), decimal_to_json(self.amount));
        Value::Object(fields)
    }
}

/// Integral amounts become JSON integers, others JSON floats.
fn decimal_to_json(amount: Decimal) -> Value {
    if amount.fract().is_zero() {
        if let Some(int) = amount.to_i64() {
            return Value::from(int);
        }
    }
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(amount.to_string()))
}

/// Out-of-band signing device or service.
pub trait HardwareSigner: Send + Sync {
    /// Obtain an attestation token. Errors abort the gated call.
    fn request_signature(&self, request: SignatureRequest)
        -> BoxFuture<'_, Result<String, SignerError>>;
}

/// Signer used when no device is configured; every gated call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSigner;

impl HardwareSigner for UnavailableSigner {
    fn request_signature(
        &self,
        _request: SignatureRequest,
    ) -> BoxFuture<'_, Result<String, SignerError>> {
        Box::pin(async {
            Err(SignerError::Unavailable(
                "no hardware signer configured".to_string(),
            ))
        })
    }
}

/// Mock signer for testing.
///
/// Approves with `mock-sig-<n>` (n counts calls from 1) unless a rejection is set.
#[derive(Debug, Default)]
pub struct MockSigner {
    calls: Mutex<Vec<SignatureRequest>>,
    rejection: Mutex<Option<String>>,
}

impl MockSigner {
    pub fn approving() -> Self {
        Self::default()
    }

    pub fn rejecting(reason: impl Into<String>) -> Self {
        let signer = Self::default();
        signer.set_rejection(Some(reason.into()));
        signer
    }

    pub fn set_rejection(&self, reason: Option<String>) {
        *self.rejection.lock() = reason;
    }

    /// Recorded signature requests.
    pub fn get_calls(&self) -> Vec<SignatureRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl HardwareSigner for MockSigner {
    fn request_signature(
        &self,
        request: SignatureRequest,
    ) -> BoxFuture<'_, Result<String, SignerError>> {
        Box::pin(async move {
            let n = {
                let mut calls = self.calls.lock();
                calls.push(request);
                calls.len()
            };
            match self.rejection.lock().clone() {
                Some(reason) => Err(SignerError::Rejected(reason)),
                None => Ok(format!("mock-sig-{n}")),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn request(body: Option<Value>, amount: Decimal) -> SignatureRequest {
        SignatureRequest {
            endpoint: "/brokerage/trade".to_string(),
            method: Method::Post,
            amount,
            body,
        }
    }

    #[test]
    fn test_payload_merges_body_fields() {
        let payload = request(
            Some(json!({"amount": "250000", "symbol": "AAPL"})),
            dec!(250000),
        )
        .payload();

        assert_eq!(payload["endpoint"], json!("/brokerage/trade"));
        assert_eq!(payload["amount"], json!(250000));
        assert_eq!(payload["symbol"], json!("AAPL"));
    }

    #[test]
    fn test_payload_without_object_body() {
        let payload = request(None, Decimal::ZERO).payload();
        assert_eq!(payload, json!({"endpoint": "/brokerage/trade", "amount": 0}));

        let payload = request(Some(json!([1, 2])), dec!(12.5)).payload();
        assert_eq!(payload["data"], json!([1, 2]));
        assert_eq!(payload["amount"], json!(12.5));
    }

    #[tokio::test]
    async fn test_mock_signer_records_and_counts() {
        let signer = MockSigner::approving();
        let sig = signer
            .request_signature(request(None, Decimal::ZERO))
            .await
            .unwrap();
        assert_eq!(sig, "mock-sig-1");

        signer.set_rejection(Some("denied".to_string()));
        let err = signer
            .request_signature(request(None, Decimal::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, SignerError::Rejected(_)));
        assert_eq!(signer.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_signer_always_fails() {
        let err = UnavailableSigner
            .request_signature(request(None, Decimal::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, SignerError::Unavailable(_)));
    }
}
