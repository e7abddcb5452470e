//! Gateway error types.

use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a hardware signing backend.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("Signing request rejected: {0}")]
    Rejected(String),

    #[error("Signing device unavailable: {0}")]
    Unavailable(String),

    #[error("Signing key error: {0}")]
    Key(String),

    #[error("Signing payload serialization failed: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Signer failed for an endpoint that is always signed.
    #[error("Hardware signature required for this critical operation ({endpoint})")]
    CriticalSignatureRequired {
        endpoint: String,
        #[source]
        source: SignerError,
    },

    /// Signer failed for a call gated by amount.
    #[error("Hardware signature required for transactions of {threshold} or more ({endpoint})")]
    HighValueSignatureRequired {
        endpoint: String,
        amount: Option<Decimal>,
        threshold: Decimal,
        #[source]
        source: SignerError,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unauthorized (401): {body}")]
    Unauthorized { body: String },

    #[error("Rate limited (429): {body}")]
    RateLimited {
        retry_after: Option<Duration>,
        body: String,
    },

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response decode error: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GatewayError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Unauthorized { .. } => Some(401),
            GatewayError::RateLimited { .. } => Some(429),
            GatewayError::Server { status, .. } | GatewayError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Only server errors are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Server { .. })
    }

    /// Whether the call was stopped before transmission by a failed signature.
    pub fn is_gating_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::CriticalSignatureRequired { .. }
                | GatewayError::HighValueSignatureRequired { .. }
        )
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_gating_messages_differ() {
        let critical = GatewayError::CriticalSignatureRequired {
            endpoint: "/risk/kill-switch".to_string(),
            source: SignerError::Rejected("user cancelled".to_string()),
        };
        let high_value = GatewayError::HighValueSignatureRequired {
            endpoint: "/withdraw".to_string(),
            amount: Some(dec!(250000)),
            threshold: dec!(200000),
            source: SignerError::Rejected("user cancelled".to_string()),
        };

        let critical_msg = critical.to_string();
        let high_value_msg = high_value.to_string();
        assert!(critical_msg.contains("critical operation"));
        assert!(high_value_msg.contains("200000"));
        assert_ne!(critical_msg, high_value_msg);
        assert!(critical.is_gating_failure());
        assert!(high_value.is_gating_failure());
    }

    #[test]
    fn test_status_and_retryable() {
        let server = GatewayError::Server {
            status: 503,
            body: String::new(),
        };
        assert_eq!(server.status(), Some(503));
        assert!(server.is_retryable());

        let unauthorized = GatewayError::Unauthorized {
            body: String::new(),
        };
        assert_eq!(unauthorized.status(), Some(401));
        assert!(!unauthorized.is_retryable());

        assert_eq!(GatewayError::Timeout.status(), None);
        assert!(!GatewayError::Timeout.is_retryable());
    }
}
