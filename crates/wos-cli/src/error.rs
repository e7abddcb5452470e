//! Application error types.

use thiserror::Error;
use wos_core::{GatewayError, SignerError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] wos_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
