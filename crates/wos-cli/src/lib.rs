//! Widget OS gateway command-line client.
//!
//! Wires the gateway client to real collaborators from a TOML file:
//! - Credential store (JSON file or environment)
//! - Hardware signer (signing service, local key, or none)
//! - Logging navigator for 401 redirects

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, Command};
pub use config::{AppConfig, CredentialsConfig, SignerConfig};
pub use error::{AppError, AppResult};
