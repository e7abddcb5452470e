//! API gateway client for the Widget OS backend.
//!
//! Every outbound call goes through one pipeline that:
//! - attaches the bearer token and tenant header
//! - asks an out-of-band hardware signer for an attestation on gated calls
//! - unwraps the JSON payload on success
//! - redirects to login on 401, surfaces 429, retries 5xx once
//!
//! # Key Components
//!
//! - [`ApiClient`]: the call surface (`get`, `post`, `put`, `patch`, `delete`)
//! - [`LoadingTracker`]: reference-counted in-flight state
//! - [`Transport`]: HTTP backend ([`ReqwestTransport`], [`MockTransport`])
//! - [`CredentialStore`]: token and tenant lookup ([`MemoryStore`], [`FileStore`], [`EnvStore`])
//! - [`HardwareSigner`]: attestation source ([`HttpSigner`], [`LocalKeySigner`], [`MockSigner`])
//! - [`Navigator`]: session-invalidation redirect ([`LogNavigator`], [`RecordingNavigator`])

use std::pin::Pin;

pub mod client;
pub mod config;
pub mod credentials;
pub mod http_signer;
pub mod loading;
pub mod local_signer;
pub mod navigator;
pub mod signer;
pub mod transport;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{GatewayConfig, API_URL_ENV, DEFAULT_BASE_URL};
pub use credentials::{lookup_first, CredentialStore, EnvStore, FileStore, MemoryStore};
pub use http_signer::HttpSigner;
pub use loading::{InFlightGuard, LoadingTracker};
pub use local_signer::{KeySource, LocalKeySigner};
pub use navigator::{LogNavigator, Navigator, RecordingNavigator};
pub use signer::{HardwareSigner, MockSigner, SignatureRequest, UnavailableSigner};
pub use transport::{MockTransport, RawResponse, ReqwestTransport, Transport, TransportError};

pub use wos_core::{
    ApiRequest, GateDecision, GatewayError, GatewayResult, GatingPolicy, HeaderMap, HeaderName,
    HeaderValue, Method, SignerError,
};
