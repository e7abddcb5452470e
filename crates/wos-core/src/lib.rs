//! Core types for the Widget OS API gateway.
//!
//! Everything here is pure and I/O free:
//! - [`ApiRequest`]: the per-call request descriptor the gateway pipeline mutates
//! - [`resolve_amount`]: transaction amount lookup in a JSON body
//! - [`GatingPolicy`]: the injectable table deciding which calls need a hardware signature
//! - [`GatewayError`] / [`SignerError`]: the error taxonomy surfaced to callers

pub mod amount;
pub mod error;
pub mod policy;
pub mod request;

pub use amount::{resolve_amount, ResolvedAmount, AMOUNT_FIELDS};
pub use error::{GatewayError, GatewayResult, SignerError};
pub use policy::{
    GateDecision, GateReason, GateRequirement, GatingPolicy, MissingAmount, PolicyRule,
    DEFAULT_HIGH_VALUE_THRESHOLD,
};
pub use request::{headers, ApiRequest, Method};
pub use http::header::{HeaderMap, HeaderName, HeaderValue};
