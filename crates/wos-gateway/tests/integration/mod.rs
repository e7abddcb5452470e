//! Integration tests for wos-gateway.
//!
//! These run the real reqwest transport against a local HTTP server.

pub mod common;
