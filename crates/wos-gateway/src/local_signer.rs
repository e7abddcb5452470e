//! Software signer backed by a local secp256k1 key.
//!
//! Stands in for a hardware device in development and staging. The token is
//! the `0x`-prefixed r||s||v signature over keccak256 of the payload JSON.
//!
//! Security notes:
//! - Key bytes are held in `Zeroizing` buffers while parsing.
//! - Keys are loaded once; no runtime rotation.
//! - Never log key material or signatures.

use crate::signer::{HardwareSigner, SignatureRequest};
use crate::BoxFuture;
use alloy::primitives::{keccak256, Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use std::path::PathBuf;
use tracing::info;
use wos_core::SignerError;
use zeroize::Zeroizing;

/// Source of the private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Hex key in an environment variable (development).
    EnvVar { var_name: String },
    /// Hex key in a file (recommend 0600 permissions).
    File { path: PathBuf },
}

/// Signs gated calls with a local key.
pub struct LocalKeySigner {
    signer: PrivateKeySigner,
}

impl LocalKeySigner {
    /// Load the key from `source`.
    ///
    /// # Errors
    /// Returns `SignerError::Key` if the variable or file is missing, the hex
    /// does not decode, or the bytes are not a valid secp256k1 key.
    pub fn load(source: &KeySource) -> Result<Self, SignerError> {
        let hex_key: Zeroizing<String> = match source {
            KeySource::EnvVar { var_name } => Zeroizing::new(
                std::env::var(var_name)
                    .map_err(|_| SignerError::Key(format!("environment variable not found: {var_name}")))?,
            ),
            KeySource::File { path } => Zeroizing::new(std::fs::read_to_string(path).map_err(
                |e| SignerError::Key(format!("failed to read key file {}: {e}", path.display())),
            )?),
        };

        let signer = Self::from_hex(&hex_key)?;
        info!(address = %signer.address(), "Loaded local signing key");
        Ok(signer)
    }

    /// Parse a hex key (0x prefix and surrounding whitespace allowed).
    pub fn from_hex(hex_key: &str) -> Result<Self, SignerError> {
        let trimmed = hex_key.trim().trim_start_matches("0x");
        let bytes = Zeroizing::new(
            hex::decode(trimmed).map_err(|e| SignerError::Key(format!("failed to decode hex: {e}")))?,
        );
        let signer = PrivateKeySigner::from_slice(&bytes)
            .map_err(|e| SignerError::Key(format!("invalid private key: {e}")))?;
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Hash that gets signed for `request`.
    pub fn digest(request: &SignatureRequest) -> Result<B256, SignerError> {
        let bytes = serde_json::to_vec(&request.payload())
            .map_err(|e| SignerError::Serialization(e.to_string()))?;
        Ok(keccak256(bytes))
    }

    async fn sign(&self, request: SignatureRequest) -> Result<String, SignerError> {
        let digest = Self::digest(&request)?;
        let signature = self
            .signer
            .sign_hash(&digest)
            .await
            .map_err(|e| SignerError::Rejected(format!("signing failed: {e}")))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

impl HardwareSigner for LocalKeySigner {
    fn request_signature(
        &self,
        request: SignatureRequest,
    ) -> BoxFuture<'_, Result<String, SignerError>> {
        Box::pin(self.sign(request))
    }
}
