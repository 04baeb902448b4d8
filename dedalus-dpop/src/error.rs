//! Error types for DPoP and JWK operations

use thiserror::Error;

/// Errors that can occur during DPoP proof generation
#[derive(Debug, Error)]
pub enum DPoPError {
    /// Invalid cryptographic key
    #[error("Invalid key")]
    InvalidKey,

    /// The request URL could not be parsed or has no host
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// System clock error
    #[error("Clock error")]
    ClockError,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid proof format (not a valid JWT)
    #[error("Invalid proof format")]
    InvalidProofFormat,

    /// Invalid base64 encoding
    #[error("Invalid base64")]
    InvalidBase64,

    /// Invalid proof type (expected dpop+jwt)
    #[error("Invalid proof type (expected dpop+jwt)")]
    InvalidProofType,
}

/// Base64url decode failure
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Invalid base64url encoding")]
pub struct Base64UrlError;

impl From<Base64UrlError> for DPoPError {
    fn from(_: Base64UrlError) -> Self {
        DPoPError::InvalidBase64
    }
}

/// Errors that can occur when importing a public key from a JWK
///
/// These never carry key material, only the names of the offending members.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwkError {
    /// The JWK is not of the expected key type
    #[error("Expected RSA key, got kty={0}")]
    InvalidKeyType(String),

    /// A required JWK member is absent
    #[error("JWK is missing required member '{0}'")]
    MissingField(&'static str),

    /// A JWK member is not valid base64url
    #[error("JWK member '{0}' is not valid base64url")]
    InvalidBase64(&'static str),

    /// The key is below the minimum accepted strength
    #[error(
        "RSA key too weak: {bits} bits (minimum: {min_bits}). \
         This could indicate a malformed or malicious JWKS response"
    )]
    WeakKey {
        /// Bit length of the supplied modulus
        bits: usize,
        /// Minimum bit length that was required
        min_bits: usize,
    },

    /// The RSA parameters were rejected by the RSA implementation
    #[error("Invalid RSA key parameters: {0}")]
    InvalidKey(String),
}
