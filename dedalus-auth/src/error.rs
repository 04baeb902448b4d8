//! Error types for request authentication and credential encryption
//!
//! None of these render access tokens, API keys or credential values.

use dedalus_dpop::{DPoPError, JwkError};
use thiserror::Error;

/// Errors from auth handlers and the token-exchange bootstrap
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("DPoP proof generation failed: {0}")]
    Proof(#[from] DPoPError),

    /// A header value could not be built; carries the header name only
    #[error("Invalid value for header {0}")]
    InvalidHeader(&'static str),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The authorization server refused the exchange
    ///
    /// `body` is kept for inspection but never rendered by `Display`.
    #[error("Token exchange failed with HTTP {status}")]
    TokenExchange { status: u16, body: String },

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Invalid authorization server URL: {0}")]
    InvalidUrl(String),
}

/// Errors from encryption key discovery and credential encryption
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// `body` is kept for inspection and left out of the message
    #[error("JWKS request to {url} failed with HTTP {status}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Failed to parse JWKS: {0}")]
    InvalidJwks(String),

    #[error("No keys found in JWKS")]
    NoKeysFound,

    #[error("No RSA encryption key found in JWKS")]
    NoEncryptionKey,

    #[error("Unusable encryption key: {0}")]
    Key(#[from] JwkError),

    #[error("Failed to serialize credentials")]
    Serialization(#[source] serde_json::Error),

    #[error("Credentials too large for RSA-OAEP: {size} bytes (maximum: {max})")]
    PlaintextTooLarge { size: usize, max: usize },

    #[error("RSA-OAEP encryption failed: {0}")]
    Encryption(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_exchange_display_omits_body() {
        let err = AuthError::TokenExchange {
            status: 401,
            body: r#"{"error":"invalid_grant","subject_token":"sk-secret"}"#.to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(!message.contains("sk-secret"));
        assert!(!message.contains("invalid_grant"));
    }

    #[test]
    fn test_invalid_header_names_header_only() {
        let err = AuthError::InvalidHeader("Authorization");
        assert_eq!(err.to_string(), "Invalid value for header Authorization");
    }

    #[test]
    fn test_jwks_http_display_omits_body() {
        let err = EncryptionError::Http {
            status: 503,
            url: "https://as.example.com/.well-known/jwks.json".to_string(),
            body: "upstream maintenance".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "JWKS request to https://as.example.com/.well-known/jwks.json failed with HTTP 503"
        );
    }

    #[test]
    fn test_plaintext_too_large_reports_sizes() {
        let err = EncryptionError::PlaintextTooLarge { size: 300, max: 190 };
        assert_eq!(
            err.to_string(),
            "Credentials too large for RSA-OAEP: 300 bytes (maximum: 190)"
        );
    }

    #[test]
    fn test_key_error_wraps_jwk_error() {
        let err: EncryptionError = JwkError::WeakKey {
            bits: 1024,
            min_bits: 2048,
        }
        .into();

        assert!(matches!(err, EncryptionError::Key(_)));
        assert!(err.to_string().contains("1024 bits"));
    }
}
