//! JWK Thumbprint computation (RFC 7638)

use p256::ecdsa::VerifyingKey;
use sha2::{Digest, Sha256};

use crate::base64url;
use crate::jwk::EcPublicJwk;

/// Compute the JWK thumbprint of a P-256 verifying key
///
/// The thumbprint is base64url(SHA-256) of the canonical JSON form
/// `{"crv":"P-256","kty":"EC","x":"...","y":"..."}`, which is always 43
/// characters long.
pub fn compute_thumbprint(verifying_key: &VerifyingKey) -> String {
    compute_thumbprint_from_jwk(&EcPublicJwk::from_verifying_key(verifying_key))
}

/// Compute the JWK thumbprint of an [`EcPublicJwk`]
pub fn compute_thumbprint_from_jwk(jwk: &EcPublicJwk) -> String {
    let hash = Sha256::digest(canonical_json(jwk).as_bytes());
    base64url::encode(hash)
}

/// Required members only, lexicographically ordered, no whitespace.
fn canonical_json(jwk: &EcPublicJwk) -> String {
    // crv < kty < x < y
    format!(
        r#"{{"crv":"{}","kty":"{}","x":"{}","y":"{}"}}"#,
        jwk.crv, jwk.kty, jwk.x, jwk.y
    )
}
