//! DPoP proof generation (RFC 9449)

use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;
use uuid::Uuid;

use crate::base64url;
use crate::error::DPoPError;
use crate::jwk::EcPublicJwk;

/// JWT `typ` of a DPoP proof
pub const DPOP_JWT_TYPE: &str = "dpop+jwt";

/// Signing algorithm used for every proof
pub const DPOP_ALGORITHM: &str = "ES256";

/// DPoP proof claims per RFC 9449 Section 4.2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DPoPClaims {
    /// Unique identifier for the proof (prevents replay)
    pub jti: String,
    /// HTTP method, uppercased
    pub htm: String,
    /// HTTP target URI without query and fragment
    pub htu: String,
    /// Issued at timestamp (seconds since Unix epoch)
    pub iat: i64,
    /// Access token hash binding the proof to a token (RFC 9449 §6.1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ath: Option<String>,
    /// Server-provided nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct DPoPHeader {
    typ: String,
    alg: String,
    jwk: EcPublicJwk,
}

/// Generate a DPoP proof JWT for a single HTTP request
///
/// The proof contains:
/// - Header with typ=dpop+jwt, alg=ES256, and the signer's public JWK
/// - Claims with a fresh jti, htm, htu, iat, and optional ath and nonce
/// - ES256 signature over `header.claims`
///
/// Proofs are single-use; callers mint a new one for every request.
pub fn generate_proof(
    signing_key: &SigningKey,
    method: &str,
    url: &str,
    access_token: Option<&str>,
    nonce: Option<&str>,
) -> Result<String, DPoPError> {
    let header = DPoPHeader {
        typ: DPOP_JWT_TYPE.to_string(),
        alg: DPOP_ALGORITHM.to_string(),
        jwk: EcPublicJwk::from_verifying_key(signing_key.verifying_key()),
    };

    let iat = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| DPoPError::ClockError)?
        .as_secs() as i64;

    let claims = DPoPClaims {
        jti: Uuid::new_v4().to_string(),
        htm: method.to_ascii_uppercase(),
        htu: normalize_htu(url)?,
        iat,
        ath: access_token.map(compute_ath),
        nonce: nonce.map(String::from),
    };

    let header_b64 = base64url::encode(serde_json::to_vec(&header)?);
    let claims_b64 = base64url::encode(serde_json::to_vec(&claims)?);

    let message = format!("{}.{}", header_b64, claims_b64);
    let signature: Signature = signing_key.sign(message.as_bytes());
    let sig_b64 = base64url::encode(signature.to_bytes());

    Ok(format!("{}.{}", message, sig_b64))
}

/// Compute the `ath` claim: base64url(SHA-256(access_token))
pub fn compute_ath(access_token: &str) -> String {
    base64url::encode(Sha256::digest(access_token.as_bytes()))
}

/// Reduce a request URL to the `htu` form: scheme, authority and path only
///
/// Query, fragment and userinfo are dropped; an empty path becomes `/`.
/// The rest follows WHATWG URL serialization: the host is lowercased, a
/// scheme's default port is omitted and the path is percent-encoded. RFC 9449
/// compares `htu` after the same normalization.
pub fn normalize_htu(url: &str) -> Result<String, DPoPError> {
    let mut parsed = Url::parse(url).map_err(|e| DPoPError::InvalidUrl(e.to_string()))?;
    if !parsed.has_host() {
        return Err(DPoPError::InvalidUrl("missing host".to_string()));
    }

    parsed.set_query(None);
    parsed.set_fragment(None);
    // Only fails for URLs without a host, ruled out above
    let _ = parsed.set_username("");
    let _ = parsed.set_password(None);

    Ok(parsed.into())
}

fn split_proof(proof: &str) -> Result<[&str; 3], DPoPError> {
    let mut parts = proof.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(claims), Some(signature), None) => Ok([header, claims, signature]),
        _ => Err(DPoPError::InvalidProofFormat),
    }
}

fn decode_header(proof: &str) -> Result<DPoPHeader, DPoPError> {
    let [header_b64, _, _] = split_proof(proof)?;
    let header: DPoPHeader = serde_json::from_slice(&base64url::decode(header_b64)?)?;

    if header.typ != DPOP_JWT_TYPE {
        return Err(DPoPError::InvalidProofType);
    }

    Ok(header)
}

/// Extract the JWK from a DPoP proof header
///
/// This can be used to check which key a proof was created with. The
/// signature is not verified.
pub fn extract_jwk_from_proof(proof: &str) -> Result<EcPublicJwk, DPoPError> {
    decode_header(proof).map(|header| header.jwk)
}

/// Decode the claims of a DPoP proof without verifying its signature
pub fn decode_proof_claims(proof: &str) -> Result<DPoPClaims, DPoPError> {
    decode_header(proof)?;
    let [_, claims_b64, _] = split_proof(proof)?;
    Ok(serde_json::from_slice(&base64url::decode(claims_b64)?)?)
}
