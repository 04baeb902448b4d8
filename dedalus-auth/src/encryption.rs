//! Client-side credential encryption for connection provisioning
//!
//! Credentials are encrypted with RSA-OAEP (SHA-256, MGF1-SHA-256, no label)
//! under the authorization server's published encryption key. Only the
//! server holds the private key. The wire form is base64url ciphertext.
//!
//! ```rust,ignore
//! let public_key = fetch_encryption_public_key(&client, DEFAULT_AS_URL, None).await?;
//! let payload = prepare_connection_payload(&connection, &credential, &public_key)?;
//! ```

use dedalus_dpop::{base64url, jwk_to_rsa_public_key, Jwks, DEFAULT_MIN_RSA_KEY_BITS};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use reqwest::StatusCode;
use rsa::{Oaep, RsaPublicKey};
use serde::Serialize;
use sha2::Sha256;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::credentials::{Connection, Credential, Credentials};
use crate::error::EncryptionError;

/// SHA-256 output length, which fixes the OAEP overhead
const OAEP_HASH_LEN: usize = 32;

/// Body of a connection provisioning request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionPayload {
    pub name: String,
    pub base_url: String,
    pub timeout_ms: u64,
    pub encrypted_credentials: String,
}

fn jwks_url(as_url: &str) -> String {
    format!("{}/.well-known/jwks.json", as_url.trim_end_matches('/'))
}

fn read_jwks(url: &str, status: StatusCode, body: String) -> Result<Jwks, EncryptionError> {
    if !status.is_success() {
        warn!(url = %url, status = status.as_u16(), "JWKS request failed");
        return Err(EncryptionError::Http {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| EncryptionError::InvalidJwks(e.to_string()))
}

/// Pick the first RSA `use=enc` key, optionally restricted to one `kid`
///
/// Keys published for signing are never used for encryption. An empty
/// `key_id` applies no restriction.
fn select_encryption_key(
    jwks: &Jwks,
    key_id: Option<&str>,
    min_key_bits: usize,
) -> Result<RsaPublicKey, EncryptionError> {
    if jwks.keys.is_empty() {
        return Err(EncryptionError::NoKeysFound);
    }

    let key_id = key_id.filter(|kid| !kid.is_empty());

    let jwk = jwks
        .keys
        .iter()
        .filter(|jwk| jwk.is_rsa_encryption_key())
        .find(|jwk| key_id.map_or(true, |kid| jwk.kid.as_deref() == Some(kid)))
        .ok_or(EncryptionError::NoEncryptionKey)?;

    Ok(jwk_to_rsa_public_key(jwk, min_key_bits)?)
}

fn loaded(url: &str, key: RsaPublicKey) -> RsaPublicKey {
    info!(url = %url, bits = key.size() * 8, "Loaded credential encryption key");
    key
}

/// Fetch the authorization server's credential encryption key
///
/// GETs `{as_url}/.well-known/jwks.json` and returns the first RSA key with
/// `use == "enc"` (and `kid == key_id` when a non-empty `key_id` is given).
/// Keys under 2048 bits are rejected. A non-2xx response comes back as
/// [`EncryptionError::Http`] carrying the response body.
pub async fn fetch_encryption_public_key(
    client: &reqwest::Client,
    as_url: &str,
    key_id: Option<&str>,
) -> Result<RsaPublicKey, EncryptionError> {
    fetch_encryption_public_key_with_min_bits(client, as_url, key_id, DEFAULT_MIN_RSA_KEY_BITS)
        .await
}

/// [`fetch_encryption_public_key`] with a caller-chosen minimum key size
pub async fn fetch_encryption_public_key_with_min_bits(
    client: &reqwest::Client,
    as_url: &str,
    key_id: Option<&str>,
    min_key_bits: usize,
) -> Result<RsaPublicKey, EncryptionError> {
    let url = jwks_url(as_url);
    debug!(url = %url, "Fetching encryption JWKS");

    let response = client.get(&url).send().await?;
    let status = response.status();
    let body = response.text().await?;

    let key = select_encryption_key(&read_jwks(&url, status, body)?, key_id, min_key_bits)?;
    Ok(loaded(&url, key))
}

/// Blocking form of [`fetch_encryption_public_key`]
pub fn fetch_encryption_public_key_blocking(
    client: &reqwest::blocking::Client,
    as_url: &str,
    key_id: Option<&str>,
) -> Result<RsaPublicKey, EncryptionError> {
    fetch_encryption_public_key_blocking_with_min_bits(
        client,
        as_url,
        key_id,
        DEFAULT_MIN_RSA_KEY_BITS,
    )
}

/// Blocking form of [`fetch_encryption_public_key_with_min_bits`]
pub fn fetch_encryption_public_key_blocking_with_min_bits(
    client: &reqwest::blocking::Client,
    as_url: &str,
    key_id: Option<&str>,
    min_key_bits: usize,
) -> Result<RsaPublicKey, EncryptionError> {
    let url = jwks_url(as_url);
    debug!(url = %url, "Fetching encryption JWKS");

    let response = client.get(&url).send()?;
    let status = response.status();
    let body = response.text()?;

    let key = select_encryption_key(&read_jwks(&url, status, body)?, key_id, min_key_bits)?;
    Ok(loaded(&url, key))
}

/// Largest plaintext, in bytes, that one RSA-OAEP-SHA256 block can carry
///
/// `k - 2 * hLen - 2` for a `k`-byte modulus: 190 bytes at 2048 bits, 318 at
/// 3072 bits.
pub fn oaep_capacity(public_key: &RsaPublicKey) -> usize {
    public_key.size().saturating_sub(2 * OAEP_HASH_LEN + 2)
}

/// Encrypt a credential map as compact JSON under RSA-OAEP-SHA256
///
/// Returns base64url ciphertext. Output is randomized, so encrypting the
/// same map twice yields different ciphertexts. The serialized plaintext is
/// wiped before returning. A NaN or infinite value fails with
/// [`EncryptionError::Serialization`].
pub fn encrypt_credentials(
    public_key: &RsaPublicKey,
    credentials: &Credentials,
) -> Result<String, EncryptionError> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(credentials).map_err(EncryptionError::Serialization)?,
    );

    let max = oaep_capacity(public_key);
    if plaintext.len() > max {
        return Err(EncryptionError::PlaintextTooLarge {
            size: plaintext.len(),
            max,
        });
    }

    let ciphertext = public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &plaintext)
        .map_err(|err| match err {
            rsa::Error::MessageTooLong => EncryptionError::PlaintextTooLarge {
                size: plaintext.len(),
                max,
            },
            other => EncryptionError::Encryption(other.to_string()),
        })?;

    Ok(base64url::encode(ciphertext))
}

/// Build the provisioning payload for a connection and its credentials
///
/// The payload carries the connection metadata in the clear and the
/// credential values only in encrypted form.
pub fn prepare_connection_payload(
    connection: &Connection,
    credential: &Credential,
    public_key: &RsaPublicKey,
) -> Result<ConnectionPayload, EncryptionError> {
    let encrypted_credentials =
        encrypt_credentials(public_key, credential.values_for_encryption())?;

    Ok(ConnectionPayload {
        name: connection.name.clone(),
        base_url: connection.base_url.clone(),
        timeout_ms: connection.timeout_ms,
        encrypted_credentials,
    })
}
