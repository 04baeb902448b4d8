//! API key to DPoP-bound token exchange (RFC 8693 grant with a DPoP proof)
//!
//! Each bootstrap generates a fresh P-256 key, proves possession of it to
//! the authorization server's `/token` endpoint and returns a [`DPoPAuth`]
//! holding the bound access token. Caller-supplied clients are only
//! borrowed; an internally built client lives for the duration of the call.

use dedalus_dpop::DPoPSigner;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::AuthError;
use crate::handler::{DPoPAuth, DPOP_HEADER, DPOP_NONCE_HEADER};

/// Production authorization server
pub const DEFAULT_AS_URL: &str = "https://as.dedaluslabs.ai";

const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const API_KEY_TOKEN_TYPE: &str = "urn:dedalus:api-key";
const DISPATCH_SCOPE: &str = "dispatch";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn token_url(as_url: &str) -> Result<String, AuthError> {
    let token_url = format!("{}/token", as_url.trim_end_matches('/'));
    let parsed = Url::parse(&token_url).map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
    if !parsed.has_host() {
        return Err(AuthError::InvalidUrl("missing host".to_string()));
    }
    Ok(token_url)
}

fn exchange_form(api_key: &str) -> [(&'static str, &str); 4] {
    [
        ("grant_type", TOKEN_EXCHANGE_GRANT),
        ("subject_token", api_key),
        ("subject_token_type", API_KEY_TOKEN_TYPE),
        ("scope", DISPATCH_SCOPE),
    ]
}

fn response_nonce(headers: &HeaderMap) -> Option<String> {
    headers
        .get(DPOP_NONCE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

/// Shared tail of the async and blocking exchanges
fn finish_exchange(
    signer: DPoPSigner,
    status: StatusCode,
    nonce: Option<String>,
    body: String,
) -> Result<DPoPAuth, AuthError> {
    if !status.is_success() {
        warn!(status = status.as_u16(), "Token exchange rejected");
        return Err(AuthError::TokenExchange {
            status: status.as_u16(),
            body,
        });
    }

    // serde_json messages can quote offending values, so report position only
    let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
        AuthError::InvalidTokenResponse(format!(
            "{:?} error at line {} column {}",
            e.classify(),
            e.line(),
            e.column()
        ))
    })?;

    info!(
        thumbprint = %signer.thumbprint(),
        has_nonce = nonce.is_some(),
        "Obtained DPoP-bound access token"
    );

    Ok(DPoPAuth::new(signer, token.access_token, nonce))
}

/// Exchange an API key for a DPoP-bound token using a temporary client
pub async fn bootstrap_dpop_auth(api_key: &str, as_url: &str) -> Result<DPoPAuth, AuthError> {
    let client = reqwest::Client::builder().build()?;
    bootstrap_dpop_auth_with_client(&client, api_key, as_url).await
}

/// Exchange an API key for a DPoP-bound token using the caller's client
pub async fn bootstrap_dpop_auth_with_client(
    client: &reqwest::Client,
    api_key: &str,
    as_url: &str,
) -> Result<DPoPAuth, AuthError> {
    let signer = DPoPSigner::generate();
    let token_url = token_url(as_url)?;
    let proof = signer.sign_proof("POST", &token_url, None, None)?;

    debug!(
        token_url = %token_url,
        thumbprint = %signer.thumbprint(),
        "Exchanging API key for DPoP-bound token"
    );

    let response = client
        .post(&token_url)
        .header(DPOP_HEADER, proof)
        .form(&exchange_form(api_key))
        .send()
        .await?;

    let status = response.status();
    let nonce = response_nonce(response.headers());
    let body = response.text().await?;

    finish_exchange(signer, status, nonce, body)
}

/// Blocking form of [`bootstrap_dpop_auth`]
///
/// Must not be called from within an async runtime.
pub fn bootstrap_dpop_auth_blocking(api_key: &str, as_url: &str) -> Result<DPoPAuth, AuthError> {
    let client = reqwest::blocking::Client::builder().build()?;
    bootstrap_dpop_auth_blocking_with_client(&client, api_key, as_url)
}

/// Blocking form of [`bootstrap_dpop_auth_with_client`]
pub fn bootstrap_dpop_auth_blocking_with_client(
    client: &reqwest::blocking::Client,
    api_key: &str,
    as_url: &str,
) -> Result<DPoPAuth, AuthError> {
    let signer = DPoPSigner::generate();
    let token_url = token_url(as_url)?;
    let proof = signer.sign_proof("POST", &token_url, None, None)?;

    debug!(
        token_url = %token_url,
        thumbprint = %signer.thumbprint(),
        "Exchanging API key for DPoP-bound token"
    );

    let response = client
        .post(&token_url)
        .header(DPOP_HEADER, proof)
        .form(&exchange_form(api_key))
        .send()?;

    let status = response.status();
    let nonce = response_nonce(response.headers());
    let body = response.text()?;

    finish_exchange(signer, status, nonce, body)
}
