//! Request authentication handlers
//!
//! A handler mutates one outgoing request at a time by attaching credential
//! headers. [`BearerAuth`] sends a plain bearer token; [`DPoPAuth`] sends a
//! sender-constrained token together with a fresh DPoP proof per request.
//!
//! Handlers never retry. When a resource server answers with a
//! `use_dpop_nonce` challenge, the caller feeds the response headers to
//! [`DPoPAuth::update_nonce_from_headers`] and resends.

use std::fmt;

use dedalus_dpop::DPoPSigner;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Url};

use crate::error::AuthError;

/// Request header carrying the DPoP proof
pub const DPOP_HEADER: &str = "dpop";

/// Response header carrying a server-issued DPoP nonce
pub const DPOP_NONCE_HEADER: &str = "dpop-nonce";

/// Capability shared by all authentication strategies
pub trait RequestAuth: Send + Sync {
    /// Attach credentials for a request with the given method and URL
    fn authorize(&self, method: &Method, url: &Url, headers: &mut HeaderMap)
        -> Result<(), AuthError>;

    /// Authorize an async `reqwest` request in place
    fn apply(&self, request: &mut reqwest::Request) -> Result<(), AuthError> {
        let method = request.method().clone();
        let url = request.url().clone();
        self.authorize(&method, &url, request.headers_mut())
    }

    /// Authorize a blocking `reqwest` request in place
    fn apply_blocking(&self, request: &mut reqwest::blocking::Request) -> Result<(), AuthError> {
        let method = request.method().clone();
        let url = request.url().clone();
        self.authorize(&method, &url, request.headers_mut())
    }
}

fn sensitive_value(name: &'static str, value: &str) -> Result<HeaderValue, AuthError> {
    let mut value = HeaderValue::from_str(value).map_err(|_| AuthError::InvalidHeader(name))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Plain `Authorization: Bearer <token>` authentication
pub struct BearerAuth {
    access_token: RwLock<String>,
}

impl BearerAuth {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: RwLock::new(access_token.into()),
        }
    }

    pub fn set_access_token(&self, access_token: impl Into<String>) {
        *self.access_token.write() = access_token.into();
    }
}

impl RequestAuth for BearerAuth {
    fn authorize(
        &self,
        _method: &Method,
        _url: &Url,
        headers: &mut HeaderMap,
    ) -> Result<(), AuthError> {
        let value = format!("Bearer {}", self.access_token.read());
        headers.insert(AUTHORIZATION, sensitive_value("Authorization", &value)?);
        Ok(())
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Token and nonce, always read and replaced together
#[derive(Clone)]
struct TokenState {
    access_token: String,
    nonce: Option<String>,
}

/// DPoP-bound token authentication (RFC 9449)
///
/// Every request gets `Authorization: DPoP <token>` and a `DPoP` header with
/// a proof bound to the request method, URL, token and current nonce. The
/// signing key is owned by the handler and never leaves it.
pub struct DPoPAuth {
    signer: DPoPSigner,
    state: RwLock<TokenState>,
}

impl DPoPAuth {
    pub fn new(signer: DPoPSigner, access_token: impl Into<String>, nonce: Option<String>) -> Self {
        Self {
            signer,
            state: RwLock::new(TokenState {
                access_token: access_token.into(),
                nonce,
            }),
        }
    }

    /// JWK thumbprint of the key the token is bound to (`cnf.jkt`)
    pub fn thumbprint(&self) -> &str {
        self.signer.thumbprint()
    }

    /// Current server nonce, if any
    pub fn nonce(&self) -> Option<String> {
        self.state.read().nonce.clone()
    }

    pub fn set_nonce(&self, nonce: impl Into<String>) {
        self.state.write().nonce = Some(nonce.into());
    }

    pub fn clear_nonce(&self) {
        self.state.write().nonce = None;
    }

    pub fn set_access_token(&self, access_token: impl Into<String>) {
        self.state.write().access_token = access_token.into();
    }

    /// Replace token and nonce in one step, e.g. after a refresh
    pub fn replace_tokens(&self, access_token: impl Into<String>, nonce: Option<String>) {
        *self.state.write() = TokenState {
            access_token: access_token.into(),
            nonce,
        };
    }

    /// Adopt the `DPoP-Nonce` of a challenge response
    ///
    /// Returns `false` and keeps the current nonce if the header is absent
    /// or not valid ASCII.
    pub fn update_nonce_from_headers(&self, headers: &HeaderMap) -> bool {
        match headers
            .get(DPOP_NONCE_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            Some(nonce) => {
                self.set_nonce(nonce);
                true
            }
            None => false,
        }
    }
}

impl RequestAuth for DPoPAuth {
    fn authorize(
        &self,
        method: &Method,
        url: &Url,
        headers: &mut HeaderMap,
    ) -> Result<(), AuthError> {
        // Single snapshot so the proof's ath and nonce match the token sent
        let TokenState {
            access_token,
            nonce,
        } = self.state.read().clone();

        let proof = self.signer.sign_proof(
            method.as_str(),
            url.as_str(),
            Some(&access_token),
            nonce.as_deref(),
        )?;

        let authorization = format!("DPoP {}", access_token);
        headers.insert(
            AUTHORIZATION,
            sensitive_value("Authorization", &authorization)?,
        );
        headers.insert(DPOP_HEADER, sensitive_value("DPoP", &proof)?);
        Ok(())
    }
}

impl fmt::Debug for DPoPAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DPoPAuth")
            .field("thumbprint", &self.signer.thumbprint())
            .field("access_token", &"[REDACTED]")
            .field("has_nonce", &self.state.read().nonce.is_some())
            .finish()
    }
}

/// The closed set of strategies a client can be configured with
#[derive(Debug)]
pub enum AuthStrategy {
    Bearer(BearerAuth),
    DPoP(DPoPAuth),
}

impl RequestAuth for AuthStrategy {
    fn authorize(
        &self,
        method: &Method,
        url: &Url,
        headers: &mut HeaderMap,
    ) -> Result<(), AuthError> {
        match self {
            AuthStrategy::Bearer(auth) => auth.authorize(method, url, headers),
            AuthStrategy::DPoP(auth) => auth.authorize(method, url, headers),
        }
    }
}

impl From<BearerAuth> for AuthStrategy {
    fn from(auth: BearerAuth) -> Self {
        AuthStrategy::Bearer(auth)
    }
}

impl From<DPoPAuth> for AuthStrategy {
    fn from(auth: DPoPAuth) -> Self {
        AuthStrategy::DPoP(auth)
    }
}
