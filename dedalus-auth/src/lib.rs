//! # dedalus-auth
//!
//! Authentication core of the Dedalus SDK:
//!
//! - **Request authentication**: [`BearerAuth`] and [`DPoPAuth`] attach
//!   credentials to outgoing `reqwest` requests. DPoP mints a fresh proof
//!   per request, bound to the access token and the current server nonce.
//! - **Token exchange**: [`bootstrap_dpop_auth`] trades an API key for a
//!   DPoP-bound access token, in async and blocking forms.
//! - **Credential encryption**: [`fetch_encryption_public_key`] and
//!   [`encrypt_credentials`] seal third-party credentials with RSA-OAEP so
//!   only the authorization server can read them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dedalus_auth::{bootstrap_dpop_auth, RequestAuth, DEFAULT_AS_URL};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let auth = bootstrap_dpop_auth("sk-...", DEFAULT_AS_URL).await?;
//!
//! let client = reqwest::Client::new();
//! let mut request = client.get("https://api.dedaluslabs.ai/v1/models").build()?;
//! auth.apply(&mut request)?;
//!
//! let response = client.execute(request).await?;
//! if auth.update_nonce_from_headers(response.headers()) {
//!     // Server asked for a nonce; the next proof carries it
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Logging goes through `tracing`. Tokens, API keys and credential values
//! are never logged or rendered in errors.

mod bootstrap;
mod config;
mod credentials;
mod encryption;
mod error;
mod handler;

pub use bootstrap::{
    bootstrap_dpop_auth, bootstrap_dpop_auth_blocking, bootstrap_dpop_auth_blocking_with_client,
    bootstrap_dpop_auth_with_client, DEFAULT_AS_URL,
};
pub use config::{AuthConfig, ConfigError, API_KEY_ENV, AS_URL_ENV};
pub use credentials::{
    Connection, Credential, CredentialValue, Credentials, DEFAULT_CONNECTION_TIMEOUT_MS,
};
pub use encryption::{
    encrypt_credentials, fetch_encryption_public_key, fetch_encryption_public_key_blocking,
    fetch_encryption_public_key_blocking_with_min_bits, fetch_encryption_public_key_with_min_bits,
    oaep_capacity, prepare_connection_payload, ConnectionPayload,
};
pub use error::{AuthError, EncryptionError};
pub use handler::{
    AuthStrategy, BearerAuth, DPoPAuth, RequestAuth, DPOP_HEADER, DPOP_NONCE_HEADER,
};

pub use dedalus_dpop;
