//! # dedalus-dpop
//!
//! Client-side building blocks for OAuth 2.0 DPoP (Demonstrating Proof of
//! Possession, [RFC 9449](https://datatracker.ietf.org/doc/html/rfc9449)):
//!
//! - ES256 proof generation with `ath` and `nonce` binding
//! - JWK thumbprints ([RFC 7638](https://datatracker.ietf.org/doc/html/rfc7638))
//! - RSA public key import from JWKS entries with a minimum strength check
//! - A padding-free base64url codec shared by all JOSE material
//!
//! ## Quick Start
//!
//! ```rust
//! use dedalus_dpop::{DPoPError, DPoPSigner};
//!
//! // Ephemeral P-256 keypair, held only in memory
//! let signer = DPoPSigner::generate();
//! println!("Thumbprint: {}", signer.thumbprint());
//!
//! // Proof for a token request
//! let proof = signer.sign_proof("POST", "https://as.example.com/token", None, None)?;
//!
//! // Proof for a resource request, bound to the access token
//! let proof = signer.sign_proof(
//!     "GET",
//!     "https://api.example.com/v1/models",
//!     Some("access-token"),
//!     Some("server-nonce"),
//! )?;
//! # Ok::<(), DPoPError>(())
//! ```
//!
//! Only ES256 (ECDSA P-256 with SHA-256) is supported for proofs.

pub mod base64url;
mod error;
mod jwk;
mod proof;
mod signer;
mod thumbprint;

pub use error::{Base64UrlError, DPoPError, JwkError};
pub use jwk::{
    jwk_to_rsa_public_key, EcPublicJwk, Jwk, Jwks, DEFAULT_MIN_RSA_KEY_BITS, P256_COORDINATE_LEN,
};
pub use proof::{
    compute_ath, decode_proof_claims, extract_jwk_from_proof, generate_proof, normalize_htu,
    DPoPClaims, DPOP_ALGORITHM, DPOP_JWT_TYPE,
};
pub use signer::DPoPSigner;
pub use thumbprint::{compute_thumbprint, compute_thumbprint_from_jwk};

// Re-exported so callers name the same key types this crate uses
pub use p256;
pub use rsa;
