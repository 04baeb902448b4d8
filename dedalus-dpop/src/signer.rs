//! Holder of the ephemeral DPoP signing key

use std::fmt;

use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::rand_core::OsRng;

use crate::error::DPoPError;
use crate::jwk::EcPublicJwk;
use crate::proof::generate_proof;
use crate::thumbprint::compute_thumbprint;

/// Software signer owning a P-256 keypair that lives only in memory
///
/// The key is never exported or persisted; it is dropped together with the
/// signer. The thumbprint is computed once at construction.
pub struct DPoPSigner {
    signing_key: SigningKey,
    thumbprint: String,
}

impl DPoPSigner {
    /// Create a new signer with a freshly generated P-256 key
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Create a signer from an existing signing key
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let thumbprint = compute_thumbprint(signing_key.verifying_key());
        Self {
            signing_key,
            thumbprint,
        }
    }

    /// JWK thumbprint (RFC 7638) of the public key
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    /// Public key in JWK form
    pub fn public_key_jwk(&self) -> EcPublicJwk {
        EcPublicJwk::from_verifying_key(self.signing_key.verifying_key())
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Mint a DPoP proof for one request
    pub fn sign_proof(
        &self,
        method: &str,
        url: &str,
        access_token: Option<&str>,
        nonce: Option<&str>,
    ) -> Result<String, DPoPError> {
        generate_proof(&self.signing_key, method, url, access_token, nonce)
    }
}

impl fmt::Debug for DPoPSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DPoPSigner")
            .field("thumbprint", &self.thumbprint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::{decode_proof_claims, extract_jwk_from_proof};
    use crate::thumbprint::compute_thumbprint_from_jwk;
    use std::sync::Arc;

    #[test]
    fn test_generate_signer() {
        let signer = DPoPSigner::generate();

        assert_eq!(signer.thumbprint().len(), 43);
    }

    #[test]
    fn test_thumbprint_matches_public_jwk() {
        let signer = DPoPSigner::generate();

        assert_eq!(
            compute_thumbprint_from_jwk(&signer.public_key_jwk()),
            signer.thumbprint()
        );
    }

    #[test]
    fn test_from_signing_key_keeps_identity() {
        let signing_key = SigningKey::random(&mut OsRng);
        let expected = compute_thumbprint(signing_key.verifying_key());

        let signer = DPoPSigner::from_signing_key(signing_key);
        assert_eq!(signer.thumbprint(), expected);
    }

    #[test]
    fn test_signer_generates_bound_proofs() {
        let signer = DPoPSigner::generate();

        let proof = signer
            .sign_proof("get", "https://api.example.com/v1/models", Some("tok"), None)
            .unwrap();

        assert_eq!(proof.split('.').count(), 3);
        assert_eq!(extract_jwk_from_proof(&proof).unwrap(), signer.public_key_jwk());

        let claims = decode_proof_claims(&proof).unwrap();
        assert_eq!(claims.htm, "GET");
        assert!(claims.ath.is_some());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let signer = DPoPSigner::generate();
        let secret = crate::base64url::encode(signer.signing_key.to_bytes());

        let debug = format!("{:?}", signer);
        assert!(debug.contains(signer.thumbprint()));
        assert!(!debug.contains(&secret));
    }

    #[test]
    fn test_signer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DPoPSigner>();

        let signer = Arc::new(DPoPSigner::generate());
        assert_eq!(signer.thumbprint().len(), 43);
    }
}
