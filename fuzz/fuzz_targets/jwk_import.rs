//! Fuzz target for JWKS parsing and key import
//!
//! JWKS documents come from the network; parsing and key validation must
//! reject garbage without panicking, and never accept a weak RSA key.

#![no_main]

use dedalus_dpop::rsa::traits::PublicKeyParts;
use dedalus_dpop::{jwk_to_rsa_public_key, EcPublicJwk, Jwks, DEFAULT_MIN_RSA_KEY_BITS};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(jwks) = serde_json::from_slice::<Jwks>(data) else {
        return;
    };

    for jwk in jwks.keys.iter().take(16) {
        if let Ok(key) = jwk_to_rsa_public_key(jwk, DEFAULT_MIN_RSA_KEY_BITS) {
            assert!(key.n().bits() >= DEFAULT_MIN_RSA_KEY_BITS);
        }

        if let (Some(x), Some(y)) = (&jwk.x, &jwk.y) {
            let _ = EcPublicJwk::new(x.clone(), y.clone()).to_verifying_key();
        }
    }
});
