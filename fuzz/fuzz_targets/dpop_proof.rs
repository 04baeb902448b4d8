//! Fuzz target for DPoP proof handling
//!
//! Proof decoding must never panic on hostile input, and any proof we mint
//! must decode back to the claims it was minted with.

#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use dedalus_dpop::p256::ecdsa::SigningKey;
use dedalus_dpop::{
    base64url, compute_ath, decode_proof_claims, extract_jwk_from_proof, generate_proof,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzProofInput {
    /// Untrusted proof text
    proof: String,
    method: String,
    url: String,
    access_token: Option<String>,
    nonce: Option<String>,
}

fn signing_key() -> &'static SigningKey {
    static KEY: OnceLock<SigningKey> = OnceLock::new();
    KEY.get_or_init(|| SigningKey::from_slice(&[0x11; 32]).expect("valid scalar"))
}

fuzz_target!(|input: FuzzProofInput| {
    if input.proof.len() > 8192 {
        return;
    }

    let _ = base64url::decode(&input.proof);
    let _ = extract_jwk_from_proof(&input.proof);
    let _ = decode_proof_claims(&input.proof);

    let Ok(proof) = generate_proof(
        signing_key(),
        &input.method,
        &input.url,
        input.access_token.as_deref(),
        input.nonce.as_deref(),
    ) else {
        return;
    };

    let claims = decode_proof_claims(&proof).expect("minted proof decodes");
    assert_eq!(claims.htm, input.method.to_ascii_uppercase());
    assert_eq!(claims.nonce, input.nonce);
    assert_eq!(claims.ath, input.access_token.as_deref().map(compute_ath));
    assert!(!claims.htu.contains('?') && !claims.htu.contains('#'));

    let jwk = extract_jwk_from_proof(&proof).expect("minted proof has a JWK");
    assert_eq!(&jwk.to_verifying_key().expect("valid key"), signing_key().verifying_key());
});
