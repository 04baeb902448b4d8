//! Fuzz target for credential maps
//!
//! Any credential map that parses must serialize back to JSON that parses
//! to the same map, since that JSON is what gets encrypted.

#![no_main]

use dedalus_auth::{Connection, Credentials};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(credentials) = serde_json::from_slice::<Credentials>(data) {
        let plaintext = serde_json::to_vec(&credentials).expect("credentials serialize");
        let reparsed: Credentials =
            serde_json::from_slice(&plaintext).expect("serialized credentials parse");

        // Debug output must not echo values
        let _ = format!("{:?}", reparsed);
        assert_eq!(reparsed.len(), credentials.len());
    }

    let _ = serde_json::from_slice::<Connection>(data);
});
