//! JSON Web Key (JWK) types for DPoP and credential encryption

use p256::ecdsa::VerifyingKey;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::base64url;
use crate::error::{DPoPError, JwkError};

/// Coordinate length for P-256 (32 bytes)
pub const P256_COORDINATE_LEN: usize = 32;

/// Default minimum RSA modulus size accepted from a JWKS endpoint
pub const DEFAULT_MIN_RSA_KEY_BITS: usize = 2048;

/// Largest RSA modulus we are willing to import
const MAX_RSA_KEY_BITS: usize = 16384;

/// EC public key in JWK format (P-256/ES256)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcPublicJwk {
    /// Key type (always "EC")
    pub kty: String,
    /// Curve name (always "P-256" for ES256)
    pub crv: String,
    /// X coordinate (base64url-encoded)
    pub x: String,
    /// Y coordinate (base64url-encoded)
    pub y: String,
}

impl EcPublicJwk {
    /// Create a new EC public JWK for P-256
    pub fn new(x: String, y: String) -> Self {
        Self {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x,
            y,
        }
    }

    /// Marshal a P-256 verifying key as a JWK
    ///
    /// Coordinates are big-endian and always [`P256_COORDINATE_LEN`] bytes
    /// wide before encoding.
    pub fn from_verifying_key(verifying_key: &VerifyingKey) -> Self {
        let point = verifying_key.to_encoded_point(false);
        // Uncompressed SEC1 points always carry both coordinates
        let x = point.x().map(base64url::encode).unwrap_or_default();
        let y = point.y().map(base64url::encode).unwrap_or_default();
        Self::new(x, y)
    }

    /// Rebuild the verifying key described by this JWK
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, DPoPError> {
        if self.kty != "EC" || self.crv != "P-256" {
            return Err(DPoPError::InvalidKey);
        }

        let x = base64url::decode(&self.x)?;
        let y = base64url::decode(&self.y)?;
        if x.len() != P256_COORDINATE_LEN || y.len() != P256_COORDINATE_LEN {
            return Err(DPoPError::InvalidKey);
        }

        let mut sec1 = Vec::with_capacity(1 + 2 * P256_COORDINATE_LEN);
        sec1.push(0x04);
        sec1.extend_from_slice(&x);
        sec1.extend_from_slice(&y);

        VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| DPoPError::InvalidKey)
    }
}

/// A single entry of a JWK Set, as served by an untrusted endpoint
///
/// Every member is optional so that unknown key types still parse and can be
/// skipped while scanning a key set. A member that is not a string reads as
/// absent instead of failing the whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA", "EC", ...)
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kty: Option<String>,
    /// Intended use ("enc" or "sig")
    #[serde(
        rename = "use",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub key_use: Option<String>,
    /// Key ID
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kid: Option<String>,
    /// Algorithm hint
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub alg: Option<String>,
    /// RSA modulus (base64url big-endian)
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub n: Option<String>,
    /// RSA public exponent (base64url big-endian)
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub e: Option<String>,
    /// EC curve
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub crv: Option<String>,
    /// EC x coordinate
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub x: Option<String>,
    /// EC y coordinate
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub y: Option<String>,
}

impl Jwk {
    /// Whether this entry is an RSA key published for encryption
    pub fn is_rsa_encryption_key(&self) -> bool {
        self.kty.as_deref() == Some("RSA") && self.key_use.as_deref() == Some("enc")
    }
}

/// JSON Web Key Set (RFC 7517 §5)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// Keys in the set; an absent or null member is treated as empty
    #[serde(default, deserialize_with = "lenient_keys")]
    pub keys: Vec<Jwk>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(Some(value)),
        _ => Ok(None),
    }
}

// Entries that are not objects become empty keys, which no lookup matches
fn lenient_keys<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Jwk>, D::Error> {
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).unwrap_or_default())
        .collect())
}

/// Convert an RSA JWK into a public key, enforcing a minimum modulus size
///
/// The size check runs on the decoded modulus before the key is built, so a
/// short or zero modulus is reported as [`JwkError::WeakKey`] rather than
/// silently producing a breakable key.
pub fn jwk_to_rsa_public_key(jwk: &Jwk, min_key_size: usize) -> Result<RsaPublicKey, JwkError> {
    let kty = jwk.kty.as_deref().unwrap_or_default();
    if kty != "RSA" {
        return Err(JwkError::InvalidKeyType(kty.to_string()));
    }

    let n = jwk.n.as_deref().ok_or(JwkError::MissingField("n"))?;
    let e = jwk.e.as_deref().ok_or(JwkError::MissingField("e"))?;

    let n = base64url::decode(n).map_err(|_| JwkError::InvalidBase64("n"))?;
    let e = base64url::decode(e).map_err(|_| JwkError::InvalidBase64("e"))?;

    let n = BigUint::from_bytes_be(&n);
    let e = BigUint::from_bytes_be(&e);

    let bits = n.bits();
    if bits < min_key_size {
        return Err(JwkError::WeakKey {
            bits,
            min_bits: min_key_size,
        });
    }

    RsaPublicKey::new_with_max_size(n, e, MAX_RSA_KEY_BITS)
        .map_err(|err| JwkError::InvalidKey(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::SigningKey;
    use p256::elliptic_curve::rand_core::OsRng;
    use rsa::traits::PublicKeyParts;

    /// Modulus of exactly `bits` bits: top bit set, odd.
    fn synthetic_modulus(bits: usize) -> Vec<u8> {
        let mut n = vec![0u8; bits / 8];
        n[0] = 0x80;
        let last = n.len() - 1;
        n[last] |= 0x01;
        n
    }

    fn rsa_jwk(bits: usize) -> Jwk {
        Jwk {
            kty: Some("RSA".to_string()),
            key_use: Some("enc".to_string()),
            n: Some(base64url::encode(synthetic_modulus(bits))),
            e: Some(base64url::encode([0x01, 0x00, 0x01])),
            ..Jwk::default()
        }
    }

    #[test]
    fn test_ec_jwk_coordinates_are_fixed_width() {
        let signing_key = SigningKey::random(&mut OsRng);
        let jwk = EcPublicJwk::from_verifying_key(signing_key.verifying_key());

        assert_eq!(jwk.kty, "EC");
        assert_eq!(jwk.crv, "P-256");
        assert_eq!(base64url::decode(&jwk.x).unwrap().len(), P256_COORDINATE_LEN);
        assert_eq!(base64url::decode(&jwk.y).unwrap().len(), P256_COORDINATE_LEN);
    }

    #[test]
    fn test_ec_jwk_roundtrips_to_verifying_key() {
        let signing_key = SigningKey::random(&mut OsRng);
        let jwk = EcPublicJwk::from_verifying_key(signing_key.verifying_key());

        assert_eq!(&jwk.to_verifying_key().unwrap(), signing_key.verifying_key());
    }

    #[test]
    fn test_ec_jwk_rejects_short_coordinate() {
        let signing_key = SigningKey::random(&mut OsRng);
        let mut jwk = EcPublicJwk::from_verifying_key(signing_key.verifying_key());
        jwk.x = base64url::encode([0u8; 31]);

        assert!(matches!(jwk.to_verifying_key(), Err(DPoPError::InvalidKey)));
    }

    #[test]
    fn test_1024_bit_key_rejected() {
        let result = jwk_to_rsa_public_key(&rsa_jwk(1024), DEFAULT_MIN_RSA_KEY_BITS);

        assert_eq!(
            result.unwrap_err(),
            JwkError::WeakKey {
                bits: 1024,
                min_bits: 2048
            }
        );
    }

    #[test]
    fn test_2048_and_3072_bit_keys_accepted() {
        for bits in [2048, 3072] {
            let key = jwk_to_rsa_public_key(&rsa_jwk(bits), DEFAULT_MIN_RSA_KEY_BITS).unwrap();
            assert_eq!(key.size() * 8, bits);
        }
    }

    #[test]
    fn test_custom_minimum_is_enforced() {
        let result = jwk_to_rsa_public_key(&rsa_jwk(2048), 3072);
        assert!(matches!(result, Err(JwkError::WeakKey { bits: 2048, .. })));
    }

    #[test]
    fn test_zero_modulus_rejected() {
        let mut jwk = rsa_jwk(2048);
        jwk.n = Some(base64url::encode([0u8; 256]));

        let result = jwk_to_rsa_public_key(&jwk, DEFAULT_MIN_RSA_KEY_BITS);
        assert!(matches!(result, Err(JwkError::WeakKey { bits: 0, .. })));
    }

    #[test]
    fn test_garbage_modulus_rejected() {
        let mut jwk = rsa_jwk(2048);
        jwk.n = Some("!!not-a-modulus!!".to_string());

        let result = jwk_to_rsa_public_key(&jwk, DEFAULT_MIN_RSA_KEY_BITS);
        assert_eq!(result.unwrap_err(), JwkError::InvalidBase64("n"));
    }

    #[test]
    fn test_non_rsa_key_rejected() {
        let jwk = Jwk {
            kty: Some("EC".to_string()),
            crv: Some("P-256".to_string()),
            ..Jwk::default()
        };

        assert_eq!(
            jwk_to_rsa_public_key(&jwk, DEFAULT_MIN_RSA_KEY_BITS).unwrap_err(),
            JwkError::InvalidKeyType("EC".to_string())
        );
    }

    #[test]
    fn test_missing_members_rejected() {
        let mut missing_n = rsa_jwk(2048);
        missing_n.n = None;
        assert_eq!(
            jwk_to_rsa_public_key(&missing_n, DEFAULT_MIN_RSA_KEY_BITS).unwrap_err(),
            JwkError::MissingField("n")
        );

        let mut missing_e = rsa_jwk(2048);
        missing_e.e = None;
        assert_eq!(
            jwk_to_rsa_public_key(&missing_e, DEFAULT_MIN_RSA_KEY_BITS).unwrap_err(),
            JwkError::MissingField("e")
        );
    }

    #[test]
    fn test_parse_jwks_with_mixed_keys() {
        let jwks_json = r#"{"keys":[
            {"kty":"EC","crv":"P-256","x":"MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4","y":"4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM","use":"sig","kid":"1"},
            {"kty":"RSA","n":"0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw","e":"AQAB","alg":"RSA-OAEP-256","use":"enc","kid":"2011-04-29"}
        ]}"#;

        let jwks: Jwks = serde_json::from_str(jwks_json).unwrap();

        assert_eq!(jwks.keys.len(), 2);
        assert!(!jwks.keys[0].is_rsa_encryption_key());
        assert!(jwks.keys[1].is_rsa_encryption_key());
        assert_eq!(jwks.keys[1].kid.as_deref(), Some("2011-04-29"));

        let key = jwk_to_rsa_public_key(&jwks.keys[1], DEFAULT_MIN_RSA_KEY_BITS).unwrap();
        assert_eq!(key.size(), 256);
    }

    #[test]
    fn test_missing_keys_member_is_empty() {
        let jwks: Jwks = serde_json::from_str("{}").unwrap();
        assert!(jwks.keys.is_empty());

        let jwks: Jwks = serde_json::from_str(r#"{"keys":null}"#).unwrap();
        assert!(jwks.keys.is_empty());
    }

    #[test]
    fn test_non_string_members_do_not_fail_the_set() {
        let jwks_json = r#"{"keys":[
            {"kty":"RSA","use":"enc","kid":7,"n":"AQAB","e":"AQAB"},
            42,
            {"kty":"RSA","use":"enc","kid":"good","n":"AQAB","e":"AQAB","x5c":["abc"]}
        ]}"#;

        let jwks: Jwks = serde_json::from_str(jwks_json).unwrap();

        assert_eq!(jwks.keys.len(), 3);
        assert!(jwks.keys[0].is_rsa_encryption_key());
        assert_eq!(jwks.keys[0].kid, None);
        assert_eq!(jwks.keys[1], Jwk::default());
        assert_eq!(jwks.keys[2].kid.as_deref(), Some("good"));
    }
}
