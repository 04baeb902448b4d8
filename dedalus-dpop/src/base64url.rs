//! Padding-free base64url codec used for all JOSE material.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::Base64UrlError;

/// Encode bytes as base64url without `=` padding.
pub fn encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode a base64url string.
///
/// Both padded and unpadded input are accepted: trailing `=` characters are
/// dropped before decoding, which is equivalent to re-padding the input to a
/// multiple of four characters.
pub fn decode(input: &str) -> Result<Vec<u8>, Base64UrlError> {
    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|_| Base64UrlError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let inputs: [&[u8]; 6] = [
            b"",
            b"f",
            b"fo",
            b"foo",
            b"\x00\xff\xfe\xfd",
            &[0xfb; 64],
        ];

        for input in inputs {
            assert_eq!(decode(&encode(input)).unwrap(), input);
        }
    }

    #[test]
    fn test_no_padding_or_standard_alphabet() {
        // 0xfb 0xff produces '+' and '/' in the standard alphabet
        let encoded = encode([0xfb, 0xff, 0xbf, 0x01]);

        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn test_accepts_padded_input() {
        assert_eq!(decode("Zm8=").unwrap(), b"fo");
        assert_eq!(decode("Zg==").unwrap(), b"f");
        assert_eq!(decode("Zm8").unwrap(), b"fo");
    }

    #[test]
    fn test_invalid_input_fails() {
        assert!(decode("not base64!").is_err());
        assert!(decode("A").is_err());
    }
}
