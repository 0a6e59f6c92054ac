//! Utility functions for transcoding binary payloads between the provider's
//! wire format and platform authenticator buffers.

use std::fmt;

use data_encoding::{Specification, BASE64, BASE64URL, BASE64URL_NOPAD, BASE64_NOPAD};

/// Convert bytes to base64 without padding
pub fn base64(data: &[u8]) -> String {
    BASE64_NOPAD.encode(data)
}

/// Convert bytes to base64url without padding
pub fn base64url(data: &[u8]) -> String {
    BASE64URL_NOPAD.encode(data)
}

/// Try parsing from base64 with or without padding
pub(crate) fn try_from_base64(input: &str) -> Option<Vec<u8>> {
    let padding = BASE64.specification().padding.unwrap();
    let sane_string = input.trim_end_matches(padding);
    BASE64_NOPAD.decode(sane_string.as_bytes()).ok()
}

/// Try parsing from base64url with or without padding
pub fn try_from_base64url(input: &str) -> Option<Vec<u8>> {
    let specs = BASE64URL.specification();
    let padding = specs.padding.unwrap();
    let specs = Specification {
        check_trailing_bits: false,
        padding: None,
        ..specs
    };
    let encoding = specs.encoding().unwrap();
    let sane_string = input.trim_end_matches(padding);
    encoding.decode(sane_string.as_bytes()).ok()
}

/// Decode text in either the url-safe or the standard base64 alphabet, padded
/// or not. The url-safe form is tried first as that is what the provider
/// emits; the standard alphabet covers payloads which predate its rollout.
pub fn decode(input: &str) -> Result<Vec<u8>, CodecError> {
    try_from_base64url(input)
        .or_else(|| try_from_base64(input))
        .ok_or(CodecError)
}

/// The given text is neither `base64url` nor `base64` encoded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecError;

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input is neither base64url nor base64 encoded")
    }
}

impl std::error::Error for CodecError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_base64url() {
        let cases: &[&[u8]] = &[
            b"",
            b"f",
            b"fo",
            b"foo",
            b"foob",
            b"\x00\xff\xfe\x01",
            b"mock-challenge-for-webauthn",
        ];
        for bytes in cases {
            let encoded = base64url(bytes);
            assert_eq!(decode(&encoded).unwrap(), *bytes);
        }
    }

    #[test]
    fn accepts_standard_alphabet_and_padding() {
        // "e\xc3\xd4\xa1\xbfpK\xbd\x984y\x11>qr\xa4" in both alphabets
        let url_safe = "ZcPUob9wS72YNHkRPnFypA";
        let padded_standard = "ZcPUob9wS72YNHkRPnFypA==";
        assert_eq!(
            decode(url_safe).unwrap(),
            decode(padded_standard).unwrap()
        );

        let with_plus_slash = "+/+/";
        assert_eq!(decode(with_plus_slash).unwrap(), vec![0xfb, 0xff, 0xbf]);
    }

    #[test]
    fn rejects_foreign_characters() {
        assert_eq!(decode("not base64!"), Err(CodecError));
        assert_eq!(decode("abc%"), Err(CodecError));
        assert_eq!(decode("über"), Err(CodecError));
    }

    #[test]
    fn rejects_unreachable_lengths() {
        // A single trailing symbol can never complete a 4-aligned block.
        assert_eq!(decode("abcde"), Err(CodecError));
        assert_eq!(decode("a"), Err(CodecError));
    }
}
