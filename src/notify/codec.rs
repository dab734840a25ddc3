//! Conversions between the base64 text forms used on the wire and the
//! raw key bytes the push APIs take.

use base64::{
    DecodeError, Engine, alphabet,
    engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD},
};

// Accepts non-zero trailing bits in the last symbol, as browsers' atob does
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode a URL-safe base64 key (padding optional) into raw bytes,
/// e.g. the VAPID public key passed as the application server key.
pub fn url_b64_to_bytes(base64_string: &str) -> Result<Vec<u8>, DecodeError> {
    let padding = "=".repeat((4 - base64_string.len() % 4) % 4);
    let base64 = format!("{}{}", base64_string, padding)
        .replace('-', "+")
        .replace('_', "/");
    LENIENT.decode(base64)
}

/// Standard (padded) base64 encoding used for the `p256dh` and `auth`
/// fields sent to the backend.
pub fn encode_key(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Rewrite a key in either base64 alphabet as unpadded URL-safe base64,
/// the form push encryption expects.
pub fn to_url_safe(key: &str) -> String {
    key.trim_end_matches('=')
        .replace('+', "-")
        .replace('/', "_")
}
