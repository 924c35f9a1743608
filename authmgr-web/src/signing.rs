/// Auth Manager - HMAC-SHA3-256 signing helpers.
///
/// CSRF tokens, flash cookies and session cookies all use the
/// `value.signature` format produced here, with a hex signature.
use base64::Engine;
use hkdf::hmac::{Hmac, Mac};
use sha3::Sha3_256;

/// Type alias for HMAC-SHA3-256.
type HmacSha3 = Hmac<Sha3_256>;

/// Hex HMAC-SHA3-256 of `data`.
pub fn sign(secret_key: &[u8], data: &[u8]) -> String {
    // SAFETY: HMAC accepts any key size per RFC 2104
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha3::new_from_slice(secret_key).expect("HMAC can take key of any size");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Append a signature: `value.signature`.
pub fn sign_value(secret_key: &[u8], value: &str) -> String {
    format!("{}.{}", value, sign(secret_key, value.as_bytes()))
}

/// Return the value part of a `value.signature` string if the signature is valid.
pub fn verify_signed<'a>(secret_key: &[u8], signed: &'a str) -> Option<&'a str> {
    let (value, signature) = signed.rsplit_once('.')?;
    let expected = sign(secret_key, value.as_bytes());
    constant_time_compare(signature, &expected).then_some(value)
}

/// Constant-time string comparison to prevent timing attacks.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// URL-safe base64 without padding.
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

pub fn base64_decode(encoded: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(encoded)
        .ok()
}
