//! `X-Hub-Signature-256` verification.
//!
//! GitHub signs each delivery body with HMAC-SHA256 keyed by the webhook
//! secret and sends `sha256=<hex>`. Deliveries that fail verification are
//! rejected before the body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// Decodes a `sha256=<hex>` header value. `None` if malformed.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    hex::decode(header.strip_prefix(PREFIX)?).ok()
}

/// HMAC-SHA256 of `payload` under `secret`.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Renders a signature as a header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{PREFIX}{}", hex::encode(signature))
}

/// Checks a delivery's signature header against its body.
///
/// Comparison is constant-time. Malformed headers verify as `false`.
///
/// ```
/// use cherry_picker::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let body = br#"{"zen":"Keep it logically awesome."}"#;
/// let header = format_signature_header(&compute_signature(body, b"hunter2"));
///
/// assert!(verify_signature(body, &header, b"hunter2"));
/// assert!(!verify_signature(body, &header, b"hunter3"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
