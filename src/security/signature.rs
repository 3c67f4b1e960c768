//! LINE webhook signature verification
//!
//! LINE signs every webhook delivery with HMAC-SHA256 over the raw request
//! body, keyed by the channel secret, and sends the base64 digest in the
//! `x-line-signature` header. Verification must run against the exact bytes
//! received, before the body is parsed.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Header carrying the request signature
pub const SIGNATURE_HEADER: &str = "x-line-signature";

type HmacSha256 = Hmac<Sha256>;

/// Check a webhook signature against the raw request body
///
/// Returns `false` for an empty signature, a signature that is not valid
/// base64, or a digest mismatch. The digest comparison is constant-time.
#[must_use]
pub fn validate_signature(raw_body: &[u8], secret: &str, provided: &str) -> bool {
    let provided = provided.trim();
    if provided.is_empty() {
        return false;
    }

    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(provided) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}

/// Compute the base64 signature LINE would send for `raw_body`
///
/// Used by the `sign` subcommand to craft local test deliveries.
///
/// # Panics
///
/// Never in practice: HMAC accepts keys of any length.
#[must_use]
pub fn compute_signature(raw_body: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac accepts any key length"));
    mac.update(raw_body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
