//! Stateless signing and digest helpers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use courier_core::notify::error::NotifyError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// # Summary
/// Computes `base64(HMAC-SHA256(secret, data))`.
///
/// # Returns
/// * The standard (padded) base64 encoding of the MAC.
/// * `NotifyError::Param` if the key is rejected by the MAC implementation.
pub fn hmac_sha256_base64(secret: &str, data: &str) -> Result<String, NotifyError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| NotifyError::Param(format!("invalid signing key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// # Summary
/// Signs a DingTalk webhook request.
///
/// # Logic
/// 1. Builds `"<timestamp>\n<secret>"`.
/// 2. Returns its HMAC-SHA256 keyed by `secret`, base64 encoded.
///
/// The result is not URL-escaped; query encoding happens when the URL is built.
pub fn dingtalk_sign(timestamp_ms: i64, secret: &str) -> Result<String, NotifyError> {
    hmac_sha256_base64(secret, &format!("{}\n{}", timestamp_ms, secret))
}

/// Lowercase hex MD5 digest.
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}
