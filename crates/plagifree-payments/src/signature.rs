//! Stripe-style webhook signatures.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
//! Each `v1` is an HMAC-SHA256 over `{t}.{payload}` keyed with the endpoint
//! secret; any one matching is enough.

use hmac::{Hmac, Mac};
use plagifree_core::{PlagiError, PlagiResult};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age, in seconds, of an accepted signature timestamp.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> PlagiResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PlagiError::Crypto(e.to_string()))?;
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    Ok(mac)
}

/// Hex-encoded `v1` signature for `payload` at `timestamp`.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> PlagiResult<String> {
    Ok(hex::encode(mac_for(secret, timestamp, payload)?.finalize().into_bytes()))
}

/// Check `header` against `payload`, with `now` as the current unix time.
pub fn verify_signature(secret: &str, payload: &[u8], header: &str, now: i64) -> PlagiResult<()> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PlagiError::Auth("webhook signature has no timestamp".to_string()))?;
    if candidates.is_empty() {
        return Err(PlagiError::Auth("webhook signature has no v1 entry".to_string()));
    }
    if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(PlagiError::Auth(
            "webhook signature timestamp outside tolerance".to_string(),
        ));
    }

    let mac = mac_for(secret, timestamp, payload)?;
    let matched = candidates.into_iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(PlagiError::Auth("webhook signature mismatch".to_string()))
    }
}
