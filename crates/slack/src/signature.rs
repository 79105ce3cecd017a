//! Slack request signing (v0 scheme).
//!
//! `v0:{timestamp}:{body}` is HMAC-SHA256'd with the app's signing secret
//! and compared against the `X-Slack-Signature` header. Requests older than
//! the freshness window are rejected to blunt replay.

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (and clock skew) of the request timestamp.
const FRESHNESS_WINDOW_SECS: i64 = 300;

pub fn verify_signature(
    signing_secret: &SecretString,
    timestamp: &str,
    body: &[u8],
    signature: &str,
) -> bool {
    verify_signature_at(signing_secret, timestamp, body, signature, Utc::now().timestamp())
}

fn verify_signature_at(
    signing_secret: &SecretString,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now_epoch_secs: i64,
) -> bool {
    let Ok(request_epoch) = timestamp.parse::<i64>() else {
        return false;
    };
    if (now_epoch_secs - request_epoch).abs() > FRESHNESS_WINDOW_SECS {
        return false;
    }

    let Some(provided_hex) = signature.strip_prefix("v0=") else {
        return false;
    };
    let Some(provided) = decode_hex(provided_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(signing_secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(format!("v0:{timestamp}:").as_bytes());
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

fn decode_hex(input: &str) -> Option<Vec<u8>> {
    if input.len() % 2 != 0 {
        return None;
    }
    (0..input.len())
        .step_by(2)
        .map(|index| u8::from_str_radix(input.get(index..index + 2)?, 16).ok())
        .collect()
}
