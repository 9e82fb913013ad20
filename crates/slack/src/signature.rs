//! Slack request signing (`v0`): `v0=` + hex HMAC-SHA256 of `v0:{timestamp}:{body}`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Largest accepted distance between the request timestamp and local time.
pub const MAX_CLOCK_SKEW_SECS: i64 = 5 * 60;

const VERSION: &str = "v0";

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("request timestamp is not an integer")]
    InvalidTimestamp,
    #[error("request timestamp is outside the accepted window")]
    StaleTimestamp,
    #[error("signature is not a `v0=` hex digest")]
    Malformed,
    #[error("signature does not match request body")]
    Mismatch,
    #[error("signing secret was rejected")]
    InvalidSecret,
}

#[derive(Clone)]
pub struct SignatureVerifier {
    mac: HmacSha256,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(signing_secret: &SecretString) -> Result<Self, SignatureError> {
        let mac = HmacSha256::new_from_slice(signing_secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::InvalidSecret)?;
        Ok(Self { mac })
    }

    /// Produces the `x-slack-signature` value for `body` sent at `timestamp`.
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> String {
        let mut mac = self.mac.clone();
        update_base_string(&mut mac, &timestamp.to_string(), body);
        format!("{VERSION}={}", hex::encode(mac.finalize().into_bytes()))
    }

    pub fn verify(
        &self,
        timestamp: &str,
        signature: &str,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        self.verify_at(timestamp, signature, body, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        timestamp: &str,
        signature: &str,
        body: &[u8],
        now_unix: i64,
    ) -> Result<(), SignatureError> {
        let sent_at: i64 = timestamp.trim().parse().map_err(|_| SignatureError::InvalidTimestamp)?;
        if (now_unix - sent_at).abs() > MAX_CLOCK_SKEW_SECS {
            return Err(SignatureError::StaleTimestamp);
        }

        let digest = signature
            .strip_prefix(VERSION)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or(SignatureError::Malformed)?;
        let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;

        let mut mac = self.mac.clone();
        update_base_string(&mut mac, timestamp.trim(), body);
        mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
    }
}

fn update_base_string(mac: &mut HmacSha256, timestamp: &str, body: &[u8]) {
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
}
