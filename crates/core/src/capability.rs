//! Stateless capability tokens for anonymous image fetches.
//!
//! Slack's image proxy fetches home-tab images without any session, so the URL itself carries
//! the grant. A token is the lowercase hex encoding of a small JSON object:
//!
//! ```text
//! {"t":"<team>","u":"<user>","z":<offset hours>,"ts":<expiry unix secs>,"h":"<base64 mac>"}
//! ```
//!
//! The MAC is HMAC-SHA256 over `"{t}:{u}:{z}:{ts}"`. Field order and delimiter are part of the
//! wire contract: changing either invalidates every outstanding token.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretSlice};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted key length in bytes.
pub const MIN_KEY_LEN: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilityParams {
    pub team_id: String,
    pub user_id: String,
    pub tz_offset_hours: i32,
    /// `None` until signed; always `Some` on a verified value.
    pub expires_at_unix: Option<i64>,
}

impl CapabilityParams {
    pub fn new(
        team_id: impl Into<String>,
        user_id: impl Into<String>,
        tz_offset_hours: i32,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            user_id: user_id.into(),
            tz_offset_hours,
            expires_at_unix: None,
        }
    }

    pub fn expiring_at(mut self, expires_at_unix: i64) -> Self {
        self.expires_at_unix = Some(expires_at_unix);
        self
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed capability token")]
    MalformedToken,
    #[error("capability token signature does not match")]
    InvalidSignature,
    #[error("capability token has expired")]
    Expired,
}

impl TokenError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedToken => "malformed",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("signing key is not valid base64")]
    Encoding,
    #[error("signing key is {len} bytes, at least {min} are required")]
    TooShort { len: usize, min: usize },
    #[error("signing key was rejected by the MAC implementation")]
    Rejected,
}

/// Secret MAC key material. `Debug` output is redacted by `secrecy`.
#[derive(Debug)]
pub struct SigningKey(SecretSlice<u8>);

impl SigningKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, KeyError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_KEY_LEN {
            return Err(KeyError::TooShort { len: bytes.len(), min: MIN_KEY_LEN });
        }
        Ok(Self(SecretSlice::from(bytes)))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD.decode(encoded.trim()).map_err(|_| KeyError::Encoding)?;
        Self::new(bytes)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TokenPayload {
    #[serde(rename = "t")]
    team_id: String,
    #[serde(rename = "u")]
    user_id: String,
    #[serde(rename = "z")]
    tz_offset_hours: i32,
    #[serde(rename = "ts")]
    expires_at_unix: i64,
    #[serde(rename = "h")]
    mac: String,
}

/// Issues and verifies capability tokens with a single process-wide key.
///
/// The keyed MAC state is prepared once and cloned per operation; the engine holds no
/// mutable state.
#[derive(Clone)]
pub struct CapabilityEngine {
    mac: HmacSha256,
}

impl std::fmt::Debug for CapabilityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityEngine").finish_non_exhaustive()
    }
}

impl CapabilityEngine {
    pub fn new(key: &SigningKey) -> Result<Self, KeyError> {
        let mac = HmacSha256::new_from_slice(key.0.expose_secret())
            .map_err(|_| KeyError::Rejected)?;
        Ok(Self { mac })
    }

    /// Signs `params`, setting the expiry to now + `ttl` when it is unset.
    pub fn sign(&self, params: &CapabilityParams, ttl: Duration) -> String {
        self.sign_at(params, ttl, Utc::now())
    }

    pub fn sign_at(&self, params: &CapabilityParams, ttl: Duration, now: DateTime<Utc>) -> String {
        let expires_at_unix =
            params.expires_at_unix.unwrap_or_else(|| now.timestamp() + ttl.num_seconds());
        let mac = self.mac_for(
            &params.team_id,
            &params.user_id,
            params.tz_offset_hours,
            expires_at_unix,
        );

        let payload = TokenPayload {
            team_id: params.team_id.clone(),
            user_id: params.user_id.clone(),
            tz_offset_hours: params.tz_offset_hours,
            expires_at_unix,
            mac: STANDARD.encode(mac),
        };

        // strings and integers always serialize
        let encoded = serde_json::to_vec(&payload).unwrap_or_default();
        hex::encode(encoded)
    }

    pub fn verify(&self, token: &str) -> Result<CapabilityParams, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks run in a fixed order: decode, MAC, expiry. The MAC is checked even when the
    /// token is already past its expiry.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<CapabilityParams, TokenError> {
        if !token.bytes().all(|byte| matches!(byte, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(TokenError::MalformedToken);
        }
        let raw = hex::decode(token).map_err(|_| TokenError::MalformedToken)?;
        // The object must span the whole buffer, with nothing before or after the braces.
        if raw.first() != Some(&b'{') || raw.last() != Some(&b'}') {
            return Err(TokenError::MalformedToken);
        }
        let payload: TokenPayload =
            serde_json::from_slice(&raw).map_err(|_| TokenError::MalformedToken)?;
        let claimed =
            STANDARD.decode(payload.mac.as_bytes()).map_err(|_| TokenError::MalformedToken)?;

        let mut mac = self.mac.clone();
        mac.update(
            canonicalize(
                &payload.team_id,
                &payload.user_id,
                payload.tz_offset_hours,
                payload.expires_at_unix,
            )
            .as_bytes(),
        );
        mac.verify_slice(&claimed).map_err(|_| TokenError::InvalidSignature)?;

        if payload.expires_at_unix < now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(CapabilityParams {
            team_id: payload.team_id,
            user_id: payload.user_id,
            tz_offset_hours: payload.tz_offset_hours,
            expires_at_unix: Some(payload.expires_at_unix),
        })
    }

    /// Builds `{base_url}/{token}` for `params`.
    pub fn signed_url(&self, base_url: &str, params: &CapabilityParams, ttl: Duration) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.sign(params, ttl))
    }

    fn mac_for(
        &self,
        team_id: &str,
        user_id: &str,
        tz_offset_hours: i32,
        expires_at_unix: i64,
    ) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(canonicalize(team_id, user_id, tz_offset_hours, expires_at_unix).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn canonicalize(
    team_id: &str,
    user_id: &str,
    tz_offset_hours: i32,
    expires_at_unix: i64,
) -> String {
    format!("{team_id}:{user_id}:{tz_offset_hours}:{expires_at_unix}")
}

/// Returns everything after the final `/` of a request path or URL.
pub fn token_from_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Value;

    use super::{
        token_from_path, CapabilityEngine, CapabilityParams, KeyError, SigningKey, TokenError,
    };

    fn engine(fill: u8) -> CapabilityEngine {
        let key = SigningKey::new(vec![fill; 32]).expect("key");
        CapabilityEngine::new(&key).expect("engine")
    }

    fn params() -> CapabilityParams {
        CapabilityParams::new("t1235", "u492skdjf", -2)
    }

    fn rewrite_payload(token: &str, edit: impl FnOnce(&mut Value)) -> String {
        let raw = hex::decode(token).expect("hex");
        let mut value: Value = serde_json::from_slice(&raw).expect("json");
        edit(&mut value);
        hex::encode(serde_json::to_vec(&value).expect("encode"))
    }

    #[test]
    fn sign_then_verify_returns_original_params() {
        let engine = engine(7);
        let now = Utc::now();
        let ttl = Duration::hours(1);

        let token = engine.sign(&params(), ttl);
        let verified = engine.verify(&token).expect("token should verify");

        assert_eq!(verified.team_id, "t1235");
        assert_eq!(verified.user_id, "u492skdjf");
        assert_eq!(verified.tz_offset_hours, -2);
        let expiry = verified.expires_at_unix.expect("expiry is set");
        assert!(expiry >= now.timestamp());
        assert!(expiry <= now.timestamp() + ttl.num_seconds() + 1);
    }

    #[test]
    fn token_is_lowercase_hex_of_tagged_json() {
        let engine = engine(7);
        let token = engine.sign(&params().expiring_at(1_700_000_000), Duration::zero());

        assert!(token.chars().all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch)));
        let value: Value =
            serde_json::from_slice(&hex::decode(&token).expect("hex")).expect("json");
        assert_eq!(value["t"], "t1235");
        assert_eq!(value["u"], "u492skdjf");
        assert_eq!(value["z"], -2);
        assert_eq!(value["ts"], 1_700_000_000_i64);
        assert!(value["h"].is_string());
    }

    #[test]
    fn explicit_expiry_is_kept() {
        let engine = engine(7);
        let now = Utc.with_ymd_and_hms(2021, 3, 2, 1, 22, 1).single().expect("valid time");

        let token = engine.sign_at(&params().expiring_at(1_614_700_000), Duration::days(30), now);
        let verified = engine.verify_at(&token, now).expect("verify");

        assert_eq!(verified.expires_at_unix, Some(1_614_700_000));
    }

    #[test]
    fn altered_fields_fail_with_invalid_signature() {
        let engine = engine(7);
        let token = engine.sign(&params(), Duration::hours(1));

        let edits: Vec<Box<dyn FnOnce(&mut Value)>> = vec![
            Box::new(|value: &mut Value| value["t"] = Value::from("t9999")),
            Box::new(|value: &mut Value| value["u"] = Value::from("someone-else")),
            Box::new(|value: &mut Value| value["z"] = Value::from(5)),
            Box::new(|value: &mut Value| {
                let extended = value["ts"].as_i64().unwrap_or_default() + 86_400;
                value["ts"] = Value::from(extended);
            }),
        ];

        for edit in edits {
            let tampered = rewrite_payload(&token, edit);
            assert_eq!(engine.verify(&tampered), Err(TokenError::InvalidSignature));
        }
    }

    #[test]
    fn flipped_mac_byte_fails_with_invalid_signature() {
        let engine = engine(7);
        let token = engine.sign(&params(), Duration::hours(1));

        let tampered = rewrite_payload(&token, |value| {
            use base64::Engine as _;
            let b64 = base64::engine::general_purpose::STANDARD;
            let mut mac = b64.decode(value["h"].as_str().unwrap_or_default()).expect("mac");
            mac[0] ^= 0x01;
            value["h"] = Value::from(b64.encode(mac));
        });

        assert_eq!(engine.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn past_expiry_fails_with_expired() {
        let engine = engine(7);
        let token = engine.sign(&params(), Duration::seconds(-1));

        assert_eq!(engine.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn zero_expiry_is_already_expired() {
        let engine = engine(7);
        let token = engine.sign(&params().expiring_at(0), Duration::zero());

        assert_eq!(engine.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn expiry_second_itself_is_still_valid() {
        let engine = engine(7);
        let now = Utc.with_ymd_and_hms(2021, 7, 2, 14, 25, 1).single().expect("valid time");
        let token = engine.sign_at(&params().expiring_at(now.timestamp()), Duration::zero(), now);

        assert!(engine.verify_at(&token, now).is_ok());
        assert_eq!(
            engine.verify_at(&token, now + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn forged_and_expired_token_reports_invalid_signature() {
        let engine = engine(7);
        let token = engine.sign(&params(), Duration::seconds(-60));
        let tampered = rewrite_payload(&token, |value| value["u"] = Value::from("intruder"));

        assert_eq!(engine.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn token_from_another_key_fails_with_invalid_signature() {
        let token = engine(1).sign(&params(), Duration::hours(1));

        assert_eq!(engine(2).verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn malformed_inputs_fail_with_malformed_token() {
        let engine = engine(7);
        let valid = engine.sign(&params(), Duration::hours(1));

        let cases = [
            ("empty", String::new()),
            ("empty json", "7b7d".to_string()),
            ("garbage", "asdlkfjsldkjflskdjfl".to_string()),
            ("odd length", "7b7".to_string()),
            ("garbage prefix", format!("00{valid}")),
            ("garbage suffix", format!("{valid}00")),
            ("space suffix", format!("{valid}20")),
            ("newline prefix", format!("0a{valid}")),
            ("uppercase hex", valid.to_uppercase()),
            ("extra key", rewrite_payload(&valid, |value| value["x"] = Value::from(1))),
            ("json array", hex::encode("[1,2,3]")),
            ("wrong types", hex::encode(r#"{"t":1,"u":"u","z":"x","ts":0,"h":""}"#)),
            ("mac not base64", hex::encode(r#"{"t":"t","u":"u","z":0,"ts":9999999999,"h":"*"}"#)),
        ];

        for (name, token) in cases {
            assert_eq!(engine.verify(&token), Err(TokenError::MalformedToken), "case {name}");
        }
    }

    #[test]
    fn signed_url_appends_token_after_final_slash() {
        let engine = engine(7);
        let url =
            engine.signed_url("https://goodday.example/heatmap/", &params(), Duration::hours(1));

        assert!(url.starts_with("https://goodday.example/heatmap/"));
        assert!(!url.contains("heatmap//"));
        let token = token_from_path(&url);
        assert_eq!(engine.verify(token).map(|p| p.user_id), Ok("u492skdjf".to_string()));
    }

    #[test]
    fn token_from_path_strips_through_last_slash() {
        assert_eq!(token_from_path("/report/abc123"), "abc123");
        assert_eq!(token_from_path("/report/"), "");
        assert_eq!(token_from_path("abc123"), "abc123");
    }

    #[test]
    fn short_or_invalid_keys_are_rejected() {
        assert_eq!(SigningKey::new(vec![1; 8]).err(), Some(KeyError::TooShort { len: 8, min: 32 }));
        assert_eq!(SigningKey::from_base64("not base64!").err(), Some(KeyError::Encoding));
        assert!(SigningKey::from_base64(&"QUFB".repeat(11)).is_ok());
    }

    #[test]
    fn key_material_is_not_printed() {
        let key = SigningKey::new(b"super-secret-signing-key-material".to_vec()).expect("key");
        let engine = CapabilityEngine::new(&key).expect("engine");

        assert!(!format!("{key:?}").contains("super-secret"));
        assert!(!format!("{engine:?}").contains("super-secret"));
    }
}
