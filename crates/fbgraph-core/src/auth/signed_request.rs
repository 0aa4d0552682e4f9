//! Compact signed requests: `base64url(signature).base64url(json payload)`.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use tracing::warn;

use crate::error::{Error, Result};

use super::unix_now;

type HmacSha256 = Hmac<Sha256>;

/// The only signing algorithm accepted.
pub const ALGORITHM: &str = "HMAC-SHA256";

/// Locale block attached to every signed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    /// Viewer locale, e.g. `en_US`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Viewer country code, e.g. `us`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UserContext {
    fn default() -> Self {
        Self {
            locale: Some("en_US".to_string()),
            country: Some("us".to_string()),
            extra: Map::new(),
        }
    }
}

/// Decoded signed request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedRequest {
    /// Signing algorithm tag.
    pub algorithm: String,
    /// Issuance time (Unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    /// Viewer locale block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserContext>,
    /// Access token of an authorised viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,
    /// Id of an authorised viewer.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub user_id: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignedRequest {
    /// Builds a payload issued at `issued_at`.
    ///
    /// `user_id` is only recorded when an `oauth_token` is supplied; a request
    /// without a token describes an anonymous viewer.
    #[must_use]
    pub fn new(user_id: &str, oauth_token: Option<&str>, issued_at: i64) -> Self {
        let (oauth_token, user_id) = match oauth_token {
            Some(token) => (Some(token.to_string()), Some(user_id.to_string())),
            None => (None, None),
        };
        Self {
            algorithm: ALGORITHM.to_string(),
            issued_at: Some(issued_at),
            user: Some(UserContext::default()),
            oauth_token,
            user_id,
            extra: Map::new(),
        }
    }

    /// Returns true when the payload carries no viewer credentials.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.oauth_token.is_none()
    }

    /// Serializes, signs and encodes this payload.
    pub fn encode(&self, app_secret: &str) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = sign(payload.as_bytes(), app_secret)?;
        Ok(format!("{}.{}", URL_SAFE_NO_PAD.encode(signature), payload))
    }
}

/// Builds a signed request for `user_id`, issued now.
pub fn build_signed_request(
    user_id: &str,
    oauth_token: Option<&str>,
    app_secret: &str,
) -> Result<String> {
    SignedRequest::new(user_id, oauth_token, unix_now()).encode(app_secret)
}

/// Verifies and decodes a signed request.
///
/// The signature covers the undecoded payload segment and is checked before
/// the payload is decoded, so any edit to that segment is reported as
/// [`Error::SignatureMismatch`].
///
/// Precedence: a bad signature wins over an unsupported `algorithm`, which
/// is only reported for tokens signed with the right secret.
pub fn parse_signed_request(token: &str, app_secret: &str) -> Result<SignedRequest> {
    let mut parts = token.split('.');
    let (encoded_sig, payload) = match (parts.next(), parts.next(), parts.next()) {
        (Some(sig), Some(payload), None) => (sig, payload),
        _ => {
            return Err(Error::MalformedToken(
                "expected exactly one '.' separator".to_string(),
            ))
        }
    };

    let signature = decode_segment(encoded_sig, "signature")?;

    let mut mac = new_mac(app_secret)?;
    mac.update(payload.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        warn!("signed request signature mismatch");
        return Err(Error::SignatureMismatch);
    }

    let data = decode_segment(payload, "payload")?;
    let value: Value = serde_json::from_slice(&data)
        .map_err(|e| Error::MalformedToken(format!("payload is not JSON: {e}")))?;

    let algorithm = value
        .get("algorithm")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !algorithm.eq_ignore_ascii_case(ALGORITHM) {
        return Err(Error::UnsupportedAlgorithm(algorithm.to_string()));
    }

    serde_json::from_value(value)
        .map_err(|e| Error::MalformedToken(format!("unexpected payload shape: {e}")))
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>> {
    let mut padded = segment.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| Error::MalformedToken(format!("{what} is not base64url: {e}")))
}

fn new_mac(app_secret: &str) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|e| Error::MalformedToken(format!("unusable secret: {e}")))
}

fn sign(payload: &[u8], app_secret: &str) -> Result<Vec<u8>> {
    let mut mac = new_mac(app_secret)?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
