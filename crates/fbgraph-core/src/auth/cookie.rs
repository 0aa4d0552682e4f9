//! Cookie-carried session arguments.
//!
//! The JavaScript SDK stores `uid`, `access_token`, `expires` and `sig` in a
//! cookie named `<prefix><app_id>`. `sig` is the MD5 hex digest of every other
//! field as `key=value`, sorted by key and concatenated without separator,
//! followed by the app secret.

use std::collections::{BTreeMap, HashMap};

use md5::{Digest, Md5};
use tracing::debug;
use url::form_urlencoded;

use super::{constant_time_eq, unix_now};

/// Name of the signature field inside the cookie.
pub const SIGNATURE_FIELD: &str = "sig";

/// Name of the expiry field inside the cookie. `0` means "never expires".
pub const EXPIRES_FIELD: &str = "expires";

/// Computes the MD5 signature over all fields except `sig`.
#[must_use]
pub fn sign_cookie_fields(fields: &BTreeMap<String, String>, app_secret: &str) -> String {
    let mut hasher = Md5::new();
    for (key, value) in fields.iter().filter(|(k, _)| *k != SIGNATURE_FIELD) {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    hasher.update(app_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signs `fields` and renders them as a form-encoded cookie value.
///
/// Any `sig` already present in `fields` is replaced.
#[must_use]
pub fn encode_cookie_token(fields: &BTreeMap<String, String>, app_secret: &str) -> String {
    let sig = sign_cookie_fields(fields, app_secret);
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields.iter().filter(|(k, _)| *k != SIGNATURE_FIELD) {
        serializer.append_pair(key, value);
    }
    serializer.append_pair(SIGNATURE_FIELD, &sig);
    serializer.finish()
}

/// Decodes and verifies a raw cookie value.
///
/// Returns `None` for an empty cookie, a bad signature, a missing or
/// unparsable `expires`, or an expired cookie. An invalid cookie is the
/// normal state of an anonymous visitor, not a failure.
#[must_use]
pub fn decode_cookie_token(raw: &str, app_secret: &str) -> Option<BTreeMap<String, String>> {
    let raw = raw.trim().trim_matches('"');
    if raw.is_empty() {
        return None;
    }

    // Repeated keys: the last value wins. Blank values are dropped.
    let fields: BTreeMap<String, String> = form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .filter(|(_, v)| !v.is_empty())
        .collect();

    let provided = fields.get(SIGNATURE_FIELD)?;
    let expected = sign_cookie_fields(&fields, app_secret);
    if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        debug!("cookie signature mismatch");
        return None;
    }

    let expires: i64 = fields.get(EXPIRES_FIELD)?.trim().parse().ok()?;
    if expires != 0 && unix_now() >= expires {
        debug!(expires, "cookie expired");
        return None;
    }

    Some(fields)
}

/// Looks up the `<cookie_prefix><app_id>` cookie and decodes it.
#[must_use]
pub fn user_from_cookies(
    cookies: &HashMap<String, String>,
    cookie_prefix: &str,
    app_id: &str,
    app_secret: &str,
) -> Option<BTreeMap<String, String>> {
    let name = format!("{cookie_prefix}{app_id}");
    let raw = cookies.get(&name)?;
    decode_cookie_token(raw, app_secret)
}
