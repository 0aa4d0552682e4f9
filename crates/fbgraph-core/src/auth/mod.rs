//! Token codecs.
//!
//! Two non-interchangeable schemes coexist and are kept apart:
//!
//! - [`cookie`]: the legacy `fbs_<app_id>` cookie, a form-encoded argument
//!   list signed with MD5 over the sorted fields and the app secret.
//! - [`signed_request`]: the compact `signature.payload` token, base64url
//!   encoded and signed with HMAC-SHA256.
//!
//! # Example
//!
//! ```rust
//! use fbgraph_core::auth::{build_signed_request, parse_signed_request};
//!
//! let token = build_signed_request("1001", Some("tok"), "s3cr3t").unwrap();
//! let request = parse_signed_request(&token, "s3cr3t").unwrap();
//! assert_eq!(request.user_id.as_deref(), Some("1001"));
//! assert_eq!(request.oauth_token.as_deref(), Some("tok"));
//! ```

pub mod cookie;
pub mod signed_request;


pub use cookie::{decode_cookie_token, encode_cookie_token, sign_cookie_fields, user_from_cookies};
pub use signed_request::{
    build_signed_request, parse_signed_request, SignedRequest, UserContext, ALGORITHM,
};

/// Constant-time byte comparison.
///
/// Always walks every byte so a mismatch position cannot be inferred from
/// timing.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Current Unix time in seconds.
pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
