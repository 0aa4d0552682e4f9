//! Tests for the error taxonomy.

use super::error::Error;
use crate::config::ConfigError;

#[test]
fn test_error_display() {
    let err = Error::NotFound("me/photos".to_string());
    assert_eq!(err.to_string(), "Resource not found: me/photos");

    let err = Error::Remote {
        kind: "OAuthException".to_string(),
        message: "Error validating access token".to_string(),
    };
    assert_eq!(err.to_string(), "OAuthException: Error validating access token");
}

#[test]
fn test_error_type_mapping() {
    assert_eq!(Error::AuthRequired.error_type(), "OAuthException");
    assert_eq!(Error::SignatureMismatch.error_type(), "OAuthException");
    assert_eq!(
        Error::NotFound("x".to_string()).error_type(),
        "GraphMethodException"
    );
    let remote = Error::Remote {
        kind: "GraphMethodException".to_string(),
        message: "Unsupported get request.".to_string(),
    };
    assert_eq!(remote.error_type(), "GraphMethodException");
}

#[test]
fn test_http_status_mapping() {
    assert_eq!(Error::NotFound("x".to_string()).http_status(), 404);
    assert_eq!(Error::AuthRequired.http_status(), 401);
    assert_eq!(Error::InvalidToken("t".to_string()).http_status(), 401);
    assert_eq!(Error::SignatureMismatch.http_status(), 400);
    assert_eq!(Error::InvalidParameter("limit=x".to_string()).http_status(), 400);
}

#[test]
fn test_auth_failure_classification() {
    assert!(Error::AuthRequired.is_auth_failure());
    assert!(Error::MalformedToken("no dot".to_string()).is_auth_failure());
    assert!(!Error::NotFound("x".to_string()).is_auth_failure());
}

#[test]
fn test_error_from_json() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn test_error_from_config() {
    let err: Error = ConfigError::InvalidValue {
        key: "app.secret".to_string(),
        message: "must not be empty".to_string(),
    }
    .into();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("app.secret"));
}
