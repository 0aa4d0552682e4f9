//! Error types for fbgraph.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the token codecs, the graph simulator and the client.
///
/// Nothing is retried internally: every variant reaches the immediate caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown object, relation or connection sub-path.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A request parameter could not be interpreted.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An access token is required for this operation but none was supplied.
    #[error("An access token is required to request this resource")]
    AuthRequired,

    /// The access token does not map to a known user.
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// A signed request could not be split or decoded.
    #[error("Malformed signed request: {0}")]
    MalformedToken(String),

    /// A signed request names an algorithm other than HMAC-SHA256.
    #[error("Signed request uses an unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature of a signed request does not match its payload.
    #[error("Signed request signature mismatch")]
    SignatureMismatch,

    /// The remote API reported an error (error payload or non-2xx status).
    #[error("{kind}: {message}")]
    Remote {
        /// Error type reported by the remote side.
        kind: String,
        /// Human-readable message reported by the remote side.
        message: String,
    },

    /// The remote API answered with a body the client cannot decode.
    #[error("Unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// Application authentication did not yield a token.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The transport collaborator failed before a response was produced.
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns the error type name the remote API uses for this failure.
    ///
    /// The simulator transport writes it into `{"error": {"type": ...}}` bodies,
    /// which the client maps back to [`Error::Remote`].
    #[must_use]
    pub fn error_type(&self) -> &str {
        match self {
            Self::AuthRequired
            | Self::InvalidToken(_)
            | Self::MalformedToken(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::SignatureMismatch
            | Self::Authentication(_) => "OAuthException",
            Self::NotFound(_) | Self::InvalidParameter(_) => "GraphMethodException",
            Self::Remote { kind, .. } => kind,
            Self::UnexpectedContentType(_) | Self::Transport(_) => "CommunicationError",
            Self::Json(_) | Self::Config(_) => "Exception",
        }
    }

    /// Returns the HTTP status the simulator transport reports for this failure.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::AuthRequired | Self::InvalidToken(_) => 401,
            Self::Transport(_) | Self::Config(_) => 500,
            _ => 400,
        }
    }

    /// Returns true for failures caused by missing or rejected credentials.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.error_type() == "OAuthException"
    }
}

/// Result type alias for fbgraph operations.
pub type Result<T> = std::result::Result<T, Error>;
