//! The HTTP collaborator the real client talks through.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// HTTP methods used by the graph API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Reads.
    Get,
    /// Writes.
    Post,
    /// Deletions.
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw response as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header.
    pub content_type: String,
    /// Response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.to_string(),
            body,
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one request against the graph host.
///
/// `path` starts with `/`; `query` goes into the URL and `form`, when
/// present, is sent as an `application/x-www-form-urlencoded` body.
pub trait Transport: Send + Sync {
    /// Sends the request and returns the raw response.
    fn perform(
        &self,
        method: Method,
        path: &str,
        query: &BTreeMap<String, String>,
        form: Option<&BTreeMap<String, String>>,
    ) -> Result<TransportResponse>;
}
