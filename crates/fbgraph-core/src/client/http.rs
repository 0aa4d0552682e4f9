//! The graph API client over a [`Transport`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::query::{ConnectionQuery, FetchOptions};
use super::transport::{Method, Transport, TransportResponse};
use super::GraphClient;

/// Talks to the graph API through a transport.
///
/// The access token travels in the form body of writes and in the query
/// string of reads and deletes.
#[derive(Debug)]
pub struct GraphApi<T> {
    transport: Arc<T>,
    access_token: Option<String>,
}

impl<T> Clone for GraphApi<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            access_token: self.access_token.clone(),
        }
    }
}

impl<T: Transport> GraphApi<T> {
    /// Creates a client.
    #[must_use]
    pub fn new(transport: Arc<T>, access_token: Option<&str>) -> Self {
        Self {
            transport,
            access_token: access_token.map(str::to_string),
        }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Sends one request and decodes the JSON answer.
    fn request(
        &self,
        method: Method,
        path: &str,
        mut query: BTreeMap<String, String>,
        mut form: Option<BTreeMap<String, String>>,
    ) -> Result<Value> {
        if let Some(token) = &self.access_token {
            match form.as_mut() {
                Some(form) => form.insert("access_token".to_string(), token.clone()),
                None => query.insert("access_token".to_string(), token.clone()),
            };
        }

        debug!(%method, path, "graph request");
        let response = self
            .transport
            .perform(method, path, &query, form.as_ref())?;
        decode_response(&response)
    }
}

impl<T: Transport> GraphClient for GraphApi<T> {
    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn with_access_token(&self, access_token: Option<&str>) -> Self {
        Self::new(Arc::clone(&self.transport), access_token)
    }

    fn fetch(&self, id: &str, options: &FetchOptions) -> Result<Value> {
        self.request(Method::Get, &format!("/{id}"), options.to_params(), None)
    }

    fn multi_fetch(&self, ids: &[&str]) -> Result<Value> {
        let mut query = BTreeMap::new();
        query.insert("ids".to_string(), ids.join(","));
        self.request(Method::Get, "/", query, None)
    }

    fn fetch_connections(
        &self,
        id: &str,
        relation: &str,
        query: &ConnectionQuery,
    ) -> Result<Value> {
        self.request(
            Method::Get,
            &format!("/{id}/{relation}"),
            query.to_params(),
            None,
        )
    }

    fn put(&self, parent_id: &str, relation: &str, data: &Map<String, Value>) -> Result<Value> {
        let form = data
            .iter()
            .map(|(k, v)| (k.clone(), form_value(v)))
            .collect();
        self.request(
            Method::Post,
            &format!("/{parent_id}/{relation}"),
            BTreeMap::new(),
            Some(form),
        )
    }

    fn search(
        &self,
        object_type: &str,
        query: &str,
        extra: &BTreeMap<String, String>,
    ) -> Result<Value> {
        let mut params = extra.clone();
        params.insert("q".to_string(), query.to_string());
        params.insert("type".to_string(), object_type.to_string());
        self.request(Method::Get, "/search", params, None)
    }

    fn delete(&self, id: &str) -> Result<Value> {
        self.request(Method::Delete, &format!("/{id}"), BTreeMap::new(), None)
    }
}

/// Exchanges client credentials for an application access token.
pub fn get_oauth_access_token<T: Transport + ?Sized>(
    transport: &T,
    app_id: &str,
    app_secret: &str,
) -> Result<String> {
    let mut form = BTreeMap::new();
    form.insert("grant_type".to_string(), "client_credentials".to_string());
    form.insert("client_id".to_string(), app_id.to_string());
    form.insert("client_secret".to_string(), app_secret.to_string());

    let response = transport.perform(
        Method::Post,
        "/oauth/access_token",
        &BTreeMap::new(),
        Some(&form),
    )?;
    if is_json(&response.content_type) {
        // Success is plain text; a JSON body carries the error.
        decode_response(&response)?;
    }
    if !response.is_success() {
        return Err(communication_error(response.status));
    }

    let body = String::from_utf8_lossy(&response.body);
    let token = url::form_urlencoded::parse(body.trim().as_bytes())
        .find(|(k, _)| k == "access_token")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default();
    if token.is_empty() {
        warn!(app_id, "no access token in oauth response");
        return Err(Error::Authentication(format!("Unknown response: {body}")));
    }
    Ok(token)
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RemoteError,
}

#[derive(Deserialize)]
struct RemoteError {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decodes a JSON response, surfacing error payloads and failed statuses.
pub(crate) fn decode_response(response: &TransportResponse) -> Result<Value> {
    if !is_json(&response.content_type) {
        if !response.is_success() {
            return Err(communication_error(response.status));
        }
        return Err(Error::UnexpectedContentType(response.content_type.clone()));
    }

    let value: Value = serde_json::from_slice(&response.body)?;
    if value.get("error").is_some_and(Value::is_object) {
        let envelope: ErrorEnvelope = serde_json::from_value(value)?;
        let kind = envelope
            .error
            .kind
            .unwrap_or_else(|| "Exception".to_string());
        let message = envelope.error.message.unwrap_or_default();
        warn!(%kind, %message, "graph API error");
        return Err(Error::Remote { kind, message });
    }
    if !response.is_success() {
        return Err(communication_error(response.status));
    }
    Ok(value)
}

fn is_json(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.starts_with("text/javascript") || content_type.starts_with("application/json")
}

fn communication_error(status: u16) -> Error {
    Error::Remote {
        kind: "CommunicationError".to_string(),
        message: format!("HTTP status {status}"),
    }
}

/// Strings go verbatim; everything else is JSON-encoded.
fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
