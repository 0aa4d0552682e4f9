//! Serves a simulator through the transport contract.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::simulator::Graph;

use super::query::{ConnectionQuery, FetchOptions};
use super::transport::{Method, Transport, TransportResponse};

const JSON_CONTENT_TYPE: &str = "text/javascript; charset=UTF-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

/// Parameters that steer a request rather than carry data.
const RESERVED_PARAMS: [&str; 3] = ["access_token", "q", "type"];

/// A [`Transport`] answering requests from an in-process [`Graph`].
///
/// Lets [`GraphApi`](super::GraphApi) be exercised end to end without a
/// network. Failures become `{"error": {"type", "message"}}` bodies with
/// the status [`Error::http_status`] reports.
#[derive(Debug, Clone)]
pub struct SimulatorTransport {
    graph: Arc<Graph>,
}

impl SimulatorTransport {
    /// Wraps a simulator.
    #[must_use]
    pub fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// Returns the simulator behind this transport.
    #[must_use]
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    fn route(
        &self,
        method: Method,
        path: &str,
        query: &BTreeMap<String, String>,
        form: Option<&BTreeMap<String, String>>,
    ) -> Result<TransportResponse> {
        let token = form
            .and_then(|f| f.get("access_token"))
            .or_else(|| query.get("access_token"))
            .map(String::as_str);
        let trimmed = path.trim_matches('/');
        let (id, rest) = match trimmed.split_once('/') {
            Some((id, rest)) => (id, Some(rest)),
            None => (trimmed, None),
        };

        let value = match (method, id, rest) {
            (Method::Post, "oauth", Some("access_token")) => {
                return self.oauth_access_token(form);
            }
            (Method::Get, "", None) => {
                let ids: Vec<&str> = query
                    .get("ids")
                    .map(|list| list.split(',').filter(|id| !id.is_empty()).collect())
                    .unwrap_or_default();
                self.graph.multi_fetch(token, &ids)?
            }
            (Method::Get, "search", None) => {
                let q = query.get("q").map_or("", String::as_str);
                let object_type = query
                    .get("type")
                    .ok_or_else(|| Error::InvalidParameter("type".to_string()))?;
                self.graph
                    .search(token, object_type, q, &without_reserved(query))?
            }
            (Method::Get, id, None) => {
                self.graph
                    .fetch(token, id, &FetchOptions::from_params(query))?
            }
            (Method::Get, id, Some(relation_path)) => self.graph.fetch_connection(
                token,
                id,
                relation_path,
                &ConnectionQuery::from_params(query)?,
            )?,
            (Method::Post, id, Some(relation_path)) => {
                let data: Map<String, Value> = form
                    .into_iter()
                    .flatten()
                    .filter(|(k, _)| k.as_str() != "access_token")
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                self.graph.put(token, id, relation_path, &data)?
            }
            (Method::Delete, id, None) => self.graph.delete(token, id)?,
            _ => return Err(Error::NotFound(format!("{method} {path}"))),
        };

        Ok(TransportResponse::new(
            200,
            JSON_CONTENT_TYPE,
            serde_json::to_vec(&value)?,
        ))
    }

    fn oauth_access_token(
        &self,
        form: Option<&BTreeMap<String, String>>,
    ) -> Result<TransportResponse> {
        let field = |name: &str| form.and_then(|f| f.get(name)).map_or("", String::as_str);
        if field("grant_type") != "client_credentials" {
            return Err(Error::Authentication(format!(
                "unsupported grant type '{}'",
                field("grant_type")
            )));
        }
        let token = self
            .graph
            .app_access_token(field("client_id"), field("client_secret"))?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("access_token", &token)
            .finish();
        Ok(TransportResponse::new(200, TEXT_CONTENT_TYPE, body.into_bytes()))
    }
}

impl Transport for SimulatorTransport {
    fn perform(
        &self,
        method: Method,
        path: &str,
        query: &BTreeMap<String, String>,
        form: Option<&BTreeMap<String, String>>,
    ) -> Result<TransportResponse> {
        match self.route(method, path, query, form) {
            Ok(response) => Ok(response),
            Err(err) => {
                debug!(%method, path, error = %err, "simulated request failed");
                let body = json!({
                    "error": {
                        "type": err.error_type(),
                        "message": err.to_string(),
                    }
                });
                Ok(TransportResponse::new(
                    err.http_status(),
                    JSON_CONTENT_TYPE,
                    serde_json::to_vec(&body)?,
                ))
            }
        }
    }
}

fn without_reserved(params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    params
        .iter()
        .filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
