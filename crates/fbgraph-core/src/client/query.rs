//! Request options shared by every [`GraphClient`](super::GraphClient).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Error, Result};

/// Options for a single-object fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Adds `type` and `metadata.connections` to the result.
    pub metadata: bool,
    /// Keeps only these fields (plus `id`). Empty means every field.
    pub fields: Vec<String>,
}

impl FetchOptions {
    /// Fetches every field without metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests introspection metadata.
    #[must_use]
    pub fn with_metadata(mut self) -> Self {
        self.metadata = true;
        self
    }

    /// Restricts the result to the given fields.
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Renders the options as query parameters.
    #[must_use]
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if self.metadata {
            params.insert("metadata".to_string(), "1".to_string());
        }
        if !self.fields.is_empty() {
            params.insert("fields".to_string(), self.fields.join(","));
        }
        params
    }

    /// Reads the options back from query parameters.
    #[must_use]
    pub fn from_params(params: &BTreeMap<String, String>) -> Self {
        let metadata = params
            .get("metadata")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
        let fields = params
            .get("fields")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self { metadata, fields }
    }
}

/// Paging and time-window options for a connection read.
///
/// `since` and `until` compare against the entries' `created_time`, both
/// bounds inclusive. Entries without a `created_time` are never filtered out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionQuery {
    /// Maximum number of entries returned.
    pub limit: Option<usize>,
    /// Number of entries skipped after time filtering.
    pub offset: Option<usize>,
    /// Drops entries created after this instant.
    pub until: Option<DateTime<Utc>>,
    /// Drops entries created before this instant.
    pub since: Option<DateTime<Utc>>,
}

impl ConnectionQuery {
    /// Reads everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the page start.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the upper bound of the time window.
    #[must_use]
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Sets the lower bound of the time window.
    #[must_use]
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Renders the query as parameters; instants become Unix seconds.
    #[must_use]
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), limit.to_string());
        }
        if let Some(offset) = self.offset {
            params.insert("offset".to_string(), offset.to_string());
        }
        if let Some(until) = self.until {
            params.insert("until".to_string(), until.timestamp().to_string());
        }
        if let Some(since) = self.since {
            params.insert("since".to_string(), since.timestamp().to_string());
        }
        params
    }

    /// Parses a query from request parameters, ignoring unrelated keys.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self> {
        Ok(Self {
            limit: parse_count(params, "limit")?,
            offset: parse_count(params, "offset")?,
            until: parse_instant(params, "until")?,
            since: parse_instant(params, "since")?,
        })
    }

    /// Filters and pages rendered connection entries.
    #[must_use]
    pub fn apply(&self, entries: Vec<Value>) -> Vec<Value> {
        let since = self.since.map(|t| t.timestamp());
        let until = self.until.map(|t| t.timestamp());
        let windowed = entries.into_iter().filter(|entry| {
            match entry.get("created_time").and_then(Value::as_i64) {
                Some(created) => {
                    since.map_or(true, |s| created >= s) && until.map_or(true, |u| created <= u)
                }
                None => true,
            }
        });
        page(windowed, self.offset, self.limit)
    }
}

/// Skips `offset` items and keeps at most `limit`.
pub(crate) fn page<I>(items: I, offset: Option<usize>, limit: Option<usize>) -> Vec<Value>
where
    I: IntoIterator<Item = Value>,
{
    items
        .into_iter()
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

pub(crate) fn parse_count(params: &BTreeMap<String, String>, key: &str) -> Result<Option<usize>> {
    params
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .map_err(|_| Error::InvalidParameter(format!("{key}={raw}")))
        })
        .transpose()
}

fn parse_instant(params: &BTreeMap<String, String>, key: &str) -> Result<Option<DateTime<Utc>>> {
    params
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .ok_or_else(|| Error::InvalidParameter(format!("{key}={raw}")))
        })
        .transpose()
}
