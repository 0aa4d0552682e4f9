//! Graph object and connection entry types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Kind of a simulated graph object.
///
/// The kind selects which relations an object declares (see
/// [`RelationTable`](super::RelationTable)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The application that owns the simulated graph.
    Application,
    /// A person.
    User,
    /// A wall/feed post.
    Post,
    /// A comment on a post.
    Comment,
}

impl NodeKind {
    /// Returns the lowercase name used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::User => "user",
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "application" => Ok(Self::Application),
            "user" => Ok(Self::User),
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            other => Err(Error::NotFound(format!("object type '{other}'"))),
        }
    }
}

/// A simulated remote entity.
///
/// # Example
///
/// ```rust
/// use fbgraph_core::graph::{GraphObject, NodeKind};
/// use serde_json::json;
///
/// let user = GraphObject::new("1001", NodeKind::User).with_field("name", json!("Ada Lovelace"));
/// assert_eq!(user.id(), "1001");
/// assert_eq!(user.to_json()["name"], "Ada Lovelace");
/// assert_eq!(user.to_json()["id"], "1001");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphObject {
    id: String,
    kind: NodeKind,
    fields: Map<String, Value>,
}

impl GraphObject {
    /// Creates an object with no fields.
    #[must_use]
    pub fn new(id: &str, kind: NodeKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            fields: Map::new(),
        }
    }

    /// Adds a single field (builder pattern).
    #[must_use]
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.set_field(name, value);
        self
    }

    /// Adds several fields (builder pattern).
    #[must_use]
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.merge(fields);
        self
    }

    /// Returns the object identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the object kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns all fields (without `id`).
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns a specific field, if present.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns a string field, if present and a string.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Sets a field. `id` is ignored; identifiers never change.
    pub fn set_field(&mut self, name: &str, value: Value) {
        if name != "id" {
            self.fields.insert(name.to_string(), value);
        }
    }

    /// Shallow field-level overwrite.
    pub fn merge(&mut self, fields: Map<String, Value>) {
        for (name, value) in fields {
            self.set_field(&name, value);
        }
    }

    pub(crate) fn rename(&mut self, id: &str) {
        self.id = id.to_string();
    }

    /// Renders the object the way the remote API returns it.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = self.fields.clone();
        out.insert("id".to_string(), Value::String(self.id.clone()));
        Value::Object(out)
    }

    /// Renders only the requested fields, plus `id`.
    #[must_use]
    pub fn project(&self, names: &[String]) -> Value {
        let mut out = Map::new();
        for name in names {
            if let Some(value) = self.fields.get(name) {
                out.insert(name.clone(), value.clone());
            }
        }
        out.insert("id".to_string(), Value::String(self.id.clone()));
        Value::Object(out)
    }

    /// Returns true if any string field contains `needle` (case-insensitive).
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.fields
            .values()
            .filter_map(Value::as_str)
            .any(|s| s.to_lowercase().contains(&needle))
    }
}

/// One entry of a connection, rendered as `{"id": key, ...data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEntry {
    key: String,
    data: Map<String, Value>,
}

impl ConnectionEntry {
    /// Creates an entry that records only the related identifier.
    #[must_use]
    pub fn reference(key: &str) -> Self {
        Self {
            key: key.to_string(),
            data: Map::new(),
        }
    }

    /// Creates an entry with payload data. A `data["id"]` is dropped.
    #[must_use]
    pub fn with_data(key: &str, mut data: Map<String, Value>) -> Self {
        data.remove("id");
        Self {
            key: key.to_string(),
            data,
        }
    }

    /// Returns the identifier the entry points at.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the payload fields.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns the creation time (Unix seconds), if recorded.
    #[must_use]
    pub fn created_time(&self) -> Option<i64> {
        self.data.get("created_time").and_then(Value::as_i64)
    }

    /// Renders the entry the way the remote API returns it.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = self.data.clone();
        out.insert("id".to_string(), Value::String(self.key.clone()));
        Value::Object(out)
    }
}
