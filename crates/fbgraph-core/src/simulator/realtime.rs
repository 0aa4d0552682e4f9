//! Realtime update callback payloads.
//!
//! The remote service notifies subscribed applications with
//! `{"object": <type>, "entry": [{"uid", "changed_fields", "time"}]}`.

use serde::{Deserialize, Serialize};

/// One changed object inside a realtime update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeEntry {
    /// Id of the changed object.
    pub uid: String,
    /// Names of the fields or connections that changed.
    pub changed_fields: Vec<String>,
    /// Unix time of the change.
    pub time: i64,
}

/// The body POSTed to an application's realtime callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeUpdate {
    /// Object type the subscription is for, e.g. `user`.
    pub object: String,
    /// One entry per changed object.
    pub entry: Vec<RealtimeEntry>,
}

impl RealtimeUpdate {
    /// Creates an update with no entries.
    #[must_use]
    pub fn new(object: &str) -> Self {
        Self {
            object: object.to_string(),
            entry: Vec::new(),
        }
    }

    /// Appends an entry.
    #[must_use]
    pub fn with_entry<S: AsRef<str>>(mut self, uid: &str, changed_fields: &[S], time: i64) -> Self {
        self.entry.push(RealtimeEntry {
            uid: uid.to_string(),
            changed_fields: changed_fields.iter().map(|f| f.as_ref().to_string()).collect(),
            time,
        });
        self
    }
}
