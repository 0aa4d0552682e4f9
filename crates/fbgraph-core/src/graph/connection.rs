//! Connections and their relation-specific write behaviour.

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::session::SessionManager;

use super::names::IdentityGenerator;
use super::relations::{ConnectionKind, TEST_USERS_PATH};
use super::store::GraphStore;
use super::types::{ConnectionEntry, GraphObject, NodeKind};

/// An ordered relation from one object to others.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    owner: String,
    relation: String,
    kind: ConnectionKind,
    entries: Vec<ConnectionEntry>,
}

impl Connection {
    /// Creates an empty connection.
    #[must_use]
    pub fn new(owner: &str, relation: &str, kind: ConnectionKind) -> Self {
        Self {
            owner: owner.to_string(),
            relation: relation.to_string(),
            kind,
            entries: Vec::new(),
        }
    }

    /// Returns the id of the object owning this connection.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the relation name.
    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Returns the connection behaviour.
    #[must_use]
    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    /// Returns the stored entries in order.
    #[must_use]
    pub fn entries(&self) -> &[ConnectionEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all entries rendered as JSON. The token does not filter reads.
    #[must_use]
    pub fn read(&self, _access_token: Option<&str>) -> Vec<Value> {
        self.entries.iter().map(ConnectionEntry::to_json).collect()
    }

    /// Returns true if an entry points at `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key() == key)
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: ConnectionEntry) {
        self.entries.push(entry);
    }

    /// Records a friend once. Returns false if already present.
    pub fn add_friend(&mut self, friend_id: &str) -> bool {
        if self.contains(friend_id) {
            return false;
        }
        self.entries.push(ConnectionEntry::reference(friend_id));
        true
    }

    /// Drops every entry pointing at `key`. Returns how many were removed.
    pub fn remove_entries_for(&mut self, key: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.key() != key);
        before - self.entries.len()
    }
}

/// Mutable simulator state a connection write may touch.
pub(crate) struct WriteContext<'a> {
    pub store: &'a mut GraphStore,
    pub sessions: &'a mut SessionManager,
    pub identities: &'a mut IdentityGenerator,
    pub now: i64,
}

/// One write request against a connection.
pub(crate) struct WriteRequest<'a> {
    pub owner: &'a str,
    pub relation: &'a str,
    pub access_token: Option<&'a str>,
    pub sub_path: &'a str,
    pub payload: &'a Map<String, Value>,
}

impl ConnectionKind {
    /// Executes a write with this connection's semantics.
    pub(crate) fn write(self, ctx: &mut WriteContext<'_>, req: &WriteRequest<'_>) -> Result<Value> {
        match self {
            Self::Generic { materialize } => write_generic(ctx, req, materialize),
            Self::Friends => write_friend(ctx, req),
            Self::TestUserProvisioning => provision_test_user(ctx, req),
        }
    }
}

fn write_generic(
    ctx: &mut WriteContext<'_>,
    req: &WriteRequest<'_>,
    materialize: Option<NodeKind>,
) -> Result<Value> {
    let key = if req.sub_path.is_empty() {
        mint_entry_id(ctx.store, req.owner)
    } else {
        req.sub_path.to_string()
    };

    let mut data = req.payload.clone();
    data.insert("created_time".to_string(), json!(ctx.now));
    if let Some(actor) = req.access_token.and_then(|t| ctx.sessions.user_for_token(t)) {
        let name = ctx
            .store
            .get(actor)
            .ok()
            .and_then(|o| o.field("name").cloned())
            .unwrap_or(Value::Null);
        data.insert("from".to_string(), json!({ "id": actor, "name": name }));
    }

    let entry = ConnectionEntry::with_data(&key, data);
    if let (Some(kind), true) = (materialize, req.sub_path.is_empty()) {
        let object = GraphObject::new(&key, kind).with_fields(entry.data().clone());
        ctx.store.set(&key, object);
    }
    ctx.store.connection(req.owner, req.relation)?.push(entry);

    debug!(owner = req.owner, relation = req.relation, id = %key, "connection entry written");
    Ok(json!({ "id": key }))
}

/// Mints `<owner>_<seq>`, skipping ids already taken by stored objects.
fn mint_entry_id(store: &mut GraphStore, owner: &str) -> String {
    loop {
        let key = format!("{owner}_{}", store.next_sequence());
        if !store.contains(&key) {
            return key;
        }
    }
}

fn write_friend(ctx: &mut WriteContext<'_>, req: &WriteRequest<'_>) -> Result<Value> {
    if req.sub_path.is_empty() {
        return Err(Error::NotFound(format!("{}/{}", req.owner, req.relation)));
    }
    let added = ctx
        .store
        .connection(req.owner, req.relation)?
        .add_friend(req.sub_path);
    debug!(owner = req.owner, friend = req.sub_path, added, "friend recorded");
    Ok(Value::Bool(true))
}

fn provision_test_user(ctx: &mut WriteContext<'_>, req: &WriteRequest<'_>) -> Result<Value> {
    if req.sub_path != TEST_USERS_PATH {
        return Err(Error::NotFound(format!(
            "{}/{}/{}",
            req.owner, req.relation, req.sub_path
        )));
    }

    let store = &*ctx.store;
    let identity = ctx.identities.generate(|id| store.contains(id));
    let user = GraphObject::new(&identity.id, NodeKind::User)
        .with_field("name", json!(identity.name))
        .with_field("first_name", json!(identity.first_name))
        .with_field("last_name", json!(identity.last_name))
        .with_field("email", json!(identity.email));
    ctx.store.set(&identity.id, user);

    if wants_install(req.payload) {
        ctx.sessions.install(&identity.id, &permissions_of(req.payload));
    }
    let access_token = ctx.sessions.issue_token(&identity.id);

    let mut record = Map::new();
    record.insert("access_token".to_string(), json!(access_token));
    ctx.store
        .connection(req.owner, req.relation)?
        .push(ConnectionEntry::with_data(&identity.id, record));

    info!(id = %identity.id, name = %identity.name, "provisioned test user");
    Ok(json!({
        "name": identity.name,
        "id": identity.id,
        "access_token": access_token,
    }))
}

/// `installed` arrives as a JSON bool from in-process callers and as the
/// string `"true"` through a form body.
fn wants_install(payload: &Map<String, Value>) -> bool {
    match payload.get("installed") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn permissions_of(payload: &Map<String, Value>) -> Vec<String> {
    match payload.get("permissions") {
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
