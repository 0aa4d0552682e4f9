//! Relation dispatch: which connection behaviour a `(kind, relation)` pair gets.

use std::collections::HashMap;

use super::types::NodeKind;

/// Sub-path under `accounts` that provisions test users.
pub const TEST_USERS_PATH: &str = "test-users";

/// Behaviour of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Ordered list of free-form entries.
    ///
    /// When `materialize` is set, entries written without a sub-path are
    /// also stored as standalone objects of that kind so they can be
    /// fetched and carry connections of their own.
    Generic {
        /// Kind of the object created for each new entry.
        materialize: Option<NodeKind>,
    },
    /// One `{id}` entry per distinct friend.
    Friends,
    /// `accounts/test-users`: writing provisions a synthetic user.
    TestUserProvisioning,
}

impl ConnectionKind {
    /// Returns true if the connection can be read at `sub_path`.
    #[must_use]
    pub fn accepts_read_path(self, sub_path: &str) -> bool {
        match self {
            Self::TestUserProvisioning => sub_path == TEST_USERS_PATH,
            Self::Generic { .. } | Self::Friends => sub_path.is_empty(),
        }
    }
}

/// Table from `(NodeKind, relation name)` to connection behaviour.
///
/// Built once when the store is created; lookups never allocate.
#[derive(Debug, Clone)]
pub struct RelationTable {
    entries: HashMap<NodeKind, HashMap<&'static str, ConnectionKind>>,
}

impl Default for RelationTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RelationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The relations the simulated graph exposes.
    #[must_use]
    pub fn standard() -> Self {
        let likes = ConnectionKind::Generic { materialize: None };
        Self::empty()
            .declare(
                NodeKind::Application,
                "accounts",
                ConnectionKind::TestUserProvisioning,
            )
            .declare(NodeKind::User, "friends", ConnectionKind::Friends)
            .declare(
                NodeKind::User,
                "feed",
                ConnectionKind::Generic {
                    materialize: Some(NodeKind::Post),
                },
            )
            .declare(NodeKind::User, "likes", likes)
            .declare(
                NodeKind::Post,
                "comments",
                ConnectionKind::Generic {
                    materialize: Some(NodeKind::Comment),
                },
            )
            .declare(NodeKind::Post, "likes", likes)
            .declare(NodeKind::Comment, "likes", likes)
    }

    /// Declares a relation (builder pattern). Re-declaring replaces the kind.
    #[must_use]
    pub fn declare(mut self, node: NodeKind, relation: &'static str, kind: ConnectionKind) -> Self {
        self.entries.entry(node).or_default().insert(relation, kind);
        self
    }

    /// Looks up the behaviour of `relation` on objects of kind `node`.
    #[must_use]
    pub fn lookup(&self, node: NodeKind, relation: &str) -> Option<ConnectionKind> {
        self.entries.get(&node)?.get(relation).copied()
    }

    /// Returns the relations declared for `node`, sorted by name.
    #[must_use]
    pub fn relations_for(&self, node: NodeKind) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .entries
            .get(&node)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}
