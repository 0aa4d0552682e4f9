//! In-memory social graph: objects, connections and relation dispatch.
//!
//! # Example
//!
//! ```rust
//! use fbgraph_core::graph::{GraphObject, GraphStore, NodeKind};
//!
//! let mut store = GraphStore::new();
//! store.set("1001", GraphObject::new("1001", NodeKind::User));
//! store.connection("1001", "friends").unwrap().add_friend("1002");
//!
//! let friends = store.peek_connection("1001", "friends").unwrap().unwrap();
//! assert_eq!(friends.read(None)[0]["id"], "1002");
//! assert!(store.connection("1001", "photos").is_err());
//! ```

mod connection;
pub mod names;
mod relations;
mod store;
mod types;


pub use connection::Connection;
pub(crate) use connection::{WriteContext, WriteRequest};
pub use names::{IdentityGenerator, SyntheticUser, TEST_USER_ID_PREFIX};
pub use relations::{ConnectionKind, RelationTable, TEST_USERS_PATH};
pub use store::GraphStore;
pub use types::{ConnectionEntry, GraphObject, NodeKind};
