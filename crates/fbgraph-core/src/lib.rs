//! # fbgraph
//!
//! Client library and in-process simulator for a social-graph HTTP API.
//!
//! The simulator keeps a small graph of applications, users, posts and
//! comments in memory and answers the same requests the remote service
//! does, so application code can be tested without a network.
//!
//! ## Features
//!
//! - **Graph simulator**: objects, relation-typed connections, search
//! - **Test users**: provisioning through `<app_id>/accounts/test-users`
//! - **Sessions**: access tokens, `me` resolution, installations
//! - **Token codecs**: MD5-signed cookies and HMAC-SHA256 signed requests
//! - **Clients**: one [`GraphClient`] trait over the in-process facade and
//!   an HTTP client driven by a pluggable [`Transport`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use fbgraph_core::{ConnectionQuery, Graph, GraphClient};
//!
//! fn main() -> Result<(), fbgraph_core::Error> {
//!     let graph = Arc::new(Graph::new("app", "s3cr3t")?);
//!
//!     let alice = graph.create_user(true, &["publish_stream"], serde_json::Map::new())?;
//!     let bob = graph.create_user(true, &[], serde_json::Map::new())?;
//!     alice.friend(&bob)?;
//!
//!     let friends = alice
//!         .graph_api()?
//!         .fetch_connections("me", "friends", &ConnectionQuery::new())?;
//!     assert_eq!(friends["data"][0]["id"], bob.id());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::manual_assert
    )
)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod session;
pub mod simulator;

#[cfg(test)]
mod error_tests;

pub use auth::{
    build_signed_request, decode_cookie_token, encode_cookie_token, parse_signed_request,
    user_from_cookies, SignedRequest,
};
pub use client::{
    get_oauth_access_token, ConnectionQuery, FetchOptions, GraphApi, GraphClient, Method,
    MockGraphApi, SimulatorTransport, TestUser, TestUserRecord, Transport, TransportResponse,
};
pub use config::{ConfigError, GraphConfig};
pub use error::{Error, Result};
pub use graph::{ConnectionKind, GraphObject, GraphStore, NodeKind, RelationTable};
pub use session::SessionManager;
pub use simulator::{Graph, RealtimeEntry, RealtimeUpdate};
