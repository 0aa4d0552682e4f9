//! Synthetic test users provisioned through `<app_id>/accounts/test-users`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::auth::build_signed_request;
use crate::error::{Error, Result};
use crate::graph::TEST_USERS_PATH;

use super::query::{ConnectionQuery, FetchOptions};
use super::GraphClient;

/// What the provisioning and listing endpoints return for a test user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUserRecord {
    /// User id.
    pub id: String,
    /// Display name; only present right after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The user's access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// A test user together with a client acting as that user.
#[derive(Debug, Clone)]
pub struct TestUser<C> {
    record: TestUserRecord,
    client: C,
}

fn test_users_relation() -> String {
    format!("accounts/{TEST_USERS_PATH}")
}

impl<C: GraphClient> TestUser<C> {
    /// Wraps a record, deriving a client that acts with the user's token.
    #[must_use]
    pub fn from_record(app_client: &C, record: TestUserRecord) -> Self {
        let client = app_client.with_access_token(record.access_token.as_deref());
        Self { record, client }
    }

    /// Provisions a new test user of `app_id`.
    ///
    /// `app_client` acts as the application.
    pub fn create(
        app_client: &C,
        app_id: &str,
        installed: bool,
        permissions: &[&str],
    ) -> Result<Self> {
        let mut data = Map::new();
        data.insert("installed".to_string(), json!(installed));
        if !permissions.is_empty() {
            data.insert("permissions".to_string(), json!(permissions.join(",")));
        }

        let created = app_client.put(app_id, &test_users_relation(), &data)?;
        let record: TestUserRecord = serde_json::from_value(created)?;
        info!(id = %record.id, installed, "test user created");
        Ok(Self::from_record(app_client, record))
    }

    /// Lists every test user of `app_id`.
    pub fn list_all(app_client: &C, app_id: &str) -> Result<Vec<Self>> {
        let listing =
            app_client.fetch_connections(app_id, &test_users_relation(), &ConnectionQuery::new())?;
        let records: Vec<TestUserRecord> = match listing.get("data") {
            Some(data) => serde_json::from_value(data.clone())?,
            None => Vec::new(),
        };
        Ok(records
            .into_iter()
            .map(|record| Self::from_record(app_client, record))
            .collect())
    }

    /// Deletes every test user of `app_id`. Returns how many were deleted.
    pub fn delete_all(app_client: &C, app_id: &str) -> Result<usize> {
        let users = Self::list_all(app_client, app_id)?;
        for user in &users {
            app_client.delete(user.id())?;
        }
        info!(app_id, count = users.len(), "test users deleted");
        Ok(users.len())
    }

    /// Returns the user id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Returns the display name reported at creation, if known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.record.name.as_deref()
    }

    /// Returns the user's access token, if known.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.record.access_token.as_deref()
    }

    /// Returns the provisioning record.
    #[must_use]
    pub fn record(&self) -> &TestUserRecord {
        &self.record
    }

    /// Returns a client acting as this user.
    pub fn graph_api(&self) -> Result<&C> {
        if self.client.access_token().is_none() {
            return Err(Error::AuthRequired);
        }
        Ok(&self.client)
    }

    /// Fetches the user's own profile through `me`.
    pub fn profile(&self) -> Result<Value> {
        self.graph_api()?.fetch("me", &FetchOptions::new())
    }

    /// Makes the two users friends of each other.
    pub fn friend(&self, other: &Self) -> Result<()> {
        other
            .graph_api()?
            .put(other.id(), &format!("friends/{}", self.id()), &Map::new())?;
        self.graph_api()?
            .put(self.id(), &format!("friends/{}", other.id()), &Map::new())?;
        Ok(())
    }

    /// Builds the signed request the application would receive for this user.
    pub fn build_signed_request(&self, app_secret: &str) -> Result<String> {
        build_signed_request(self.id(), self.access_token(), app_secret)
    }
}
