//! Access tokens and application installation state.

use std::collections::{HashMap, HashSet};

use md5::{Digest, Md5};
use tracing::{info, warn};

use crate::auth::SignedRequest;
use crate::error::{Error, Result};

/// Maps access tokens to users and tracks who installed the application.
///
/// Tokens are derived deterministically from the user id, so the same user
/// always receives the same token until it is rotated.
#[derive(Debug, Default)]
pub struct SessionManager {
    /// user id -> token.
    user_tokens: HashMap<String, String>,
    /// token -> user id.
    token_users: HashMap<String, String>,
    /// user id -> number of rotations so far.
    rotations: HashMap<String, u32>,
    /// user id -> permissions granted at install time.
    installed: HashMap<String, HashSet<String>>,
}

impl SessionManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the user behind `"me"`.
    pub fn resolve_me(&self, access_token: Option<&str>) -> Result<String> {
        let token = access_token.ok_or(Error::AuthRequired)?;
        self.token_users.get(token).cloned().ok_or_else(|| {
            warn!("rejected unknown access token");
            Error::InvalidToken(token.to_string())
        })
    }

    /// Returns the user a token belongs to, if any.
    #[must_use]
    pub fn user_for_token(&self, access_token: &str) -> Option<&str> {
        self.token_users.get(access_token).map(String::as_str)
    }

    /// Returns the current token of a user, if one was issued.
    #[must_use]
    pub fn token_for_user(&self, user_id: &str) -> Option<&str> {
        self.user_tokens.get(user_id).map(String::as_str)
    }

    /// Returns the user's token, issuing one on first use.
    ///
    /// A derived token already held by another user is skipped by advancing
    /// the rotation counter, so every token resolves to exactly one user.
    pub fn issue_token(&mut self, user_id: &str) -> String {
        if let Some(token) = self.user_tokens.get(user_id) {
            return token.clone();
        }
        let mut rotation = self.rotations.get(user_id).copied().unwrap_or(0);
        let mut token = derive_token(user_id, rotation);
        while self
            .token_users
            .get(&token)
            .is_some_and(|owner| owner != user_id)
        {
            rotation += 1;
            token = derive_token(user_id, rotation);
        }
        if rotation > 0 {
            self.rotations.insert(user_id.to_string(), rotation);
        }
        self.user_tokens.insert(user_id.to_string(), token.clone());
        self.token_users.insert(token.clone(), user_id.to_string());
        token
    }

    /// Invalidates the user's current token and issues a fresh one.
    pub fn rotate_token(&mut self, user_id: &str) -> String {
        if let Some(old) = self.user_tokens.remove(user_id) {
            self.token_users.remove(&old);
        }
        *self.rotations.entry(user_id.to_string()).or_insert(0) += 1;
        self.issue_token(user_id)
    }

    /// Forgets every token and the installation of a user.
    pub fn revoke(&mut self, user_id: &str) {
        if let Some(token) = self.user_tokens.remove(user_id) {
            self.token_users.remove(&token);
        }
        self.installed.remove(user_id);
    }

    /// Marks the user as having installed the application.
    ///
    /// Installing again adds to the granted permissions.
    pub fn install<S: AsRef<str>>(&mut self, user_id: &str, permissions: &[S]) {
        info!(user_id, permissions = permissions.len(), "installing application");
        self.installed
            .entry(user_id.to_string())
            .or_default()
            .extend(permissions.iter().map(|p| p.as_ref().to_string()));
    }

    /// Removes the installation. Returns false if the user had not installed.
    pub fn uninstall(&mut self, user_id: &str) -> bool {
        info!(user_id, "uninstalling application");
        self.installed.remove(user_id).is_some()
    }

    /// Returns true if the user installed the application.
    #[must_use]
    pub fn is_installed(&self, user_id: &str) -> bool {
        self.installed.contains_key(user_id)
    }

    /// Returns the permissions granted by an installed user, sorted.
    #[must_use]
    pub fn permissions(&self, user_id: &str) -> Option<Vec<String>> {
        self.installed.get(user_id).map(|set| {
            let mut perms: Vec<String> = set.iter().cloned().collect();
            perms.sort();
            perms
        })
    }

    /// Builds the signed request the application would receive for `user_id`.
    ///
    /// Installed users get their access token embedded; everyone else gets
    /// an anonymous payload.
    pub fn build_signed_request_for(
        &mut self,
        user_id: &str,
        app_secret: &str,
        issued_at: i64,
    ) -> Result<String> {
        let token = if self.is_installed(user_id) {
            Some(self.issue_token(user_id))
        } else {
            None
        };
        SignedRequest::new(user_id, token.as_deref(), issued_at).encode(app_secret)
    }
}

fn derive_token(user_id: &str, rotation: u32) -> String {
    let mut hasher = Md5::new();
    hasher.update(user_id.as_bytes());
    if rotation > 0 {
        hasher.update(format!(":{rotation}").as_bytes());
    }
    hex::encode(hasher.finalize())
}
