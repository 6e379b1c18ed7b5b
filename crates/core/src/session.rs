//! Session store.
//!
//! A session is the pair (token, user profile). It is either fully present
//! or fully absent: `load` never returns half a session, and any partial or
//! corrupt persisted state is wiped on read.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use telemetry::{health, ComponentHealth};
use tracing::{debug, warn};
use validator::Validate;

use crate::error::{Error, Result};
use crate::storage::SessionStorage;

/// Storage key of the opaque token.
pub const TOKEN_KEY: &str = "token";

/// Storage key of the serialized user profile.
pub const USER_KEY: &str = "user";

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Landing view after login.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Self::User => "/dashboard",
            Self::Admin => "/admindashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User id as issued by the API, numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// The user part of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserProfile {
    pub fn new(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            name: None,
            email: None,
        }
    }
}

/// A complete session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user: UserProfile,
}

impl Session {
    pub fn new(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Credentials posted to the API's login endpoint.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginRequest {
    /// Validates the credential shape before anything is sent.
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::validation(format!("invalid login request: {}", e)))
    }
}

/// Successful login response from the API.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Process-wide session store over a persistent [`SessionStorage`].
///
/// Writers are login, logout and the access gate; everyone else reads
/// snapshots through [`SessionStore::load`]. Every storage call reports
/// into the `session_storage` health component.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    health: &'static ComponentHealth,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_health(storage, &health().session_storage)
    }

    /// Store reporting into a specific health component.
    pub fn with_health(storage: Arc<dyn SessionStorage>, health: &'static ComponentHealth) -> Self {
        Self { storage, health }
    }

    /// Reads the persisted session from one storage snapshot.
    ///
    /// If the snapshot holds only one entry, or the user payload does not
    /// parse, both entries are cleared and `None` is returned. The clear is
    /// skipped when a writer replaced the entries after the snapshot.
    pub fn load(&self) -> Option<Session> {
        let snapshot = match self.storage.get_many(&[TOKEN_KEY, USER_KEY]) {
            Ok(values) => {
                self.health.set_healthy();
                values
            }
            Err(e) => {
                warn!(error = %e, "Session storage read failed");
                self.health.set_unhealthy(e.to_string());
                return None;
            }
        };
        let mut entries = snapshot.into_iter();
        let token = entries.next().flatten();
        let user = entries.next().flatten();

        match (token.as_deref(), user.as_deref()) {
            (None, None) => None,
            (Some(t), Some(raw_user)) if !t.is_empty() => {
                match serde_json::from_str::<UserProfile>(raw_user) {
                    Ok(user) => Some(Session::new(t, user)),
                    Err(e) => {
                        warn!(error = %e, "Persisted user profile is corrupt, clearing session");
                        self.heal(token.as_deref(), Some(raw_user));
                        None
                    }
                }
            }
            (t, u) => {
                warn!("Persisted session is incomplete, clearing session");
                self.heal(t, u);
                None
            }
        }
    }

    /// Persists a session. Both entries are written in one storage step.
    pub fn save(&self, token: &str, user: &UserProfile) -> Result<Session> {
        if token.is_empty() {
            return Err(Error::validation("session token must not be empty"));
        }
        let raw_user = serde_json::to_string(user)?;
        self.report(
            self.storage
                .set_many(&[(TOKEN_KEY, token), (USER_KEY, raw_user.as_str())]),
        )?;
        debug!(user_id = %user.id, role = %user.role, "Session saved");
        Ok(Session::new(token, user.clone()))
    }

    /// Removes both entries. Idempotent.
    pub fn clear(&self) -> Result<()> {
        self.report(self.storage.remove_many(&[TOKEN_KEY, USER_KEY]))?;
        debug!("Session cleared");
        Ok(())
    }

    /// Clears the session only while it still holds `token`. Returns
    /// whether it was cleared.
    pub fn clear_if_token(&self, token: &str) -> Result<bool> {
        let snapshot = self.report(self.storage.get_many(&[TOKEN_KEY, USER_KEY]))?;
        let mut entries = snapshot.into_iter();
        if entries.next().flatten().as_deref() != Some(token) {
            return Ok(false);
        }
        let user = entries.next().flatten();
        let cleared = self.report(
            self.storage
                .remove_if_unchanged(&[(TOKEN_KEY, Some(token)), (USER_KEY, user.as_deref())]),
        )?;
        if cleared {
            debug!("Session cleared");
        }
        Ok(cleared)
    }

    pub fn is_authenticated(&self) -> bool {
        self.load().is_some()
    }

    /// Clears the entries seen in an inconsistent snapshot, unless they
    /// changed since.
    fn heal(&self, token: Option<&str>, user: Option<&str>) {
        match self
            .storage
            .remove_if_unchanged(&[(TOKEN_KEY, token), (USER_KEY, user)])
        {
            Ok(true) => debug!("Inconsistent session cleared"),
            Ok(false) => debug!("Session rewritten since read, keeping it"),
            Err(e) => {
                warn!(error = %e, "Failed to clear session storage");
                self.health.set_unhealthy(e.to_string());
            }
        }
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.health.set_healthy(),
            Err(e) => self.health.set_unhealthy(e.to_string()),
        }
        result
    }
}
