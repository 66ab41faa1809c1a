use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_db(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// The role an admin toggle switches a profile to.
    pub fn toggled(&self) -> Role {
        match self {
            Role::User => Role::Admin,
            Role::Admin => Role::User,
        }
    }
}

/// Identity issued by the auth service. Read-only on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// One row per user identity, created by a backend trigger on signup.
/// The app observes and mutates these rows but never creates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub role: Role,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Derived on every resolution, never persisted.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin && !self.banned
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the `videos` table. The row is only written after the
/// object named by `storage_path` is durable in the video bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVideo {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub storage_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl Session {
    /// True when the access token expires within `secs` seconds; such a
    /// token must not be handed out without a refresh first.
    pub fn expires_within(&self, secs: i64) -> bool {
        self.expires_at - Utc::now() < chrono::Duration::seconds(secs)
    }
}
