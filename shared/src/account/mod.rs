pub mod handle;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a user account.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    SuperUser,
    Admin,
}

impl Role {
    /// Whether this role reads posts regardless of their visibility.
    #[inline]
    pub fn elevated(self) -> bool {
        matches!(self, Role::SuperUser | Role::Admin)
    }
}

/// A registered user.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The only id of this user.
    pub id: String,
    /// Unique among non-deleted users.
    pub phone: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub role: Role,
    /// Sha256 digest of the password, absent for code-only accounts.
    /// Stripped from every record exposed outside the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_sha: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Users are never removed physically, only flagged.
    #[serde(default)]
    pub deleted: bool,
}

/// An issued SMS verification code. At most one per phone number.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SmsCode {
    pub phone: String,
    pub code: String,
    /// What the code was requested for (register, login, reset...).
    pub scene: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// An opaque access token bound to a user.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}
