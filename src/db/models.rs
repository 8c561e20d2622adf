use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user ready to be persisted. Only ever holds the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password_hash: String) -> Self {
        Self {
            username: normalize_username(username),
            email: email.to_string(),
            password_hash,
        }
    }
}

/// Usernames are stored and looked up in lowercase.
pub fn normalize_username(username: &str) -> String {
    username.to_lowercase()
}
