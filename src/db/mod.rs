//! Database module for the community server
//!
//! This module holds the user model, the `UserStore` abstraction the
//! authentication layer depends on, and its Postgres and in-memory backends.

pub mod memory;
pub mod models;
pub mod operations;

use async_trait::async_trait;

use crate::error::DatabaseError;

pub use memory::MemoryUserStore;
pub use models::{normalize_username, NewUser, User};
pub use operations::DbOperations;

/// Credential store. Implementations must be safe to share across workers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    /// `username` must already be normalized.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    /// Fails with `DatabaseError::Duplicate` when the username or email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, DatabaseError>;

    /// Returns whether a row was removed.
    async fn delete_user(&self, id: i64) -> Result<bool, DatabaseError>;
}
