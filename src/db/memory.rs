use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::models::{NewUser, User};
use crate::db::UserStore;
use crate::error::DatabaseError;

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

/// In-process credential store with the same uniqueness rules as the `users` table.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    table: Arc<RwLock<Table>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, DatabaseError> {
        let mut table = self.table.write().await;

        // Checked under the write lock, like the table's unique constraints.
        if table
            .rows
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(DatabaseError::Duplicate);
        }

        table.next_id += 1;
        let now = Utc::now();
        let created = User {
            id: table.next_id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(created.id, created.clone());

        Ok(created)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser::new(username, email, "$2b$04$notarealhash".into())
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = MemoryUserStore::new();
        let created = store.create_user(&new_user("Alice", "alice@x.com")).await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.username, "alice");

        let by_name = store.get_user_by_username("alice").await.unwrap().unwrap();
        let by_email = store.get_user_by_email("alice@x.com").await.unwrap().unwrap();
        let by_id = store.get_user_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_id.username, "alice");
    }

    #[tokio::test]
    async fn test_uniqueness_is_enforced() {
        let store = MemoryUserStore::new();
        store.create_user(&new_user("bob", "bob@x.com")).await.unwrap();

        let same_name = store.create_user(&new_user("BOB", "other@x.com")).await;
        assert!(matches!(same_name, Err(DatabaseError::Duplicate)));

        let same_email = store.create_user(&new_user("robert", "bob@x.com")).await;
        assert!(matches!(same_email, Err(DatabaseError::Duplicate)));

        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryUserStore::new();
        let created = store.create_user(&new_user("carol", "carol@x.com")).await.unwrap();

        assert!(store.delete_user(created.id).await.unwrap());
        assert!(!store.delete_user(created.id).await.unwrap());
        assert!(store.get_user_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_registrations_keep_one_winner() {
        let store = MemoryUserStore::new();
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_user(&new_user("dave", &format!("dave{}@x.com", i)))
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
