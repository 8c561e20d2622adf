use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::password::{PasswordHasher, MAX_PASSWORD_BYTES};
use crate::auth::token::TokenService;
use crate::config::AuthConfig;
use crate::db::{normalize_username, NewUser, User, UserStore};
use crate::error::{AppError, DatabaseError};

pub const USER_NOT_FOUND: &str = "User not found";

pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(config.bcrypt_cost),
            tokens: TokenService::new(&config.jwt_secret, config.token_expiry_hours),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Check credentials and return a signed token.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, AppError> {
        let username = normalize_username(username);

        let user = self
            .users
            .get_user_by_username(&username)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))?;

        if !self.verify_password(password, &user.password_hash).await? {
            warn!("Wrong password for user {}", user.id);
            return Err(AppError::BadCredentials);
        }

        self.tokens.issue(&user)
    }

    /// Create a user after the uniqueness checks; only the hash is persisted.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "Email, username and password are required".into(),
            ));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::ValidationError(format!(
                "Password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        let username = normalize_username(username);
        let email_taken = self.users.get_user_by_email(email).await?.is_some();
        let username_taken = self.users.get_user_by_username(&username).await?.is_some();

        match (username_taken, email_taken) {
            (true, true) => return Err(AppError::Conflict("Username and email already taken".into())),
            (false, true) => return Err(AppError::Conflict("Email already registered".into())),
            (true, false) => return Err(AppError::Conflict("Username already registered".into())),
            (false, false) => {}
        }

        let password_hash = self.hash_password(password).await?;
        let new_user = NewUser::new(&username, email, password_hash);

        let user = self.users.create_user(&new_user).await.map_err(|e| match e {
            // Lost a race with a concurrent registration.
            DatabaseError::Duplicate => AppError::Conflict("Username or email already registered".into()),
            other => AppError::DatabaseError(other),
        })?;

        info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let hasher = self.hasher;
        let password = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;
        Ok(hash)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let hasher = self.hasher;
        let password = password.to_owned();
        let hash = hash.to_owned();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await??;
        Ok(matched)
    }
}
