use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenManager;
use crate::db::models::{NewUser, PublicUser};
use crate::db::repository::UserRepository;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::Result;

/// Identity established from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: Arc<TokenManager>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        tokens: Arc<TokenManager>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            token_ttl,
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<PublicUser> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::UserExists.into());
        }

        let password_hash = self.hasher.hash(password).await?;
        let new_user = NewUser {
            username: username.to_string(),
            password_hash,
        };

        // The lookup above races with concurrent registrations; the unique
        // constraint decides.
        let user = match self.users.create(&new_user).await {
            Ok(user) => user,
            Err(AppError::DatabaseError(DatabaseError::Duplicate)) => {
                return Err(AuthError::UserExists.into());
            }
            Err(e) => return Err(e),
        };

        info!("Registered user {} (id: {})", user.username, user.id);
        Ok(user.to_public())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let Some(user) = self.users.find_by_username(username).await? else {
            self.hasher.verify_dummy(password).await;
            debug!("Login rejected: unknown username");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !self.hasher.verify(password, &user.password_hash).await {
            debug!("Login rejected: password mismatch for user id {}", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.tokens.issue(user.id, &user.username, self.token_ttl)?;
        info!("Issued session token for user id {}", user.id);
        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = self.tokens.verify(token)?;
        Ok(AuthenticatedUser {
            id: claims.user_id,
            username: claims.username,
        })
    }
}
