//! Auth Service
//! Mission: Register and authenticate users against an injected store

use crate::auth::{
    jwt::{JwtHandler, TokenError},
    models::{SessionUser, UserRecord, UserWithToken, ValidationError},
    password::{hash_password_async, verify_password_async, DEFAULT_COST},
    user_store::{StoreError, UserStore},
};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            AuthError::Validation(e) => Some(e),
            AuthError::Internal(_) => None,
        }
    }
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt: JwtHandler,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtHandler) -> Self {
        Self {
            store,
            jwt,
            bcrypt_cost: DEFAULT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn jwt(&self) -> &JwtHandler {
        &self.jwt
    }

    /// Create a user node and return it with a freshly signed token.
    ///
    /// A duplicate email fails with a validation error on the `email` field.
    pub async fn register(
        &self,
        email: &str,
        plain_password: &str,
        name: &str,
    ) -> Result<UserWithToken, AuthError> {
        let encrypted = hash_password_async(plain_password, self.bcrypt_cost).await?;

        let user = match self.store.create_user(email, &encrypted, name).await {
            Ok(user) => user,
            Err(StoreError::ConstraintViolation { .. }) => {
                warn!("Registration rejected: email already taken");
                return Err(ValidationError::new(
                    "An account already exists with the email address",
                    "email",
                    "Email address already taken",
                )
                .into());
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to create user").into()),
        };

        info!(user_id = %user.user_id, "Registered user");
        self.issue(user)
    }

    /// Check credentials and return the user with a freshly signed token.
    pub async fn authenticate(
        &self,
        email: &str,
        plain_password: &str,
    ) -> Result<UserWithToken, AuthError> {
        let user = match self.store.find_user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                warn!("Login failed: unknown email");
                return Err(
                    ValidationError::new("Incorrect email", "email", "Incorrect email").into(),
                );
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to look up user").into()),
        };

        if !verify_password_async(plain_password, &user.password).await? {
            warn!(user_id = %user.user_id, "Login failed: incorrect password");
            return Err(
                ValidationError::new("Incorrect password", "password", "Incorrect password")
                    .into(),
            );
        }

        info!(user_id = %user.user_id, "Login successful");
        self.issue(UserRecord::from(&user))
    }

    /// Identity carried by a token; no store lookup.
    pub fn current_user(&self, token: &str) -> Result<SessionUser, TokenError> {
        let claims = self.jwt.verify(token)?;
        Ok(SessionUser::from(&claims))
    }

    fn issue(&self, user: UserRecord) -> Result<UserWithToken, AuthError> {
        let token = self
            .jwt
            .sign(&user.user_id, &user.to_claims())
            .context("Failed to sign token")?;
        Ok(user.with_token(token))
    }
}
