//! Authentication Models
//! Mission: Define user, claim and request/response shapes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// User node as held by the store, including the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String, // bcrypt hash - never serialize
}

/// Safe properties returned by the store after creating a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

impl From<&StoredUser> for UserRecord {
    fn from(user: &StoredUser) -> Self {
        Self {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

impl UserRecord {
    /// Claims embedded in a token issued for this user
    pub fn to_claims(&self) -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), Value::String(self.user_id.clone()));
        claims.insert("userId".to_string(), Value::String(self.user_id.clone()));
        claims.insert("name".to_string(), Value::String(self.name.clone()));
        claims
    }

    pub fn with_token(self, token: String) -> UserWithToken {
        UserWithToken {
            token,
            user_id: self.user_id,
            email: self.email,
            name: self.name,
        }
    }
}

/// Public user view returned by register and login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithToken {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub name: String,
}

/// Decoded token payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Every claim besides the registered ones, unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User identity recovered from a token, without touching the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: String,
    pub name: String,
}

impl From<&TokenClaims> for SessionUser {
    fn from(claims: &TokenClaims) -> Self {
        let name = claims
            .extra
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            user_id: claims.sub.clone(),
            name,
        }
    }
}

/// User-correctable failure: a summary plus field -> message details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, field: &str, detail: impl Into<String>) -> Self {
        let mut details = BTreeMap::new();
        details.insert(field.to_string(), detail.into());
        Self {
            message: message.into(),
            details,
        }
    }

    /// Message attached to `field`, if any
    pub fn field(&self, field: &str) -> Option<&str> {
        self.details.get(field).map(String::as_str)
    }
}

/// Register request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
