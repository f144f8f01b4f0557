//! JWT Token Handler
//! Mission: Sign and verify HS256 tokens carrying a subject and claim set

use crate::auth::models::TokenClaims;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde_json::{Map, Value};
use tracing::debug;

pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("token lifetime puts expiry out of range")]
    InvalidExpiry,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Sign `claims` for `subject`, stamping `sub`, `iat` and `exp`.
///
/// `subject` overrides any `sub` already present in `claims`.
pub fn sign(
    subject: &str,
    claims: &Map<String, Value>,
    secret: &str,
    ttl: Duration,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or(TokenError::InvalidExpiry)?;

    let mut payload = claims.clone();
    payload.insert("sub".to_string(), Value::String(subject.to_string()));
    payload.insert("iat".to_string(), Value::from(now.timestamp()));
    payload.insert("exp".to_string(), Value::from(expiration.timestamp()));

    encode(
        &Header::new(Algorithm::HS256),
        &payload,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Signing)
}

/// Verify signature and expiry, returning the embedded claims.
pub fn verify(token: &str, secret: &str) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

/// JWT handler bound to one secret and token lifetime
#[derive(Clone)]
pub struct JwtHandler {
    secret: String,
    expiration: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            expiration: Duration::hours(DEFAULT_EXPIRATION_HOURS),
        }
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    pub fn sign(&self, subject: &str, claims: &Map<String, Value>) -> Result<String, TokenError> {
        debug!(
            subject,
            expires_in_secs = self.expiration.num_seconds(),
            "Signing JWT"
        );
        sign(subject, claims, &self.secret, self.expiration)
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let claims = verify(token, &self.secret)?;
        debug!(subject = %claims.sub, "Validated JWT");
        Ok(claims)
    }
}

impl std::fmt::Debug for JwtHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtHandler")
            .field("secret", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}
