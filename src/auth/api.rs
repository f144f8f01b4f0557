//! Authentication API Endpoints
//! Mission: Expose register, login and current-user over HTTP

use crate::auth::{
    middleware::extract_claims,
    models::{LoginRequest, RegisterRequest, SessionUser, UserWithToken, ValidationError},
    service::{AuthError, AuthService},
};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub service: Arc<AuthService>,
}

impl AuthState {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserWithToken>), AuthApiError> {
    let Json(payload) = payload?;

    let user = state
        .service
        .register(&payload.email, &payload.password, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<UserWithToken>, AuthApiError> {
    let Json(payload) = payload?;

    let user = state
        .service
        .authenticate(&payload.email, &payload.password)
        .await?;

    Ok(Json(user))
}

/// Get current user info - GET /api/auth/me
/// Built from the JWT claims, no database lookup
pub async fn get_current_user(req: Request) -> Result<Json<SessionUser>, AuthApiError> {
    let claims = extract_claims(&req).ok_or(AuthApiError::Unauthorized)?;
    Ok(Json(SessionUser::from(claims)))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    Validation(ValidationError),
    /// Body could not be read as the endpoint's JSON shape
    InvalidBody(StatusCode, ValidationError),
    Unauthorized,
    InternalError,
}

impl From<AuthError> for AuthApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(e) => AuthApiError::Validation(e),
            AuthError::Internal(e) => {
                error!("Auth request failed: {:#}", e);
                AuthApiError::InternalError
            }
        }
    }
}

impl From<JsonRejection> for AuthApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected request body");
        AuthApiError::InvalidBody(
            rejection.status(),
            ValidationError::new("Invalid request body", "body", rejection.body_text()),
        )
    }
}

fn validation_response(status: StatusCode, e: ValidationError) -> Response {
    (
        status,
        Json(json!({
            "error": "ValidationError",
            "message": e.message,
            "details": e.details,
        })),
    )
        .into_response()
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        match self {
            AuthApiError::Validation(e) => {
                validation_response(StatusCode::UNPROCESSABLE_ENTITY, e)
            }
            AuthApiError::InvalidBody(status, e) => validation_response(status, e),
            AuthApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required").into_response()
            }
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
