//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::auth::{
    jwt::{JwtHandler, TokenError},
    models::TokenClaims,
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

/// Auth middleware that validates the bearer token
pub async fn auth_middleware(
    State(jwt_handler): State<JwtHandler>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthRejection::MissingToken)?;

    let claims = jwt_handler.verify(bearer.token()).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        match e {
            TokenError::Expired => AuthRejection::ExpiredToken,
            _ => AuthRejection::InvalidToken,
        }
    })?;

    // Handlers read the claims back through `extract_claims`
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extract claims from request (use after auth middleware)
pub fn extract_claims(req: &Request) -> Option<&TokenClaims> {
    req.extensions().get::<TokenClaims>()
}

/// Reasons a request is turned away before reaching the handler
#[derive(Debug)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AuthRejection::MissingToken => "Missing authorization token",
            AuthRejection::InvalidToken => "Invalid token",
            AuthRejection::ExpiredToken => "Token expired",
        };

        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}
