use auth::JwtError;
use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

/// Extension type holding the caller resolved from the bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub user: User,
}

/// Middleware that validates the session token, loads its user and adds it
/// to request extensions
///
/// Expired or forged tokens are rejected before the store is touched.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(&req)?;

    let claims = state.authenticator.validate_token(token).map_err(|e| {
        tracing::warn!(error = %e, "Session token rejected");
        match e {
            JwtError::Expired => {
                ApiError::Unauthorized("Token expired, please login again".to_string())
            }
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        }
    })?;

    let user_id = UserId::from_string(&claims.sub).map_err(|e| {
        tracing::warn!(error = %e, "Session token subject is not a user ID");
        ApiError::Unauthorized("Invalid token".to_string())
    })?;

    let user = state
        .identity_service
        .get_user(&user_id)
        .await
        .map_err(|e| match e {
            UserError::NotFound(_) => {
                tracing::warn!(user_id = %user_id, "Session token for missing user");
                ApiError::Unauthorized("Invalid token, user does not exist".to_string())
            }
            e => ApiError::from(e),
        })?;

    req.extensions_mut()
        .insert(AuthenticatedUser { user_id, user });

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, ApiError> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Access denied, please provide a valid token".to_string())
        })
}
