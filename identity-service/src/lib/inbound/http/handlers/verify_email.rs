use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn verify_email(
    State(state): State<AppState>,
    Query(params): Query<VerifyEmailParams>,
) -> Result<ApiSuccess<()>, ApiError> {
    let token = params
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Verification token cannot be empty".to_string()))?;

    state
        .identity_service
        .verify_email(&token)
        .await
        .map_err(|e| match e {
            UserError::InvalidOrExpiredToken => {
                ApiError::BadRequest("Verification token is invalid or expired".to_string())
            }
            e => ApiError::from(e),
        })
        .map(|_| {
            ApiSuccess::message(
                StatusCode::OK,
                "Email verification successful! You can now use all platform features.",
            )
        })
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyEmailParams {
    token: Option<String>,
}
