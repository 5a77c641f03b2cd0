use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldErrors;
use super::RequestJson;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

/// Same body whether or not the email belongs to an account.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If the email is registered, password reset email has been sent";

pub async fn forgot_password(
    State(state): State<AppState>,
    RequestJson(body): RequestJson<ForgotPasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    let mut errors = FieldErrors::default();
    let email = errors
        .check(
            "email",
            EmailAddress::new(body.email).map_err(|_| "Please enter a valid email address"),
        )
        .ok_or(errors)?;

    state
        .identity_service
        .request_password_reset(&email)
        .await
        .map_err(|e| match e {
            UserError::DeliveryFailed(_) => ApiError::DeliveryFailed(
                "Password reset email failed to send, please try again later".to_string(),
            ),
            e => ApiError::from(e),
        })
        .map(|_| ApiSuccess::message(StatusCode::OK, RESET_REQUESTED_MESSAGE))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    email: String,
}
