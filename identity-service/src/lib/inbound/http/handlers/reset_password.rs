use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldErrors;
use super::RequestJson;
use crate::domain::user::models::Password;
use crate::domain::user::models::ResetPasswordCommand;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn reset_password(
    State(state): State<AppState>,
    RequestJson(body): RequestJson<ResetPasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    state
        .identity_service
        .reset_password(body.try_into_command()?)
        .await
        .map_err(|e| match e {
            UserError::InvalidOrExpiredToken => {
                ApiError::BadRequest("Reset token is invalid or expired".to_string())
            }
            e => ApiError::from(e),
        })
        .map(|_| {
            ApiSuccess::message(
                StatusCode::OK,
                "Password reset successful, please login with new password",
            )
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    token: String,
    new_password: String,
}

impl ResetPasswordRequest {
    fn try_into_command(self) -> Result<ResetPasswordCommand, ApiError> {
        let mut errors = FieldErrors::default();

        let token = errors.require("token", self.token, "Reset token cannot be empty");
        let new_password = errors.check(
            "newPassword",
            Password::new(self.new_password)
                .map_err(|_| "New password must be at least 6 characters"),
        );

        match (token, new_password) {
            (Some(token), Some(new_password)) => Ok(ResetPasswordCommand {
                token,
                new_password,
            }),
            _ => Err(errors.into()),
        }
    }
}
