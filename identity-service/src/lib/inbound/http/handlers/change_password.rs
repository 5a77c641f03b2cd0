use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldErrors;
use super::RequestJson;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::Password;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn change_password(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    RequestJson(body): RequestJson<ChangePasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    state
        .identity_service
        .change_password(&authenticated.user_id, body.try_into_command()?)
        .await
        .map_err(|e| match e {
            UserError::InvalidCredentials => {
                ApiError::Unauthorized("Current password is incorrect".to_string())
            }
            e => ApiError::from(e),
        })
        .map(|_| ApiSuccess::message(StatusCode::OK, "Password changed successfully"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

impl ChangePasswordRequest {
    fn try_into_command(self) -> Result<ChangePasswordCommand, ApiError> {
        let mut errors = FieldErrors::default();

        let current_password = errors.require(
            "currentPassword",
            self.current_password,
            "Current password cannot be empty",
        );
        let new_password = errors.check(
            "newPassword",
            Password::new(self.new_password)
                .map_err(|_| "New password must be at least 6 characters"),
        );

        match (current_password, new_password) {
            (Some(current_password), Some(new_password)) => Ok(ChangePasswordCommand {
                current_password,
                new_password,
            }),
            _ => Err(errors.into()),
        }
    }
}
