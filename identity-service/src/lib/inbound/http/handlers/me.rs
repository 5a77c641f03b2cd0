use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::inbound::http::middleware::AuthenticatedUser;

/// Profile of the caller, as loaded by the auth middleware.
pub async fn me(
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    Ok(ApiSuccess::data(
        StatusCode::OK,
        (&authenticated.user).into(),
    ))
}
