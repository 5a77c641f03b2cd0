use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

/// Sessions are stateless; the client discards its token.
pub async fn logout(
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<()>, ApiError> {
    tracing::info!(user_id = %authenticated.user_id, "User logged out");
    Ok(ApiSuccess::message(StatusCode::OK, "Logout successful"))
}
