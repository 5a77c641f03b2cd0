use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn resend_verification(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<()>, ApiError> {
    state
        .identity_service
        .resend_verification(&authenticated.user_id)
        .await
        .map_err(|e| match e {
            UserError::DeliveryFailed(_) => ApiError::DeliveryFailed(
                "Verification email failed to send, please try again later".to_string(),
            ),
            e => ApiError::from(e),
        })
        .map(|_| {
            ApiSuccess::message(
                StatusCode::OK,
                "Verification email resent, please check your email",
            )
        })
}
