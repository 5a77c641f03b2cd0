use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldErrors;
use super::RequestJson;
use super::UserProfileData;
use crate::domain::user::models::AvatarUrl;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::ProfileChanges;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    RequestJson(body): RequestJson<UpdateProfileRequest>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    state
        .identity_service
        .update_profile(&authenticated.user_id, body.try_into_changes()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| {
            ApiSuccess::new(StatusCode::OK, "Profile updated successfully", user.into())
        })
}

/// Absent fields are left unchanged; an empty phone counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    name: Option<String>,
    phone: Option<String>,
    avatar: Option<String>,
}

impl UpdateProfileRequest {
    fn try_into_changes(self) -> Result<ProfileChanges, ApiError> {
        let mut errors = FieldErrors::default();

        let name = errors.check("name", self.name.map(DisplayName::new).transpose());
        let phone = errors.check(
            "phone",
            self.phone
                .filter(|phone| !phone.trim().is_empty())
                .map(PhoneNumber::new)
                .transpose(),
        );
        let avatar = errors.check("avatar", self.avatar.map(AvatarUrl::new).transpose());

        match (name, phone, avatar) {
            (Some(name), Some(phone), Some(avatar)) => Ok(ProfileChanges {
                name,
                phone,
                avatar,
            }),
            _ => Err(errors.into()),
        }
    }
}
