use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldErrors;
use super::RequestJson;
use super::UserProfileData;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Registration;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    RequestJson(body): RequestJson<RegisterRequest>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    state
        .identity_service
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref registration| {
            let message = if registration.email_sent {
                "Registration successful, please check your email for verification"
            } else {
                "Registration successful, but verification email failed to send, please contact support"
            };
            ApiSuccess::new(StatusCode::CREATED, message, registration.into())
        })
}

/// HTTP request body for registration (raw JSON)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    email: String,
    password: String,
    name: String,
    phone: Option<String>,
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ApiError> {
        let mut errors = FieldErrors::default();

        let email = errors.check(
            "email",
            EmailAddress::new(self.email).map_err(|_| "Please enter a valid email address"),
        );
        let password = errors.check("password", Password::new(self.password));
        let name = errors.check("name", DisplayName::new(self.name));
        let phone = errors.check(
            "phone",
            self.phone
                .filter(|phone| !phone.trim().is_empty())
                .map(PhoneNumber::new)
                .transpose(),
        );

        match (email, password, name, phone) {
            (Some(email), Some(password), Some(name), Some(phone)) => Ok(RegisterCommand {
                email,
                password,
                name,
                phone,
            }),
            _ => Err(errors.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponseData {
    pub token: String,
    pub user: UserProfileData,
    pub email_sent: bool,
}

impl From<&Registration> for RegisterResponseData {
    fn from(registration: &Registration) -> Self {
        Self {
            token: registration.token.clone(),
            user: (&registration.user).into(),
            email_sent: registration.email_sent,
        }
    }
}
