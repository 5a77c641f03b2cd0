use std::fmt::Display;

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::user::models::User;
use crate::user::errors::UserError;

pub mod change_password;
pub mod forgot_password;
pub mod health;
pub mod login;
pub mod logout;
pub mod me;
pub mod register;
pub mod resend_verification;
pub mod reset_password;
pub mod update_profile;
pub mod verify_email;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        ApiSuccess(
            status,
            Json(ApiResponseBody::success(Some(message.into()), Some(data))),
        )
    }

    pub fn data(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::success(None, Some(data))))
    }
}

impl ApiSuccess<()> {
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        ApiSuccess(
            status,
            Json(ApiResponseBody::success(Some(message.into()), None)),
        )
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Detail is logged, never returned
    InternalServerError(String),
    /// Outbound email failed; message is returned as is
    DeliveryFailed(String),
    BadRequest(String),
    Validation(Vec<FieldError>),
    NotFound(String),
    Unauthorized(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ApiError::InternalServerError(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::DeliveryFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Input validation failed".to_string(),
                Some(errors),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
        };

        (status, Json(ApiResponseBody::failure(message, errors))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                ApiError::Validation(vec![FieldError::new("body", e.body_text())])
            }
            other => ApiError::BadRequest(format!(
                "Request body must be valid JSON: {}",
                other.body_text()
            )),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidEmail(e) => ApiError::Validation(vec![FieldError::new("email", e)]),
            UserError::InvalidPassword(e) => {
                ApiError::Validation(vec![FieldError::new("password", e)])
            }
            UserError::InvalidName(e) => ApiError::Validation(vec![FieldError::new("name", e)]),
            UserError::InvalidPhone(e) => ApiError::Validation(vec![FieldError::new("phone", e)]),
            UserError::InvalidAvatar(e) => {
                ApiError::Validation(vec![FieldError::new("avatar", e)])
            }
            UserError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
            UserError::EmailAlreadyExists(_) => {
                ApiError::BadRequest("Email already registered".to_string())
            }
            UserError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            UserError::InvalidOrExpiredToken => {
                ApiError::BadRequest("Token is invalid or expired".to_string())
            }
            UserError::AlreadyVerified => {
                ApiError::BadRequest("Email already verified".to_string())
            }
            UserError::DeliveryFailed(_) => ApiError::DeliveryFailed(
                "Email failed to send, please try again later".to_string(),
            ),
            UserError::InvalidUserId(_)
            | UserError::Password(_)
            | UserError::Token(_)
            | UserError::DatabaseError(_)
            | UserError::Unknown(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

/// JSON body extractor whose rejections use the response envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct RequestJson<T>(pub T);

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn success(message: Option<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message,
            data,
            errors: None,
        }
    }
}

impl ApiResponseBody<()> {
    pub fn failure(message: String, errors: Option<Vec<FieldError>>) -> Self {
        Self {
            success: false,
            message: Some(message),
            data: None,
            errors,
        }
    }
}

/// A rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Display) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Collects every failing field of a request before rejecting it.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Keep the value on success, record the error message otherwise.
    pub fn check<T, E: Display>(&mut self, field: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(FieldError::new(field, e));
                None
            }
        }
    }

    /// Record `message` when `value` is empty.
    pub fn require(&mut self, field: &str, value: String, message: &str) -> Option<String> {
        if value.is_empty() {
            self.0.push(FieldError::new(field, message));
            None
        } else {
            Some(value)
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors.0)
    }
}

/// Public user profile; never carries the password hash or tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileData {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: String,
    pub phone: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfileData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.as_str().to_string(),
            name: user.name.as_str().to_string(),
            avatar: user.avatar.as_str().to_string(),
            phone: user.phone.as_ref().map(|p| p.as_str().to_string()),
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("API endpoint not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::errors::EmailDeliveryError;
    use crate::user::errors::NameError;

    #[test]
    fn test_field_errors_collects_all_failures() {
        let mut errors = FieldErrors::default();

        let name = errors.check("name", Err::<(), _>(NameError::Empty));
        let password = errors.require("password", String::new(), "Password cannot be empty");
        let email = errors.check("email", Ok::<_, NameError>("alice@example.com"));

        assert!(name.is_none());
        assert!(password.is_none());
        assert_eq!(email, Some("alice@example.com"));

        let ApiError::Validation(fields) = ApiError::from(errors) else {
            panic!("Expected validation error");
        };
        assert_eq!(
            fields,
            vec![
                FieldError::new("name", "Username cannot be empty"),
                FieldError::new("password", "Password cannot be empty"),
            ]
        );
    }

    #[test]
    fn test_user_error_mapping() {
        assert_eq!(
            ApiError::from(UserError::EmailAlreadyExists("a@b.c".to_string())),
            ApiError::BadRequest("Email already registered".to_string())
        );
        assert_eq!(
            ApiError::from(UserError::InvalidCredentials),
            ApiError::Unauthorized("Invalid email or password".to_string())
        );
        assert!(matches!(
            ApiError::from(UserError::DeliveryFailed(EmailDeliveryError::Timeout(
                "10s".to_string()
            ))),
            ApiError::DeliveryFailed(_)
        ));
        assert!(matches!(
            ApiError::from(UserError::DatabaseError("connection reset".to_string())),
            ApiError::InternalServerError(_)
        ));
    }

    #[test]
    fn test_envelope_omits_absent_fields() {
        let body = serde_json::to_value(ApiResponseBody::<()>::success(
            Some("Logout successful".to_string()),
            None,
        ))
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({ "success": true, "message": "Logout successful" })
        );
    }

    #[tokio::test]
    async fn test_mistyped_body_is_a_validation_error() {
        let request = axum::http::Request::post("/")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"phone":123}"#))
            .unwrap();

        #[derive(Debug, serde::Deserialize)]
        struct Contact {
            #[allow(dead_code)]
            phone: String,
        }

        let result = RequestJson::<Contact>::from_request(request, &()).await;
        let Err(ApiError::Validation(fields)) = result else {
            panic!("Expected validation error");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "body");
        assert!(fields[0].message.contains("phone"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_a_bad_request() {
        let request = axum::http::Request::post("/")
            .body(axum::body::Body::from(r#"{"phone":"123"}"#))
            .unwrap();

        let result = RequestJson::<serde_json::Value>::from_request(request, &()).await;
        let Err(error) = result else {
            panic!("Expected rejection");
        };
        assert!(matches!(error, ApiError::BadRequest(_)));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response =
            ApiError::InternalServerError("password column missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
