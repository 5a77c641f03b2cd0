use chrono::Duration;

use crate::domain::user::models::DisplayName;

/// Builds the links placed in outgoing emails.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn verification(&self, token: &str) -> String {
        format!("{}/api/auth/verify-email?token={}", self.base_url, token)
    }

    pub fn password_reset(&self, token: &str) -> String {
        format!("{}/api/auth/reset-password?token={}", self.base_url, token)
    }
}

/// Subject and plain-text body of an outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn verification(name: &DisplayName, link: &str, valid_for: Duration) -> Self {
        Self {
            subject: "Email Verification - Campus Marketplace".to_string(),
            body: format!(
                "Hi {name},\n\n\
                 Thank you for registering with Campus Marketplace! \
                 Please open the link below to verify your email address:\n\n\
                 {link}\n\n\
                 This verification link is valid for {validity}.\n\n\
                 If this was not your action, please ignore this email.\n",
                name = name.as_str(),
                validity = describe(valid_for),
            ),
        }
    }

    pub fn password_reset(name: &DisplayName, link: &str, valid_for: Duration) -> Self {
        Self {
            subject: "Password Reset - Campus Marketplace".to_string(),
            body: format!(
                "Hi {name},\n\n\
                 We received your password reset request. \
                 Please open the link below to reset your password:\n\n\
                 {link}\n\n\
                 This reset link is valid for {validity}.\n\n\
                 If you did not request a password reset, please ignore this email \
                 and do not share this link with others.\n",
                name = name.as_str(),
                validity = describe(valid_for),
            ),
        }
    }
}

fn describe(duration: Duration) -> String {
    let hours = duration.num_hours();
    if hours >= 1 && duration.num_minutes() % 60 == 0 {
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{} hours", hours)
        }
    } else {
        format!("{} minutes", duration.num_minutes())
    }
}
