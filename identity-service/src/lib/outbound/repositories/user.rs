use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::AvatarUrl;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::IssuedToken;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::ProfileChanges;
use crate::domain::user::models::TokenEffect;
use crate::domain::user::models::TokenPurpose;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USER_COLUMNS: &str = "id, email, password_hash, name, avatar, phone, is_verified, \
     email_verification_token, email_verification_expires, \
     password_reset_token, password_reset_expires, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw `users` row.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    avatar: String,
    phone: Option<String>,
    is_verified: bool,
    email_verification_token: Option<String>,
    email_verification_expires: Option<DateTime<Utc>>,
    password_reset_token: Option<String>,
    password_reset_expires: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(row.id),
            email: EmailAddress::new(row.email)?,
            password_hash: row.password_hash,
            name: DisplayName::new(row.name)?,
            avatar: AvatarUrl::new(row.avatar)?,
            phone: row.phone.map(PhoneNumber::new).transpose()?,
            is_verified: row.is_verified,
            email_verification: token_pair(
                row.email_verification_token,
                row.email_verification_expires,
            ),
            password_reset: token_pair(row.password_reset_token, row.password_reset_expires),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn token_pair(token: Option<String>, expires_at: Option<DateTime<Utc>>) -> Option<IssuedToken> {
    match (token, expires_at) {
        (Some(token), Some(expires_at)) => Some(IssuedToken { token, expires_at }),
        _ => None,
    }
}

/// Token and expiry column names for a purpose.
fn token_columns(purpose: TokenPurpose) -> (&'static str, &'static str) {
    match purpose {
        TokenPurpose::EmailVerification => {
            ("email_verification_token", "email_verification_expires")
        }
        TokenPurpose::PasswordReset => ("password_reset_token", "password_reset_expires"),
    }
}

fn database_error(e: sqlx::Error) -> UserError {
    UserError::DatabaseError(e.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let (email_verification_token, email_verification_expires) = user
            .email_verification
            .as_ref()
            .map(|t| (Some(t.token.as_str()), Some(t.expires_at)))
            .unwrap_or((None, None));
        let (password_reset_token, password_reset_expires) = user
            .password_reset
            .as_ref()
            .map(|t| (Some(t.token.as_str()), Some(t.expires_at)))
            .unwrap_or((None, None));

        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.name.as_str())
        .bind(user.avatar.as_str())
        .bind(user.phone.as_ref().map(PhoneNumber::as_str))
        .bind(user.is_verified)
        .bind(email_verification_token)
        .bind(email_verification_expires)
        .bind(password_reset_token)
        .bind(password_reset_expires)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
                    return UserError::EmailAlreadyExists(user.email.as_str().to_string());
                }
            }
            database_error(e)
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<User, UserError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users \
             SET name = COALESCE($2, name), \
                 phone = COALESCE($3, phone), \
                 avatar = COALESCE($4, avatar), \
                 updated_at = $5 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(changes.name.as_ref().map(DisplayName::as_str))
        .bind(changes.phone.as_ref().map(PhoneNumber::as_str))
        .bind(changes.avatar.as_ref().map(AvatarUrl::as_str))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or_else(|| UserError::NotFound(id.to_string()))
        .and_then(User::try_from)
    }

    async fn update_password(
        &self,
        id: &UserId,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<User, UserError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET password_hash = $2, updated_at = $3 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or_else(|| UserError::NotFound(id.to_string()))
        .and_then(User::try_from)
    }

    async fn store_token(
        &self,
        id: &UserId,
        purpose: TokenPurpose,
        issued: IssuedToken,
        now: DateTime<Utc>,
    ) -> Result<User, UserError> {
        let (token_column, expires_column) = token_columns(purpose);

        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET {token_column} = $2, {expires_column} = $3, updated_at = $4 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(issued.token)
        .bind(issued.expires_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or_else(|| UserError::NotFound(id.to_string()))
        .and_then(User::try_from)
    }

    async fn consume_token(
        &self,
        purpose: TokenPurpose,
        token: &str,
        effect: TokenEffect,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        let (token_column, expires_column) = token_columns(purpose);
        let (assignment, password_hash) = match effect {
            TokenEffect::MarkVerified => ("is_verified = TRUE", None),
            TokenEffect::ReplacePasswordHash(hash) => ("password_hash = $3", Some(hash)),
        };

        // Match, effect and clear happen in one statement; a second caller
        // with the same token finds no row.
        let sql = format!(
            "UPDATE users \
             SET {assignment}, {token_column} = NULL, {expires_column} = NULL, updated_at = $2 \
             WHERE {token_column} = $1 AND {expires_column} > $2 \
             RETURNING {USER_COLUMNS}"
        );

        let mut query = sqlx::query_as::<_, UserRow>(&sql).bind(token).bind(now);
        if let Some(hash) = password_hash {
            query = query.bind(hash);
        }

        query
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, UserError> {
        let mut cleared = 0;

        for purpose in [TokenPurpose::EmailVerification, TokenPurpose::PasswordReset] {
            let (token_column, expires_column) = token_columns(purpose);
            let result = sqlx::query(&format!(
                "UPDATE users SET {token_column} = NULL, {expires_column} = NULL \
                 WHERE {expires_column} <= $1"
            ))
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

            cleared += result.rows_affected();
        }

        Ok(cleared)
    }
}
