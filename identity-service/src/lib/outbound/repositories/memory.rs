use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::IssuedToken;
use crate::domain::user::models::ProfileChanges;
use crate::domain::user::models::TokenEffect;
use crate::domain::user::models::TokenPurpose;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user store.
///
/// Every mutation runs under one write guard, which gives the same
/// uniqueness and compare-and-clear guarantees as the Postgres adapter.
/// Used for development and tests; data is lost on restart.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, id: &UserId, now: DateTime<Utc>, change: F) -> Result<User, UserError>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        change(user);
        user.updated_at = now;

        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if users.values().any(|existing| existing.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.as_str().to_string()));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == *email)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<User, UserError> {
        self.modify(id, now, |user| changes.apply(user)).await
    }

    async fn update_password(
        &self,
        id: &UserId,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<User, UserError> {
        self.modify(id, now, |user| user.password_hash = password_hash)
            .await
    }

    async fn store_token(
        &self,
        id: &UserId,
        purpose: TokenPurpose,
        issued: IssuedToken,
        now: DateTime<Utc>,
    ) -> Result<User, UserError> {
        self.modify(id, now, |user| *user.token_slot(purpose) = Some(issued))
            .await
    }

    async fn consume_token(
        &self,
        purpose: TokenPurpose,
        token: &str,
        effect: TokenEffect,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        let mut users = self.users.write().await;

        let Some(user) = users
            .values_mut()
            .find(|user| user.token(purpose).is_some_and(|t| t.accepts(token, now)))
        else {
            return Ok(None);
        };

        effect.apply(user);
        *user.token_slot(purpose) = None;
        user.updated_at = now;

        Ok(Some(user.clone()))
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, UserError> {
        let mut users = self.users.write().await;
        let mut cleared = 0;

        for user in users.values_mut() {
            for purpose in [TokenPurpose::EmailVerification, TokenPurpose::PasswordReset] {
                let slot = user.token_slot(purpose);
                if slot.as_ref().is_some_and(|t| t.expires_at <= now) {
                    *slot = None;
                    cleared += 1;
                }
            }
        }

        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::domain::user::models::DisplayName;

    fn user(email: &str) -> User {
        User::new(
            EmailAddress::new(email.to_string()).unwrap(),
            "$argon2id$hash".to_string(),
            DisplayName::new("Alice".to_string()).unwrap(),
            None,
            Utc::now(),
        )
    }

    async fn with_token(
        repository: &InMemoryUserRepository,
        purpose: TokenPurpose,
        token: &str,
        lifetime: Duration,
    ) -> User {
        let created = repository.create(user("alice@example.com")).await.unwrap();
        let now = Utc::now();
        repository
            .store_token(
                &created.id,
                purpose,
                IssuedToken::new(token.to_string(), now, lifetime),
                now,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let repository = InMemoryUserRepository::new();
        let first = repository.create(user("alice@example.com")).await.unwrap();

        let result = repository.create(user("ALICE@example.com")).await;
        assert!(matches!(result, Err(UserError::EmailAlreadyExists(_))));

        let stored = repository.find_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, first.password_hash);
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let repository = InMemoryUserRepository::new();
        let created = repository.create(user("alice@example.com")).await.unwrap();

        let email = EmailAddress::new("Alice@Example.com".to_string()).unwrap();
        let found = repository.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        let other = EmailAddress::new("bob@example.com".to_string()).unwrap();
        assert!(repository.find_by_email(&other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repository = InMemoryUserRepository::new();

        let result = repository
            .update_password(&UserId::new(), "hash".to_string(), Utc::now())
            .await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_absent_fields() {
        let repository = InMemoryUserRepository::new();
        let created = repository.create(user("alice@example.com")).await.unwrap();
        let later = created.updated_at + Duration::seconds(5);

        let updated = repository
            .update_profile(
                &created.id,
                ProfileChanges {
                    name: Some(DisplayName::new("Alicia".to_string()).unwrap()),
                    ..Default::default()
                },
                later,
            )
            .await
            .unwrap();

        assert_eq!(updated.name.as_str(), "Alicia");
        assert_eq!(updated.avatar, created.avatar);
        assert_eq!(updated.updated_at, later);
    }

    #[tokio::test]
    async fn test_consume_token_once() {
        let repository = InMemoryUserRepository::new();
        with_token(
            &repository,
            TokenPurpose::EmailVerification,
            "token-1",
            Duration::hours(24),
        )
        .await;

        let first = repository
            .consume_token(
                TokenPurpose::EmailVerification,
                "token-1",
                TokenEffect::MarkVerified,
                Utc::now(),
            )
            .await
            .unwrap()
            .expect("First consumption must succeed");
        assert!(first.is_verified);
        assert!(first.email_verification.is_none());

        let second = repository
            .consume_token(
                TokenPurpose::EmailVerification,
                "token-1",
                TokenEffect::MarkVerified,
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_consume_checks_purpose_and_expiry() {
        let repository = InMemoryUserRepository::new();
        with_token(
            &repository,
            TokenPurpose::PasswordReset,
            "reset-1",
            Duration::hours(1),
        )
        .await;

        let wrong_purpose = repository
            .consume_token(
                TokenPurpose::EmailVerification,
                "reset-1",
                TokenEffect::MarkVerified,
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(wrong_purpose.is_none());

        let after_expiry = repository
            .consume_token(
                TokenPurpose::PasswordReset,
                "reset-1",
                TokenEffect::ReplacePasswordHash("new".to_string()),
                Utc::now() + Duration::hours(2),
            )
            .await
            .unwrap();
        assert!(after_expiry.is_none());
    }

    #[tokio::test]
    async fn test_reissued_token_replaces_previous() {
        let repository = InMemoryUserRepository::new();
        let created = with_token(
            &repository,
            TokenPurpose::EmailVerification,
            "first",
            Duration::hours(24),
        )
        .await;

        let now = Utc::now();
        repository
            .store_token(
                &created.id,
                TokenPurpose::EmailVerification,
                IssuedToken::new("second".to_string(), now, Duration::hours(24)),
                now,
            )
            .await
            .unwrap();

        let stale = repository
            .consume_token(
                TokenPurpose::EmailVerification,
                "first",
                TokenEffect::MarkVerified,
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(stale.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_consume_single_winner() {
        let repository = Arc::new(InMemoryUserRepository::new());
        with_token(
            &repository,
            TokenPurpose::EmailVerification,
            "contested",
            Duration::hours(24),
        )
        .await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repository = Arc::clone(&repository);
                tokio::spawn(async move {
                    repository
                        .consume_token(
                            TokenPurpose::EmailVerification,
                            "contested",
                            TokenEffect::MarkVerified,
                            Utc::now(),
                        )
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_purge_expired_tokens() {
        let repository = InMemoryUserRepository::new();
        let created = with_token(
            &repository,
            TokenPurpose::PasswordReset,
            "reset-1",
            Duration::hours(1),
        )
        .await;

        assert_eq!(repository.purge_expired_tokens(Utc::now()).await.unwrap(), 0);

        let cleared = repository
            .purge_expired_tokens(Utc::now() + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(cleared, 1);

        let stored = repository.find_by_id(&created.id).await.unwrap().unwrap();
        assert!(stored.password_reset.is_none());
    }
}
