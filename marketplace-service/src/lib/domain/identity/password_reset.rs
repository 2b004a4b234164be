use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use chrono::Duration;
use chrono::Utc;

use crate::identity::errors::IdentityError;
use crate::identity::models::ResetToken;
use crate::identity::models::UserUpdate;
use crate::identity::ports::PasswordResetPort;
use crate::identity::ports::PrincipalStore;
use crate::identity::ports::ResetNotifier;

/// Issues and consumes single-use password reset tokens.
pub struct PasswordResetService<S, N>
where
    S: PrincipalStore,
    N: ResetNotifier,
{
    store: Arc<S>,
    notifier: Arc<N>,
    authenticator: Arc<Authenticator>,
    token_ttl: Duration,
}

impl<S, N> PasswordResetService<S, N>
where
    S: PrincipalStore,
    N: ResetNotifier,
{
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        authenticator: Arc<Authenticator>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            authenticator,
            token_ttl,
        }
    }
}

#[async_trait]
impl<S, N> PasswordResetPort for PasswordResetService<S, N>
where
    S: PrincipalStore,
    N: ResetNotifier,
{
    async fn request_reset(&self, email: &str) -> Result<(), IdentityError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(IdentityError::Validation("email is required".to_string()));
        }

        let Some(user) = self.store.find_user_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let reset = ResetToken {
            token: auth::generate_opaque_token(),
            expires_at: Utc::now() + self.token_ttl,
        };

        let update = UserUpdate {
            reset: Some(Some(reset.clone())),
            ..UserUpdate::default()
        };

        // Failures past this point are logged only, so the caller sees the
        // same outcome as for an unknown email.
        match self.store.update_user(&user.id, update).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(principal_id = %user.id, "User vanished before reset token was stored");
                return Ok(());
            }
            Err(e) => {
                tracing::error!(principal_id = %user.id, error = %e, "Failed to store reset token");
                return Ok(());
            }
        }

        tracing::info!(
            principal_id = %user.id,
            expires_at = %reset.expires_at,
            "Password reset token issued"
        );

        if let Err(e) = self.notifier.send_reset_token(&user, &reset).await {
            tracing::error!(principal_id = %user.id, error = %e, "Failed to deliver reset token");
        }

        Ok(())
    }

    async fn consume_reset(&self, token: &str, new_password: &str) -> Result<(), IdentityError> {
        if token.trim().is_empty() {
            return Err(IdentityError::Validation("token is required".to_string()));
        }
        if new_password.is_empty() {
            return Err(IdentityError::Validation(
                "new password is required".to_string(),
            ));
        }

        let user = self
            .store
            .find_user_by_reset_token(token)
            .await?
            .ok_or(IdentityError::ResetTokenNotFound)?;

        let now = Utc::now();
        // Expired tokens stay on the record until a new reset overwrites them
        if user.reset.as_ref().map_or(true, |reset| reset.is_expired(now)) {
            return Err(IdentityError::ResetTokenExpired);
        }

        let password_hash = self.authenticator.hash_password(new_password)?;

        // Conditional update: a concurrent consumption of the same token
        // leaves nothing to match here.
        let updated = self
            .store
            .consume_reset_token(token, &password_hash, now)
            .await?
            .ok_or(IdentityError::ResetTokenNotFound)?;

        tracing::info!(principal_id = %updated.id, "Password reset completed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::errors::NotifierError;
    use crate::identity::errors::StoreError;
    use crate::identity::test_support::test_authenticator;
    use crate::identity::test_support::test_user;
    use crate::identity::test_support::MockTestPrincipalStore;
    use crate::identity::test_support::MockTestResetNotifier;

    fn service(
        store: MockTestPrincipalStore,
        notifier: MockTestResetNotifier,
    ) -> PasswordResetService<MockTestPrincipalStore, MockTestResetNotifier> {
        PasswordResetService::new(
            Arc::new(store),
            Arc::new(notifier),
            Arc::new(test_authenticator()),
            Duration::hours(24),
        )
    }

    #[tokio::test]
    async fn test_request_reset_for_known_email() {
        let mut store = MockTestPrincipalStore::new();
        let mut notifier = MockTestResetNotifier::new();
        let user = test_user("a@b.com", "1", "$argon2id$hash");
        let user_id = user.id;

        let found = user.clone();
        store
            .expect_find_user_by_email()
            .withf(|email| email == "a@b.com")
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        store
            .expect_update_user()
            .withf(move |id, update| {
                let Some(Some(reset)) = &update.reset else {
                    return false;
                };
                let ttl = reset.expires_at - Utc::now();
                *id == user_id
                    && reset.token.len() >= 32
                    && ttl > Duration::hours(23)
                    && ttl <= Duration::hours(24)
                    && update.password_hash.is_none()
            })
            .times(1)
            .returning(move |_, _| Ok(Some(user.clone())));
        notifier
            .expect_send_reset_token()
            .withf(move |user, _| user.id == user_id)
            .times(1)
            .returning(|_, _| Ok(()));

        let result = service(store, notifier).request_reset("a@b.com").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_request_reset_for_unknown_email_succeeds_silently() {
        let mut store = MockTestPrincipalStore::new();
        let mut notifier = MockTestResetNotifier::new();

        store
            .expect_find_user_by_email()
            .times(1)
            .returning(|_| Ok(None));
        store.expect_update_user().times(0);
        notifier.expect_send_reset_token().times(0);

        let result = service(store, notifier).request_reset("ghost@b.com").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_request_reset_delivery_failure_is_not_surfaced() {
        let mut store = MockTestPrincipalStore::new();
        let mut notifier = MockTestResetNotifier::new();
        let user = test_user("a@b.com", "1", "$argon2id$hash");

        let found = user.clone();
        store
            .expect_find_user_by_email()
            .returning(move |_| Ok(Some(found.clone())));
        store
            .expect_update_user()
            .returning(move |_, _| Ok(Some(user.clone())));
        notifier
            .expect_send_reset_token()
            .returning(|_, _| Err(NotifierError::DeliveryFailed("smtp down".to_string())));

        let result = service(store, notifier).request_reset("a@b.com").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_consume_reset_success() {
        let mut store = MockTestPrincipalStore::new();
        let notifier = MockTestResetNotifier::new();
        let mut user = test_user("a@b.com", "1", "$argon2id$old");
        user.reset = Some(ResetToken {
            token: "reset-token".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        });

        let found = user.clone();
        store
            .expect_find_user_by_reset_token()
            .withf(|token| token == "reset-token")
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        store
            .expect_consume_reset_token()
            .withf(|token, hash, _| {
                token == "reset-token"
                    && hash.starts_with("$argon2id")
                    && test_authenticator()
                        .verify_password("new-password", hash)
                        .unwrap()
            })
            .times(1)
            .returning(move |_, hash, _| {
                let mut updated = user.clone();
                updated.password_hash = hash.to_string();
                updated.reset = None;
                Ok(Some(updated))
            });

        let result = service(store, notifier)
            .consume_reset("reset-token", "new-password")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_consume_reset_unknown_token() {
        let mut store = MockTestPrincipalStore::new();
        store
            .expect_find_user_by_reset_token()
            .returning(|_| Ok(None));
        store.expect_consume_reset_token().times(0);

        let result = service(store, MockTestResetNotifier::new())
            .consume_reset("nope", "new-password")
            .await;
        assert!(matches!(result, Err(IdentityError::ResetTokenNotFound)));
    }

    #[tokio::test]
    async fn test_consume_reset_expired_token_is_left_in_place() {
        let mut store = MockTestPrincipalStore::new();
        let mut user = test_user("a@b.com", "1", "$argon2id$old");
        user.reset = Some(ResetToken {
            token: "stale".to_string(),
            expires_at: Utc::now() - Duration::minutes(1),
        });

        store
            .expect_find_user_by_reset_token()
            .returning(move |_| Ok(Some(user.clone())));
        store.expect_consume_reset_token().times(0);
        store.expect_update_user().times(0);

        let result = service(store, MockTestResetNotifier::new())
            .consume_reset("stale", "new-password")
            .await;
        assert!(matches!(result, Err(IdentityError::ResetTokenExpired)));
    }

    #[tokio::test]
    async fn test_consume_reset_lost_race_is_not_found() {
        let mut store = MockTestPrincipalStore::new();
        let mut user = test_user("a@b.com", "1", "$argon2id$old");
        user.reset = Some(ResetToken {
            token: "raced".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        });

        store
            .expect_find_user_by_reset_token()
            .returning(move |_| Ok(Some(user.clone())));
        store
            .expect_consume_reset_token()
            .times(1)
            .returning(|_, _, _| Ok(None));

        let result = service(store, MockTestResetNotifier::new())
            .consume_reset("raced", "new-password")
            .await;
        assert!(matches!(result, Err(IdentityError::ResetTokenNotFound)));
    }

    #[tokio::test]
    async fn test_consume_reset_store_error() {
        let mut store = MockTestPrincipalStore::new();
        store
            .expect_find_user_by_reset_token()
            .returning(|_| Err(StoreError::Io("connection reset".to_string())));

        let result = service(store, MockTestResetNotifier::new())
            .consume_reset("token", "new-password")
            .await;
        assert!(matches!(result, Err(IdentityError::Store(_))));
    }
}
