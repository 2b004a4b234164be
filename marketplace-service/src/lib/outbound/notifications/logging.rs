use async_trait::async_trait;

use crate::identity::errors::NotifierError;
use crate::identity::models::ResetToken;
use crate::identity::models::UserPrincipal;
use crate::identity::ports::ResetNotifier;

/// Records that a reset token was issued.
///
/// Stands in for the email delivery collaborator. The token itself is never
/// written to the log.
#[derive(Debug, Default, Clone)]
pub struct LoggingResetNotifier;

impl LoggingResetNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResetNotifier for LoggingResetNotifier {
    async fn send_reset_token(
        &self,
        user: &UserPrincipal,
        reset: &ResetToken,
    ) -> Result<(), NotifierError> {
        tracing::info!(
            principal_id = %user.id,
            expires_at = %reset.expires_at,
            "Password reset token issued"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::identity::test_support::test_user;

    #[tokio::test]
    async fn test_send_reset_token_succeeds() {
        let notifier = LoggingResetNotifier::new();
        let user = test_user("a@b.com", "1", "$argon2id$hash");
        let reset = ResetToken {
            token: "secret".to_string(),
            expires_at: Utc::now(),
        };

        assert!(notifier.send_reset_token(&user, &reset).await.is_ok());
    }
}
