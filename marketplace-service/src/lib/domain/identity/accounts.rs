use std::sync::Arc;

use async_trait::async_trait;

use crate::identity::errors::IdentityError;
use crate::identity::models::PrincipalId;
use crate::identity::models::ProfileUpdate;
use crate::identity::models::SubscriptionTier;
use crate::identity::models::UserFilter;
use crate::identity::models::UserProfile;
use crate::identity::models::UserUpdate;
use crate::identity::ports::AccountPort;
use crate::identity::ports::PrincipalStore;

/// Account reads and updates over a `PrincipalStore`.
pub struct AccountService<S>
where
    S: PrincipalStore,
{
    store: Arc<S>,
}

impl<S> AccountService<S>
where
    S: PrincipalStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn apply(
        &self,
        id: &PrincipalId,
        update: UserUpdate,
    ) -> Result<UserProfile, IdentityError> {
        self.store
            .update_user(id, update)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or(IdentityError::UserNotFound(id.to_string()))
    }
}

#[async_trait]
impl<S> AccountPort for AccountService<S>
where
    S: PrincipalStore,
{
    async fn get_user(&self, id: &PrincipalId) -> Result<UserProfile, IdentityError> {
        self.store
            .find_user_by_id(id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or(IdentityError::UserNotFound(id.to_string()))
    }

    async fn list_users(&self, filter: UserFilter) -> Result<Vec<UserProfile>, IdentityError> {
        Ok(self
            .store
            .list_users(&filter)
            .await?
            .iter()
            .map(UserProfile::from)
            .collect())
    }

    async fn featured_suppliers(&self) -> Result<Vec<UserProfile>, IdentityError> {
        self.list_users(UserFilter::featured_suppliers()).await
    }

    async fn update_profile(
        &self,
        id: &PrincipalId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, IdentityError> {
        if update.is_empty() {
            return Err(IdentityError::Validation(
                "businessName or wilaya is required".to_string(),
            ));
        }

        let profile = self.apply(id, update.into()).await?;

        tracing::info!(principal_id = %id, "Profile updated");

        Ok(profile)
    }

    async fn set_active(
        &self,
        id: &PrincipalId,
        is_active: bool,
    ) -> Result<UserProfile, IdentityError> {
        let profile = self
            .apply(
                id,
                UserUpdate {
                    is_active: Some(is_active),
                    ..UserUpdate::default()
                },
            )
            .await?;

        tracing::info!(principal_id = %id, is_active, "User activation changed");

        Ok(profile)
    }

    async fn set_subscription(
        &self,
        id: &PrincipalId,
        tier: SubscriptionTier,
    ) -> Result<UserProfile, IdentityError> {
        let profile = self
            .apply(
                id,
                UserUpdate {
                    subscription: Some(tier),
                    ..UserUpdate::default()
                },
            )
            .await?;

        tracing::info!(principal_id = %id, subscription = tier.as_str(), "Subscription changed");

        Ok(profile)
    }
}
