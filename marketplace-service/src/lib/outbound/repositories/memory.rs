use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::identity::errors::StoreError;
use crate::identity::models::AdminPrincipal;
use crate::identity::models::Principal;
use crate::identity::models::PrincipalId;
use crate::identity::models::UserFilter;
use crate::identity::models::UserPrincipal;
use crate::identity::models::UserUpdate;
use crate::identity::ports::PrincipalStore;

#[derive(Default)]
struct Collections {
    admins: HashMap<String, AdminPrincipal>,
    users: HashMap<PrincipalId, UserPrincipal>,
}

impl Collections {
    fn user_where(&self, predicate: impl Fn(&UserPrincipal) -> bool) -> Option<UserPrincipal> {
        self.users.values().find(|user| predicate(user)).cloned()
    }

    fn taken_field(&self, candidate: &UserPrincipal) -> Option<&'static str> {
        self.users
            .values()
            .filter(|user| user.id != candidate.id)
            .find_map(|user| {
                if user.email == candidate.email {
                    Some("email")
                } else if user.phone == candidate.phone {
                    Some("phone")
                } else {
                    None
                }
            })
    }

    fn reset_token_taken(&self, id: &PrincipalId, token: &str) -> bool {
        self.users.values().any(|user| {
            user.id != *id && user.reset.as_ref().is_some_and(|reset| reset.token == token)
        })
    }
}

/// Process-local `PrincipalStore`.
///
/// Every check-and-write happens under a single write lock, which gives the
/// same uniqueness and single-use guarantees as the database constraints.
#[derive(Default)]
pub struct InMemoryPrincipalStore {
    collections: RwLock<Collections>,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn admin_count(&self) -> usize {
        self.collections.read().await.admins.len()
    }

    pub async fn user_count(&self) -> usize {
        self.collections.read().await.users.len()
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn resolve_by_identifier(&self, identifier: &str) -> Result<Principal, StoreError> {
        let collections = self.collections.read().await;

        if let Some(admin) = collections.admins.get(identifier) {
            return Ok(Principal::Admin(admin.clone()));
        }

        Ok(collections
            .user_where(|user| user.email.as_str() == identifier)
            .or_else(|| collections.user_where(|user| user.phone.as_str() == identifier))
            .map_or(Principal::NotFound, Principal::User))
    }

    async fn find_admin(&self, identifier: &str) -> Result<Option<AdminPrincipal>, StoreError> {
        Ok(self.collections.read().await.admins.get(identifier).cloned())
    }

    async fn insert_admin(&self, admin: AdminPrincipal) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;

        if collections.admins.contains_key(&admin.identifier) {
            return Err(StoreError::Conflict("identifier".to_string()));
        }

        collections.admins.insert(admin.identifier.clone(), admin);
        Ok(())
    }

    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        let collections = self.collections.read().await;

        Ok(collections
            .user_where(|user| user.email.as_str() == identifier)
            .or_else(|| collections.user_where(|user| user.phone.as_str() == identifier)))
    }

    async fn find_user_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        let collections = self.collections.read().await;

        Ok(collections
            .user_where(|user| user.email.as_str() == email)
            .or_else(|| collections.user_where(|user| user.phone.as_str() == phone)))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserPrincipal>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .user_where(|user| user.email.as_str() == email))
    }

    async fn find_user_by_id(
        &self,
        id: &PrincipalId,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        Ok(self.collections.read().await.users.get(id).cloned())
    }

    async fn find_user_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        Ok(self.collections.read().await.user_where(|user| {
            user.reset
                .as_ref()
                .is_some_and(|reset| reset.token == token)
        }))
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserPrincipal>, StoreError> {
        let mut users: Vec<UserPrincipal> = self
            .collections
            .read()
            .await
            .users
            .values()
            .filter(|user| filter.matches(user))
            .cloned()
            .collect();

        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn insert_user(&self, user: UserPrincipal) -> Result<PrincipalId, StoreError> {
        let mut collections = self.collections.write().await;

        if let Some(field) = collections.taken_field(&user) {
            return Err(StoreError::Conflict(field.to_string()));
        }

        let id = user.id;
        collections.users.insert(id, user);
        Ok(id)
    }

    async fn update_user(
        &self,
        id: &PrincipalId,
        update: UserUpdate,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        let mut collections = self.collections.write().await;

        if let Some(Some(reset)) = &update.reset {
            if collections.reset_token_taken(id, &reset.token) {
                return Err(StoreError::Conflict("reset token".to_string()));
            }
        }

        let Some(user) = collections.users.get_mut(id) else {
            return Ok(None);
        };

        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        if let Some(tier) = update.subscription {
            user.subscription = Some(tier);
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(reset) = update.reset {
            user.reset = reset;
        }
        if let Some(business_name) = update.business_name {
            user.business_name = business_name;
        }
        if let Some(wilaya) = update.wilaya {
            user.wilaya = Some(wilaya);
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        let mut collections = self.collections.write().await;

        let holder = collections.users.values_mut().find(|user| {
            user.reset
                .as_ref()
                .is_some_and(|reset| reset.token == token && !reset.is_expired(now))
        });

        Ok(holder.map(|user| {
            user.password_hash = new_password_hash.to_string();
            user.reset = None;
            user.updated_at = now;
            user.clone()
        }))
    }
}
