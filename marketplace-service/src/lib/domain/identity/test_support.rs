use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use mockall::mock;

use crate::identity::errors::NotifierError;
use crate::identity::errors::StoreError;
use crate::identity::models::AdminPrincipal;
use crate::identity::models::EmailAddress;
use crate::identity::models::PhoneNumber;
use crate::identity::models::Principal;
use crate::identity::models::PrincipalId;
use crate::identity::models::ResetToken;
use crate::identity::models::Role;
use crate::identity::models::UserFilter;
use crate::identity::models::UserPrincipal;
use crate::identity::models::UserUpdate;
use crate::identity::ports::PrincipalStore;
use crate::identity::ports::ResetNotifier;

mock! {
    pub TestPrincipalStore {}

    #[async_trait]
    impl PrincipalStore for TestPrincipalStore {
        async fn resolve_by_identifier(&self, identifier: &str) -> Result<Principal, StoreError>;
        async fn find_admin(&self, identifier: &str) -> Result<Option<AdminPrincipal>, StoreError>;
        async fn insert_admin(&self, admin: AdminPrincipal) -> Result<(), StoreError>;
        async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<UserPrincipal>, StoreError>;
        async fn find_user_by_email_or_phone(&self, email: &str, phone: &str) -> Result<Option<UserPrincipal>, StoreError>;
        async fn find_user_by_email(&self, email: &str) -> Result<Option<UserPrincipal>, StoreError>;
        async fn find_user_by_id(&self, id: &PrincipalId) -> Result<Option<UserPrincipal>, StoreError>;
        async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<UserPrincipal>, StoreError>;
        async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserPrincipal>, StoreError>;
        async fn insert_user(&self, user: UserPrincipal) -> Result<PrincipalId, StoreError>;
        async fn update_user(&self, id: &PrincipalId, update: UserUpdate) -> Result<Option<UserPrincipal>, StoreError>;
        async fn consume_reset_token(&self, token: &str, new_password_hash: &str, now: DateTime<Utc>) -> Result<Option<UserPrincipal>, StoreError>;
    }
}

mock! {
    pub TestResetNotifier {}

    #[async_trait]
    impl ResetNotifier for TestResetNotifier {
        async fn send_reset_token(&self, user: &UserPrincipal, reset: &ResetToken) -> Result<(), NotifierError>;
    }
}

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Authenticator with the cheapest Argon2 parameters so tests stay fast.
pub fn test_authenticator() -> auth::Authenticator {
    auth::Authenticator::with_hasher(
        TEST_SECRET,
        auth::PasswordHasher::with_cost(8, 1, 1).expect("valid parameters"),
    )
}

pub fn test_user(email: &str, phone: &str, password_hash: &str) -> UserPrincipal {
    let now = Utc::now();
    UserPrincipal {
        id: PrincipalId::new(),
        email: EmailAddress::new(email.to_string()).unwrap(),
        phone: PhoneNumber::new(phone.to_string()).unwrap(),
        business_name: "Pharmacie Centrale".to_string(),
        password_hash: password_hash.to_string(),
        role: Role::Pharmacist,
        is_active: true,
        subscription: None,
        wilaya: None,
        reset: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_admin(identifier: &str, password_hash: &str) -> AdminPrincipal {
    AdminPrincipal {
        id: PrincipalId::new(),
        identifier: identifier.to_string(),
        password_hash: password_hash.to_string(),
        created_at: Utc::now(),
    }
}
