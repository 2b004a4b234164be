use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::identity::errors::IdentityError;
use crate::identity::errors::NotifierError;
use crate::identity::errors::StoreError;
use crate::identity::models::AdminPrincipal;
use crate::identity::models::Principal;
use crate::identity::models::PrincipalId;
use crate::identity::models::ProfileUpdate;
use crate::identity::models::RegisterCommand;
use crate::identity::models::ResetToken;
use crate::identity::models::Session;
use crate::identity::models::SubscriptionTier;
use crate::identity::models::UserFilter;
use crate::identity::models::UserPrincipal;
use crate::identity::models::UserProfile;
use crate::identity::models::UserUpdate;

/// Login and registration flows.
#[async_trait]
pub trait AuthenticationPort: Send + Sync + 'static {
    /// Authenticate a principal by email, phone or the admin identifier.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown identifier or wrong password
    /// * `AccountPending` - User found and password not yet checked, but inactive
    /// * `StoreTimeout` / `Store` - Persistence failed
    async fn login(&self, identifier: &str, password: &str) -> Result<Session, IdentityError>;

    /// Register a new, inactive user.
    ///
    /// # Errors
    /// * `Validation` - Empty password or business name
    /// * `Conflict` - Email or phone already taken
    /// * `StoreTimeout` / `Store` - Persistence failed
    async fn register(&self, command: RegisterCommand) -> Result<UserProfile, IdentityError>;
}

/// Forgot/reset password flow.
#[async_trait]
pub trait PasswordResetPort: Send + Sync + 'static {
    /// Issue a reset token if the email is known.
    ///
    /// Succeeds whether or not the email exists.
    ///
    /// # Errors
    /// * `Validation` - Email is blank
    async fn request_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// Consume a reset token and set a new password.
    ///
    /// # Errors
    /// * `ResetTokenNotFound` - No user holds this token (or it was already used)
    /// * `ResetTokenExpired` - Token exists but its expiry has passed
    async fn consume_reset(&self, token: &str, new_password: &str) -> Result<(), IdentityError>;
}

/// Account reads and updates. Callers decide who may reach which operation.
#[async_trait]
pub trait AccountPort: Send + Sync + 'static {
    async fn get_user(&self, id: &PrincipalId) -> Result<UserProfile, IdentityError>;

    async fn list_users(&self, filter: UserFilter) -> Result<Vec<UserProfile>, IdentityError>;

    /// Active top-tier suppliers.
    async fn featured_suppliers(&self) -> Result<Vec<UserProfile>, IdentityError>;

    /// # Errors
    /// * `Validation` - Nothing left to update once blank fields are dropped
    /// * `UserNotFound` - No user with this id
    async fn update_profile(
        &self,
        id: &PrincipalId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, IdentityError>;

    /// Flip the activation gate.
    async fn set_active(
        &self,
        id: &PrincipalId,
        is_active: bool,
    ) -> Result<UserProfile, IdentityError>;

    async fn set_subscription(
        &self,
        id: &PrincipalId,
        tier: SubscriptionTier,
    ) -> Result<UserProfile, IdentityError>;
}

/// Persistence over the admin and user collections.
///
/// Implementations enforce uniqueness of the admin identifier and of user
/// email and phone themselves, and bound every call by a deadline.
#[async_trait]
pub trait PrincipalStore: Send + Sync + 'static {
    /// Match the admin identifier first, then user email or phone.
    async fn resolve_by_identifier(&self, identifier: &str) -> Result<Principal, StoreError>;

    async fn find_admin(&self, identifier: &str) -> Result<Option<AdminPrincipal>, StoreError>;

    /// # Errors
    /// * `Conflict` - An admin with this identifier already exists
    async fn insert_admin(&self, admin: AdminPrincipal) -> Result<(), StoreError>;

    /// User whose email or phone equals `identifier`.
    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserPrincipal>, StoreError>;

    /// User holding either the email or the phone.
    async fn find_user_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Option<UserPrincipal>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserPrincipal>, StoreError>;

    async fn find_user_by_id(&self, id: &PrincipalId)
        -> Result<Option<UserPrincipal>, StoreError>;

    async fn find_user_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<UserPrincipal>, StoreError>;

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserPrincipal>, StoreError>;

    /// # Errors
    /// * `Conflict` - Email or phone already present
    async fn insert_user(&self, user: UserPrincipal) -> Result<PrincipalId, StoreError>;

    /// Apply a partial update and stamp `updated_at`.
    ///
    /// # Returns
    /// Updated record, or None if no user has this ID
    async fn update_user(
        &self,
        id: &PrincipalId,
        update: UserUpdate,
    ) -> Result<Option<UserPrincipal>, StoreError>;

    /// Atomically replace the password hash of the user holding an unexpired
    /// `token` and clear the token and its expiry.
    ///
    /// # Returns
    /// Updated record, or None if no user holds an unexpired matching token
    async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserPrincipal>, StoreError>;
}

/// Hand-off to the email delivery collaborator.
#[async_trait]
pub trait ResetNotifier: Send + Sync + 'static {
    async fn send_reset_token(
        &self,
        user: &UserPrincipal,
        reset: &ResetToken,
    ) -> Result<(), NotifierError>;
}
