use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use chrono::Duration;
use chrono::Utc;

use crate::identity::errors::IdentityError;
use crate::identity::errors::StoreError;
use crate::identity::models::AdminPrincipal;
use crate::identity::models::PhoneNumber;
use crate::identity::models::Principal;
use crate::identity::models::PrincipalId;
use crate::identity::models::RegisterCommand;
use crate::identity::models::Role;
use crate::identity::models::Session;
use crate::identity::models::SessionSubject;
use crate::identity::models::UserPrincipal;
use crate::identity::models::UserProfile;
use crate::identity::ports::AuthenticationPort;
use crate::identity::ports::PrincipalStore;

/// Login and registration over a `PrincipalStore`.
///
/// Holds no mutable state: the authenticator's key and hashing cost are fixed
/// at construction.
pub struct AuthenticationService<S>
where
    S: PrincipalStore,
{
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
    token_ttl: Duration,
    admin_identifier: String,
}

impl<S> AuthenticationService<S>
where
    S: PrincipalStore,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Principal persistence implementation
    /// * `authenticator` - Process-wide hasher and token codec
    /// * `token_ttl` - Lifetime of issued session tokens
    /// * `admin_identifier` - Reserved identifier of the admin account
    pub fn new(
        store: Arc<S>,
        authenticator: Arc<Authenticator>,
        token_ttl: Duration,
        admin_identifier: impl Into<String>,
    ) -> Self {
        Self {
            store,
            authenticator,
            token_ttl,
            admin_identifier: admin_identifier.into(),
        }
    }

    /// Admin password check. `Some` when it matches, `None` to fall through.
    fn try_admin_session(
        &self,
        admin: &AdminPrincipal,
        password: &str,
    ) -> Result<Option<Session>, IdentityError> {
        if !self
            .authenticator
            .verify_password(password, &admin.password_hash)?
        {
            return Ok(None);
        }

        let token = self
            .authenticator
            .issue_token(admin.id, Role::Admin, self.token_ttl)?;

        tracing::info!(principal_id = %admin.id, role = %Role::Admin, "Admin logged in");

        Ok(Some(Session {
            token,
            subject: SessionSubject::Admin { id: admin.id },
        }))
    }

    fn user_session(&self, user: &UserPrincipal, password: &str) -> Result<Session, IdentityError> {
        // Activation is checked only once a record is found
        if !user.is_active {
            tracing::info!(principal_id = %user.id, "Login refused: account pending activation");
            return Err(IdentityError::AccountPending);
        }

        if !self
            .authenticator
            .verify_password(password, &user.password_hash)?
        {
            return Err(IdentityError::InvalidCredentials);
        }

        let token = self
            .authenticator
            .issue_token(user.id, user.role, self.token_ttl)?;

        tracing::info!(principal_id = %user.id, role = %user.role, "User logged in");

        Ok(Session {
            token,
            subject: SessionSubject::User(user.into()),
        })
    }

    fn conflicting_field(&self, existing: &UserPrincipal, command: &RegisterCommand) -> String {
        if existing.email == command.email {
            "email".to_string()
        } else {
            "phone".to_string()
        }
    }
}

#[async_trait]
impl<S> AuthenticationPort for AuthenticationService<S>
where
    S: PrincipalStore,
{
    async fn login(&self, identifier: &str, password: &str) -> Result<Session, IdentityError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(IdentityError::Validation(
                "identifier and password are required".to_string(),
            ));
        }

        // Phones are stored without separators
        let identifier = match PhoneNumber::new(identifier.to_string()) {
            Ok(phone) => phone.as_str().to_string(),
            Err(_) => identifier.to_string(),
        };
        let identifier = identifier.as_str();

        let user = match self.store.resolve_by_identifier(identifier).await? {
            Principal::Admin(admin) => {
                if let Some(session) = self.try_admin_session(&admin, password)? {
                    return Ok(session);
                }
                // Wrong admin password: the same identifier may still name a user
                self.store.find_user_by_identifier(identifier).await?
            }
            Principal::User(user) => Some(user),
            Principal::NotFound => None,
        };

        let user = user.ok_or(IdentityError::InvalidCredentials)?;

        self.user_session(&user, password)
    }

    async fn register(&self, command: RegisterCommand) -> Result<UserProfile, IdentityError> {
        if command.password.is_empty() {
            return Err(IdentityError::Validation("password is required".to_string()));
        }
        if command.business_name.trim().is_empty() {
            return Err(IdentityError::Validation(
                "business name is required".to_string(),
            ));
        }
        if command.role == Role::Admin {
            return Err(IdentityError::Validation(
                "admin role cannot be registered".to_string(),
            ));
        }
        if command.email.as_str() == self.admin_identifier {
            return Err(IdentityError::Conflict("email".to_string()));
        }
        if command.phone.as_str() == self.admin_identifier {
            return Err(IdentityError::Conflict("phone".to_string()));
        }

        // Advisory only: the store's own uniqueness check below is authoritative
        if let Some(existing) = self
            .store
            .find_user_by_email_or_phone(command.email.as_str(), command.phone.as_str())
            .await?
        {
            return Err(IdentityError::Conflict(
                self.conflicting_field(&existing, &command),
            ));
        }

        let password_hash = self.authenticator.hash_password(&command.password)?;

        let now = Utc::now();
        let user = UserPrincipal {
            id: PrincipalId::new(),
            email: command.email,
            phone: command.phone,
            business_name: command.business_name.trim().to_string(),
            password_hash,
            role: command.role,
            is_active: false,
            subscription: None,
            wilaya: command.wilaya,
            reset: None,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_user(user.clone()).await {
            Ok(_) => {
                tracing::info!(principal_id = %user.id, role = %user.role, "User registered");
                Ok(UserProfile::from(&user))
            }
            Err(StoreError::Conflict(field)) => {
                tracing::info!(field = %field, "Registration lost uniqueness race");
                Err(IdentityError::Conflict(field))
            }
            Err(e) => Err(e.into()),
        }
    }
}
