use thiserror::Error;

/// Error for PrincipalId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrincipalIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for PhoneNumber validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("Phone number is required")]
    Empty,

    #[error("Phone number too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("Phone number contains invalid characters")]
    InvalidCharacters,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),

    #[error("Role cannot be requested at registration")]
    Reserved,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Unknown subscription tier: {0}")]
    Unknown(String),
}

/// Errors surfaced by a `PrincipalStore`.
///
/// `Conflict` is the authoritative uniqueness verdict; service-level
/// pre-checks never replace it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate value for unique field: {0}")]
    Conflict(String),

    #[error("Store operation exceeded its deadline")]
    Timeout,

    #[error("Store I/O error: {0}")]
    Io(String),
}

/// Error for reset-token delivery
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Failed to deliver reset token: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for all identity and access operations
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid principal ID: {0}")]
    InvalidPrincipalId(#[from] PrincipalIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid phone: {0}")]
    InvalidPhone(#[from] PhoneError),

    #[error("Invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    #[error("Invalid subscription: {0}")]
    InvalidSubscription(#[from] SubscriptionError),

    #[error("Validation failed: {0}")]
    Validation(String),

    // Domain-level errors
    #[error("An account already exists with this {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is pending activation")]
    AccountPending,

    #[error("Reset token not found")]
    ResetTokenNotFound,

    #[error("Reset token has expired")]
    ResetTokenExpired,

    #[error("User not found: {0}")]
    UserNotFound(String),

    // Infrastructure errors
    #[error("Store operation timed out")]
    StoreTimeout,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => IdentityError::Conflict(field),
            StoreError::Timeout => IdentityError::StoreTimeout,
            StoreError::Io(message) => IdentityError::Store(message),
        }
    }
}

impl From<auth::PasswordError> for IdentityError {
    fn from(err: auth::PasswordError) -> Self {
        IdentityError::Internal(err.to_string())
    }
}

impl From<auth::JwtError> for IdentityError {
    fn from(err: auth::JwtError) -> Self {
        IdentityError::Internal(err.to_string())
    }
}
