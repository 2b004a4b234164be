use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::identity::errors::EmailError;
use crate::identity::errors::PhoneError;
use crate::identity::errors::PrincipalIdError;
use crate::identity::errors::RoleError;
use crate::identity::errors::SubscriptionError;

/// Unique identifier shared by both principal classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    /// Generate a new random principal ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a principal ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, PrincipalIdError> {
        Uuid::parse_str(s)
            .map(PrincipalId)
            .map_err(|e| PrincipalIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authorization level carried in session tokens.
///
/// `Admin` is reserved for the bootstrap account and satisfies every role
/// requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    /// Buyer-class account
    Pharmacist,
    /// Supplier-class account
    Supplier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pharmacist => "pharmacien",
            Role::Supplier => "fournisseur",
        }
    }

    /// Whether a principal holding `self` may pass a gate requiring `required`.
    pub fn satisfies(&self, required: Role) -> bool {
        *self == Role::Admin || *self == required
    }

    /// Resolve the role requested at registration.
    ///
    /// An absent or blank role falls back to `Pharmacist`. `Admin` can never
    /// be self-assigned.
    ///
    /// # Errors
    /// * `Reserved` - Role is `admin`
    /// * `Unknown` - Role is not recognised
    pub fn for_registration(requested: Option<&str>) -> Result<Self, RoleError> {
        match requested.map(str::trim).filter(|r| !r.is_empty()) {
            None => Ok(Role::Pharmacist),
            Some(raw) => match raw.parse::<Role>()? {
                Role::Admin => Err(RoleError::Reserved),
                role => Ok(role),
            },
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "pharmacien" => Ok(Role::Pharmacist),
            "fournisseur" => Ok(Role::Supplier),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supplier subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionTier {
    Bronze,
    Silver,
    Gold,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Bronze => "bronze",
            SubscriptionTier::Silver => "argent",
            SubscriptionTier::Gold => "or",
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(SubscriptionTier::Bronze),
            "argent" => Ok(SubscriptionTier::Silver),
            "or" => Ok(SubscriptionTier::Gold),
            other => Err(SubscriptionError::Unknown(other.to_string())),
        }
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_string();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Phone number type
///
/// Digits with optional leading `+`. Spaces and dashes are accepted as
/// separators and stripped, so `0661 00 00 00` and `0661-000000` are the
/// same number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MAX_LENGTH: usize = 20;

    /// Create a new validated phone number in canonical form.
    ///
    /// # Errors
    /// * `Empty` - Blank input
    /// * `TooLong` - Longer than 20 characters once separators are removed
    /// * `InvalidCharacters` - Anything other than digits, separators or a leading `+`
    pub fn new(phone: String) -> Result<Self, PhoneError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (prefix, rest) = match phone.strip_prefix('+') {
            Some(rest) => ("+", rest),
            None => ("", phone),
        };
        if !rest
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        {
            return Err(PhoneError::InvalidCharacters);
        }

        let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(PhoneError::InvalidCharacters);
        }

        let normalized = format!("{}{}", prefix, digits);
        if normalized.len() > Self::MAX_LENGTH {
            return Err(PhoneError::TooLong {
                max: Self::MAX_LENGTH,
                actual: normalized.len(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The singleton privileged account.
///
/// Identified by a fixed identifier rather than by email or phone lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminPrincipal {
    pub id: PrincipalId,
    pub identifier: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Pending password reset credential.
///
/// Token and expiry only exist together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Regular marketplace account.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPrincipal {
    pub id: PrincipalId,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub business_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub subscription: Option<SubscriptionTier>,
    pub wilaya: Option<String>,
    pub reset: Option<ResetToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of resolving a login identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    Admin(AdminPrincipal),
    User(UserPrincipal),
    NotFound,
}

/// User view safe to hand out: no password hash, no reset token.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: PrincipalId,
    pub email: String,
    pub phone: String,
    pub business_name: String,
    pub role: Role,
    pub is_active: bool,
    pub subscription: Option<SubscriptionTier>,
    pub wilaya: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserPrincipal> for UserProfile {
    fn from(user: &UserPrincipal) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_string(),
            phone: user.phone.as_str().to_string(),
            business_name: user.business_name.clone(),
            role: user.role,
            is_active: user.is_active,
            subscription: user.subscription,
            wilaya: user.wilaya.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Who a session was issued to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSubject {
    Admin { id: PrincipalId },
    User(UserProfile),
}

impl SessionSubject {
    pub fn id(&self) -> PrincipalId {
        match self {
            SessionSubject::Admin { id } => *id,
            SessionSubject::User(profile) => profile.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            SessionSubject::Admin { .. } => Role::Admin,
            SessionSubject::User(profile) => profile.role,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub subject: SessionSubject,
}

/// Command to register a new user with domain types
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub password: String,
    pub business_name: String,
    pub role: Role,
    pub wilaya: Option<String>,
}

impl RegisterCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `phone` - Validated phone number
    /// * `password` - Plain text password (will be hashed by service)
    /// * `business_name` - Display name of the pharmacy or supplier
    /// * `role` - Non-admin role
    pub fn new(
        email: EmailAddress,
        phone: PhoneNumber,
        password: String,
        business_name: String,
        role: Role,
    ) -> Self {
        Self {
            email,
            phone,
            password,
            business_name,
            role,
            wilaya: None,
        }
    }

    pub fn with_wilaya(mut self, wilaya: Option<String>) -> Self {
        self.wilaya = wilaya.filter(|w| !w.trim().is_empty());
        self
    }
}

/// Partial update applied atomically to a user record.
///
/// `None` leaves a field untouched. `reset: Some(None)` clears the reset token
/// and its expiry together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub is_active: Option<bool>,
    pub subscription: Option<SubscriptionTier>,
    pub password_hash: Option<String>,
    pub reset: Option<Option<ResetToken>>,
    pub business_name: Option<String>,
    pub wilaya: Option<String>,
}

/// Self-service profile fields a user may change.
///
/// Blank values are dropped; at least one field must remain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub business_name: Option<String>,
    pub wilaya: Option<String>,
}

impl ProfileUpdate {
    pub fn new(business_name: Option<String>, wilaya: Option<String>) -> Self {
        let keep = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            business_name: keep(business_name),
            wilaya: keep(wilaya),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.business_name.is_none() && self.wilaya.is_none()
    }
}

impl From<ProfileUpdate> for UserUpdate {
    fn from(profile: ProfileUpdate) -> Self {
        Self {
            business_name: profile.business_name,
            wilaya: profile.wilaya,
            ..Self::default()
        }
    }
}

/// Filter for user listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub subscription: Option<SubscriptionTier>,
}

impl UserFilter {
    /// Active suppliers on the top tier, shown publicly.
    pub fn featured_suppliers() -> Self {
        Self {
            role: Some(Role::Supplier),
            is_active: Some(true),
            subscription: Some(SubscriptionTier::Gold),
        }
    }

    pub fn matches(&self, user: &UserPrincipal) -> bool {
        self.role.map_or(true, |role| user.role == role)
            && self.is_active.map_or(true, |active| user.is_active == active)
            && self
                .subscription
                .map_or(true, |tier| user.subscription == Some(tier))
    }
}
