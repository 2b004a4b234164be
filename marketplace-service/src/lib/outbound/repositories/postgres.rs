use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::identity::errors::StoreError;
use crate::identity::models::AdminPrincipal;
use crate::identity::models::EmailAddress;
use crate::identity::models::PhoneNumber;
use crate::identity::models::Principal;
use crate::identity::models::PrincipalId;
use crate::identity::models::ResetToken;
use crate::identity::models::SubscriptionTier;
use crate::identity::models::UserFilter;
use crate::identity::models::UserPrincipal;
use crate::identity::models::UserUpdate;
use crate::identity::ports::PrincipalStore;

const USER_COLUMNS: &str = "id, email, phone, business_name, password_hash, role, is_active, \
     subscription, wilaya, reset_token, reset_token_expiry, created_at, updated_at";

/// `PrincipalStore` over the `admins` and `users` tables.
///
/// Uniqueness is enforced by the table constraints; every statement runs
/// under the deadline given at construction.
pub struct PostgresPrincipalStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresPrincipalStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| StoreError::Timeout)?
            .map_err(map_sqlx_error)
    }

    async fn fetch_user(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate} LIMIT 1");
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(value)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(UserPrincipal::try_from).transpose()
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some("users_email_key") => "email",
                Some("users_phone_key") => "phone",
                Some("users_reset_token_key") => "reset token",
                Some("admins_identifier_key") => "identifier",
                _ => "unique field",
            };
            return StoreError::Conflict(field.to_string());
        }
    }
    StoreError::Io(e.to_string())
}

#[derive(FromRow)]
struct AdminRow {
    id: Uuid,
    identifier: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<AdminRow> for AdminPrincipal {
    fn from(row: AdminRow) -> Self {
        Self {
            id: PrincipalId(row.id),
            identifier: row.identifier,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    phone: String,
    business_name: String,
    password_hash: String,
    role: String,
    is_active: bool,
    subscription: Option<String>,
    wilaya: Option<String>,
    reset_token: Option<String>,
    reset_token_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserPrincipal {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt =
            |e: &dyn std::fmt::Display| StoreError::Io(format!("Corrupt user row {}: {}", id, e));

        let reset = match (row.reset_token, row.reset_token_expiry) {
            (Some(token), Some(expires_at)) => Some(ResetToken { token, expires_at }),
            _ => None,
        };

        Ok(Self {
            id: PrincipalId(id),
            email: EmailAddress::new(row.email).map_err(|e| corrupt(&e))?,
            phone: PhoneNumber::new(row.phone).map_err(|e| corrupt(&e))?,
            business_name: row.business_name,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(|e| corrupt(&e))?,
            is_active: row.is_active,
            subscription: row
                .subscription
                .as_deref()
                .map(str::parse::<SubscriptionTier>)
                .transpose()
                .map_err(|e| corrupt(&e))?,
            wilaya: row.wilaya,
            reset,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PrincipalStore for PostgresPrincipalStore {
    async fn resolve_by_identifier(&self, identifier: &str) -> Result<Principal, StoreError> {
        if let Some(admin) = self.find_admin(identifier).await? {
            return Ok(Principal::Admin(admin));
        }

        Ok(self
            .find_user_by_identifier(identifier)
            .await?
            .map_or(Principal::NotFound, Principal::User))
    }

    async fn find_admin(&self, identifier: &str) -> Result<Option<AdminPrincipal>, StoreError> {
        let row = self
            .bounded(
                sqlx::query_as::<_, AdminRow>(
                    r#"
                    SELECT id, identifier, password_hash, created_at
                    FROM admins
                    WHERE identifier = $1
                    "#,
                )
                .bind(identifier)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(AdminPrincipal::from))
    }

    async fn insert_admin(&self, admin: AdminPrincipal) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO admins (id, identifier, password_hash, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(admin.id.0)
            .bind(&admin.identifier)
            .bind(&admin.password_hash)
            .bind(admin.created_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        // An email match wins over a phone match held by another user
        self.fetch_user(
            "email = $1 OR phone = $1 ORDER BY (email = $1) DESC",
            identifier,
        )
        .await
    }

    async fn find_user_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR phone = $2 \
             ORDER BY (email = $1) DESC LIMIT 1"
        );
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(email)
                    .bind(phone)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(UserPrincipal::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserPrincipal>, StoreError> {
        self.fetch_user("email = $1", email).await
    }

    async fn find_user_by_id(
        &self,
        id: &PrincipalId,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(id.0)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(UserPrincipal::try_from).transpose()
    }

    async fn find_user_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        self.fetch_user("reset_token = $1", token).await
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserPrincipal>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::TEXT IS NULL OR role = $1) \
             AND ($2::BOOLEAN IS NULL OR is_active = $2) \
             AND ($3::TEXT IS NULL OR subscription = $3) \
             ORDER BY created_at DESC"
        );
        let rows = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(filter.role.map(|role| role.as_str()))
                    .bind(filter.is_active)
                    .bind(filter.subscription.map(|tier| tier.as_str()))
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.into_iter().map(UserPrincipal::try_from).collect()
    }

    async fn insert_user(&self, user: UserPrincipal) -> Result<PrincipalId, StoreError> {
        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO users (
                    id, email, phone, business_name, password_hash, role, is_active,
                    subscription, wilaya, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(user.id.0)
            .bind(user.email.as_str())
            .bind(user.phone.as_str())
            .bind(&user.business_name)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.is_active)
            .bind(user.subscription.map(|tier| tier.as_str()))
            .bind(&user.wilaya)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(user.id)
    }

    async fn update_user(
        &self,
        id: &PrincipalId,
        update: UserUpdate,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        let touch_reset = update.reset.is_some();
        let reset = update.reset.flatten();

        let sql = format!(
            "UPDATE users SET \
                is_active = COALESCE($2, is_active), \
                subscription = COALESCE($3, subscription), \
                password_hash = COALESCE($4, password_hash), \
                reset_token = CASE WHEN $5 THEN $6 ELSE reset_token END, \
                reset_token_expiry = CASE WHEN $5 THEN $7 ELSE reset_token_expiry END, \
                updated_at = $8, \
                business_name = COALESCE($9, business_name), \
                wilaya = COALESCE($10, wilaya) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(id.0)
                    .bind(update.is_active)
                    .bind(update.subscription.map(|tier| tier.as_str()))
                    .bind(update.password_hash)
                    .bind(touch_reset)
                    .bind(reset.as_ref().map(|r| r.token.clone()))
                    .bind(reset.as_ref().map(|r| r.expires_at))
                    .bind(Utc::now())
                    .bind(update.business_name)
                    .bind(update.wilaya)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(UserPrincipal::try_from).transpose()
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserPrincipal>, StoreError> {
        // Single statement: a second consumer finds no matching row
        let sql = format!(
            "UPDATE users SET \
                password_hash = $2, \
                reset_token = NULL, \
                reset_token_expiry = NULL, \
                updated_at = $3 \
             WHERE reset_token = $1 AND reset_token_expiry >= $3 \
             RETURNING {USER_COLUMNS}"
        );
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(token)
                    .bind(new_password_hash)
                    .bind(now)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(UserPrincipal::try_from).transpose()
    }
}
