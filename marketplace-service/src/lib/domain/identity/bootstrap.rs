use std::time::Duration;

use auth::Authenticator;
use chrono::Utc;

use crate::identity::errors::IdentityError;
use crate::identity::errors::StoreError;
use crate::identity::models::AdminPrincipal;
use crate::identity::models::PrincipalId;
use crate::identity::ports::PrincipalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created,
    AlreadyExists,
}

/// Create the admin account unless it already exists.
///
/// Safe to run from several instances at once: the store rejects a second
/// insert for the same identifier and that rejection counts as "already
/// exists".
///
/// # Errors
/// * `StoreTimeout` / `Store` - Persistence failed
/// * `Internal` - Hashing the default password failed
pub async fn ensure_admin_exists<S>(
    store: &S,
    authenticator: &Authenticator,
    identifier: &str,
    default_password: &str,
) -> Result<BootstrapOutcome, IdentityError>
where
    S: PrincipalStore + ?Sized,
{
    if store.find_admin(identifier).await?.is_some() {
        tracing::info!("Admin account already exists");
        return Ok(BootstrapOutcome::AlreadyExists);
    }

    let admin = AdminPrincipal {
        id: PrincipalId::new(),
        identifier: identifier.to_string(),
        password_hash: authenticator.hash_password(default_password)?,
        created_at: Utc::now(),
    };
    let admin_id = admin.id;

    match store.insert_admin(admin).await {
        Ok(()) => {
            tracing::info!(principal_id = %admin_id, "Admin account created");
            Ok(BootstrapOutcome::Created)
        }
        Err(StoreError::Conflict(_)) => {
            tracing::info!("Admin account created concurrently by another instance");
            Ok(BootstrapOutcome::AlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

/// `ensure_admin_exists`, retried while the store is unreachable.
///
/// Only `StoreTimeout` and `Store` errors are retried. The wait starts at
/// `backoff` and doubles after each failed attempt. At least one attempt is
/// always made.
///
/// # Errors
/// The last error once `attempts` are exhausted, or the first error that is
/// not a store failure.
pub async fn ensure_admin_with_retry<S>(
    store: &S,
    authenticator: &Authenticator,
    identifier: &str,
    default_password: &str,
    attempts: u32,
    backoff: Duration,
) -> Result<BootstrapOutcome, IdentityError>
where
    S: PrincipalStore + ?Sized,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    let mut delay = backoff;

    loop {
        match ensure_admin_exists(store, authenticator, identifier, default_password).await {
            Err(e) if is_store_failure(&e) && attempt < attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = attempts,
                    retry_in_ms = delay.as_millis() as u64,
                    "Admin bootstrap failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                delay = delay.saturating_mul(2);
            }
            result => return result,
        }
    }
}

fn is_store_failure(err: &IdentityError) -> bool {
    matches!(err, IdentityError::StoreTimeout | IdentityError::Store(_))
}
