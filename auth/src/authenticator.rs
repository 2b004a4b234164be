use chrono::Duration;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Password hashing and session token issuance behind one handle.
///
/// Built once at process start. Holds the signing key and the hashing cost,
/// neither of which changes afterwards, so a single instance is shared across
/// all requests without locking.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
}

impl Authenticator {
    /// Create a new authenticator with the default hashing cost.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing
    pub fn new(jwt_secret: &[u8]) -> Self {
        Self::with_hasher(jwt_secret, PasswordHasher::new())
    }

    /// Create an authenticator with an explicitly configured password hasher.
    pub fn with_hasher(jwt_secret: &[u8], password_hasher: PasswordHasher) -> Self {
        Self {
            password_hasher,
            jwt_handler: JwtHandler::new(jwt_secret),
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// # Errors
    /// * `PasswordError` - Stored hash is not a valid PHC string
    pub fn verify_password(
        &self,
        password: &str,
        stored_hash: &str,
    ) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Issue a session token for a principal.
    ///
    /// # Arguments
    /// * `principal_id` - Subject of the token
    /// * `role` - Role claim
    /// * `ttl` - Token lifetime
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_token(
        &self,
        principal_id: impl ToString,
        role: impl ToString,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        self.jwt_handler.encode(&Claims::new(principal_id, role, ttl))
    }

    /// Validate and decode a session token.
    ///
    /// # Errors
    /// * `Malformed`, `SignatureInvalid` or `Expired`
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.jwt_handler.decode(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn authenticator() -> Authenticator {
        Authenticator::with_hasher(
            SECRET,
            PasswordHasher::with_cost(8, 1, 1).expect("valid parameters"),
        )
    }

    #[test]
    fn test_hash_and_verify_password() {
        let authenticator = authenticator();

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        assert!(authenticator.verify_password("my_password", &hash).unwrap());
        assert!(!authenticator.verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_issue_and_validate_token() {
        let authenticator = authenticator();

        let token = authenticator
            .issue_token("user123", "admin", Duration::hours(24))
            .expect("Failed to issue token");

        let decoded = authenticator
            .validate_token(&token)
            .expect("Failed to validate token");

        assert_eq!(decoded.sub, "user123");
        assert_eq!(decoded.role, "admin");
        assert_eq!(decoded.exp - decoded.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_validate_expired_token() {
        let authenticator = authenticator();

        let token = authenticator
            .issue_token("user123", "admin", Duration::seconds(-5))
            .unwrap();

        assert_eq!(authenticator.validate_token(&token), Err(JwtError::Expired));
    }

    #[test]
    fn test_validate_token_from_other_secret() {
        let other = Authenticator::new(b"another_secret_key_at_least_32_bytes");
        let token = other
            .issue_token("user123", "admin", Duration::hours(1))
            .unwrap();

        assert_eq!(
            authenticator().validate_token(&token),
            Err(JwtError::SignatureInvalid)
        );
    }

    #[test]
    fn test_validate_invalid_token() {
        let result = authenticator().validate_token("invalid.token.here");
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }
}
