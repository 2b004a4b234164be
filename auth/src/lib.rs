//! Authentication utilities library
//!
//! Provides the identity primitives the marketplace service builds on:
//! - Password hashing (Argon2id, tunable cost)
//! - Signed session tokens (JWT, HS256) carrying subject and role
//! - Opaque random tokens for single-use credentials
//!
//! The service defines its own principals and roles; this crate only deals
//! in strings and hashes.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::Authenticator;
//! use chrono::Duration;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!");
//!
//! let token = auth.issue_token("user123", "fournisseur", Duration::hours(24)).unwrap();
//! let claims = auth.validate_token(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert_eq!(claims.role, "fournisseur");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod opaque;
pub mod password;

// Re-export commonly used items
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use opaque::generate_opaque_token;
pub use password::PasswordError;
pub use password::PasswordHasher;
