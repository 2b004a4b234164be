use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Session token claims.
///
/// Carries the authenticated subject, its role and the validity window.
/// Timestamps are Unix seconds as in RFC 7519.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (principal identifier)
    pub sub: String,

    /// Role claim checked by authorization gates
    pub role: String,

    /// Issued at
    pub iat: i64,

    /// Expiration time
    pub exp: i64,
}

impl Claims {
    /// Create claims for a principal valid for `ttl` from now.
    pub fn new(subject: impl ToString, role: impl ToString, ttl: Duration) -> Self {
        Self::issued_at(subject, role, Utc::now(), ttl)
    }

    /// Create claims issued at an explicit instant.
    ///
    /// # Arguments
    /// * `subject` - Principal identifier
    /// * `role` - Role claim
    /// * `issued_at` - Issue instant
    /// * `ttl` - Lifetime of the token
    pub fn issued_at(
        subject: impl ToString,
        role: impl ToString,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_new_claims() {
        let claims = Claims::new("user123", "pharmacien", Duration::hours(24));

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.role, "pharmacien");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_issued_at() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let claims = Claims::issued_at("admin-id", "admin", issued, Duration::minutes(30));

        assert_eq!(claims.iat, issued.timestamp());
        assert_eq!(claims.exp, issued.timestamp() + 1800);
        assert_eq!(claims.role, "admin");
    }
}
