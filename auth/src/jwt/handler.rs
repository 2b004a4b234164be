use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;

/// JWT token handler for encoding and decoding session tokens.
///
/// Uses HS256 (HMAC with SHA-256). The keys are derived once from the secret
/// and never change for the lifetime of the handler.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Encode claims into a signed JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// The signature is checked before the expiry, so a tampered token is
    /// reported as `SignatureInvalid` even when it is also stale.
    ///
    /// # Errors
    /// * `Malformed` - Token is not a well-formed JWT or lacks required claims
    /// * `SignatureInvalid` - Signature does not match the secret
    /// * `Expired` - `exp` lies in the past
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::Expired,
                    ErrorKind::InvalidSignature => JwtError::SignatureInvalid,
                    _ => JwtError::Malformed(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    #[test]
    fn test_encode_and_decode() {
        let handler = JwtHandler::new(SECRET);
        let claims = Claims::new("user123", "admin", Duration::hours(1));

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert!(!token.is_empty());

        let decoded = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_decode_invalid_token() {
        let handler = JwtHandler::new(SECRET);

        let result = handler.decode("invalid.token.here");
        assert!(matches!(result, Err(JwtError::Malformed(_))));

        let result = handler.decode("");
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let handler1 = JwtHandler::new(b"secret1_at_least_32_bytes_long_key!");
        let handler2 = JwtHandler::new(b"secret2_at_least_32_bytes_long_key!");

        let claims = Claims::new("user123", "admin", Duration::hours(1));
        let token = handler1.encode(&claims).expect("Failed to encode token");

        let result = handler2.decode(&token);
        assert_eq!(result, Err(JwtError::SignatureInvalid));
    }

    #[test]
    fn test_decode_tampered_payload() {
        let handler = JwtHandler::new(SECRET);

        let genuine = handler
            .encode(&Claims::new("user123", "pharmacien", Duration::hours(1)))
            .unwrap();
        let forged = handler
            .encode(&Claims::new("user123", "admin", Duration::hours(1)))
            .unwrap();

        // Forged payload spliced onto the genuine signature
        let genuine_parts: Vec<&str> = genuine.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let tampered = format!(
            "{}.{}.{}",
            genuine_parts[0], forged_parts[1], genuine_parts[2]
        );

        assert_eq!(handler.decode(&tampered), Err(JwtError::SignatureInvalid));
    }

    #[test]
    fn test_decode_expired() {
        let handler = JwtHandler::new(SECRET);
        let claims = Claims::new("user123", "admin", Duration::seconds(-10));

        let token = handler.encode(&claims).unwrap();
        assert_eq!(handler.decode(&token), Err(JwtError::Expired));
    }
}
