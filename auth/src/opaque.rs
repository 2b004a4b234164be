use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Number of random bytes behind an opaque token (256 bits).
pub const OPAQUE_TOKEN_BYTES: usize = 32;

/// Generate a URL-safe opaque token from the operating system CSPRNG.
///
/// Suitable for single-use credentials such as password reset links.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
