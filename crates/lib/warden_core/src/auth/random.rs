//! Secure random tokens: CSRF tokens, OTPs and single-use link tokens.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Random bytes behind a CSRF token (128 hex chars).
pub const CSRF_TOKEN_BYTES: usize = 64;

/// Random bytes behind a generic secure token (64 hex chars).
pub const SECURE_TOKEN_BYTES: usize = 32;

/// Default OTP length in digits.
pub const DEFAULT_OTP_LENGTH: usize = 6;

/// Largest multiple of ten that fits in a byte; bytes at or above it are redrawn.
const OTP_BYTE_CEILING: u8 = 250;

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a CSRF token: 64 random bytes, hex-encoded.
pub fn generate_csrf_token() -> String {
    random_hex(CSRF_TOKEN_BYTES)
}

/// Generate a generic secure token (password reset / e-mail verification links).
///
/// The caller persists it with an expiry and invalidates it after use.
pub fn generate_secure_token() -> String {
    random_hex(SECURE_TOKEN_BYTES)
}

/// Generate a numeric OTP of `length` digits.
///
/// Each digit comes from one random byte reduced mod 10; bytes >= 250 are
/// redrawn so every digit is equally likely.
pub fn generate_secure_otp(length: usize) -> String {
    let mut rng = rand::rng();
    let mut otp = String::with_capacity(length);
    let mut buf = [0u8; 1];
    while otp.len() < length {
        rng.fill_bytes(&mut buf);
        if buf[0] < OTP_BYTE_CEILING {
            otp.push(char::from(b'0' + buf[0] % 10));
        }
    }
    otp
}

/// SHA-256 hash a token for storage.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare two byte strings in constant time. Lengths are not secret.
pub fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.ct_eq(right).into()
}
