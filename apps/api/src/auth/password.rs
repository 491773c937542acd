//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt-hex>$<hash-hex>`.

use std::sync::LazyLock;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::validation::FieldErrors;

const SCHEME: &str = "pbkdf2-sha256";
pub const DEFAULT_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Verified against when a login names an unknown email, so both paths pay the
/// same PBKDF2 cost.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| hash_password("compass-unknown-account-0"));

pub fn dummy_hash() -> &'static str {
    DUMMY_HASH.as_str()
}

pub fn hash_password(password: &str) -> String {
    hash_password_with(password, DEFAULT_ITERATIONS)
}

pub fn hash_password_with(password: &str, iterations: u32) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    let hash = pbkdf2_sha256(password.as_bytes(), &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    )
}

/// Returns false for a wrong password and for any malformed stored hash.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    if iterations == 0 || expected.len() != 32 {
        return false;
    }

    let actual = pbkdf2_sha256(password.as_bytes(), &salt, iterations);
    constant_time_eq(&actual, &expected)
}

/// Password policy for new accounts.
pub fn check_password_strength(password: &str, errors: &mut FieldErrors) {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        errors.push(
            "password",
            format!("must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"),
        );
        return;
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        errors.push("password", "must contain at least one letter and one digit");
    }
}

fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut derived);
    derived
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
