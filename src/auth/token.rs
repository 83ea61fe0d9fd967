//! Opaque token generation and the expiry rule.

use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use rand::RngCore;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Lifetime of an access/refresh pair, counted from issuance or rotation.
pub const SESSION_TTL_SECS: i64 = 60 * 60;

/// Number of hex characters in every issued token.
pub const TOKEN_LEN: usize = 48;

lazy_static! {
    static ref TOKEN_SHAPE: Regex = Regex::new(&format!("^[0-9a-f]{{{}}}$", TOKEN_LEN))
        .expect("token shape pattern is valid");
}

pub fn session_ttl() -> Duration {
    Duration::seconds(SESSION_TTL_SECS)
}

/// Generates a fresh opaque token.
///
/// 32 bytes from the thread-local CSPRNG are hashed with SHA-256 and the hex digest is
/// cut to [`TOKEN_LEN`] characters, so every token has the same shape.
pub fn generate_token() -> String {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    let mut token = hex::encode(Sha256::digest(seed));
    token.truncate(TOKEN_LEN);
    token
}

/// Returns an (access token, refresh token) pair. The two values are always distinct.
pub fn generate_pair() -> (String, String) {
    let access = generate_token();
    let mut refresh = generate_token();
    while refresh == access {
        refresh = generate_token();
    }
    (access, refresh)
}

/// Whether `value` could have been produced by [`generate_token`].
pub fn is_well_formed(value: &str) -> bool {
    TOKEN_SHAPE.is_match(value)
}

/// A token is expired once its expiry lies strictly in the past.
pub fn is_expired(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> bool {
    expires_at < now
}
