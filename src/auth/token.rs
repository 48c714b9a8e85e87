// src/auth/token.rs
//! Session cookie values. The raw value only ever lives in the `session`
//! cookie; the `sessions` table keys rows by its SHA-256 digest.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SESSION_ENTROPY_BYTES: usize = 32;

/// Length of an encoded cookie value: 32 bytes as unpadded base64.
pub const SESSION_TOKEN_LEN: usize = 43;

pub type SessionDigest = [u8; 32];

/// A freshly issued session cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn issue() -> Self {
        Self::issue_from(&mut OsRng)
    }

    pub fn issue_from<R: RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SESSION_ENTROPY_BYTES];
        rng.fill_bytes(&mut bytes);
        SessionToken(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn digest(&self) -> SessionDigest {
        session_digest(&self.0)
    }

    pub fn into_cookie_value(self) -> String {
        self.0
    }
}

/// Digest stored in `sessions.token_hash` for a cookie value.
pub fn session_digest(cookie_value: &str) -> SessionDigest {
    Sha256::digest(cookie_value.as_bytes()).into()
}

/// Whether a cookie value could have been issued by [`SessionToken::issue`].
/// Anything else is answered as signed out without touching the database.
pub fn is_well_formed(cookie_value: &str) -> bool {
    cookie_value.len() == SESSION_TOKEN_LEN
        && cookie_value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
