//! Password hashing and bearer token signing, both built on HMAC-SHA256.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Work factor for new hashes when none is configured.
pub const DEFAULT_ROUNDS: u32 = 600_000;

/// Salted PBKDF2 hashes in the form `pbkdf2-sha256$rounds$salt$hash`.
///
/// Stored hashes carry their own round count, so raising `rounds` only
/// affects passwords hashed afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PasswordHasher {
    rounds: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        PasswordHasher {
            rounds: DEFAULT_ROUNDS,
        }
    }
}

impl PasswordHasher {
    /// Zero rounds is bumped to one.
    pub fn new(rounds: u32) -> Self {
        PasswordHasher {
            rounds: rounds.max(1),
        }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let derived = derive_key(password.as_bytes(), &salt, self.rounds);
        format!(
            "{SCHEME}${}${}${}",
            self.rounds,
            hex::encode(salt),
            hex::encode(derived)
        )
    }

    /// Malformed stored hashes never verify.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let mut parts = stored.split('$');
        let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        let (Ok(rounds), Ok(salt), Ok(expected)) =
            (rounds.parse::<u32>(), hex::decode(salt), hex::decode(expected))
        else {
            return false;
        };
        if rounds == 0 || expected.len() != KEY_LEN {
            return false;
        }
        let derived = derive_key(password.as_bytes(), &salt, rounds);
        bool::from(derived[..].ct_eq(&expected))
    }
}

fn derive_key(password: &[u8], salt: &[u8], rounds: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, rounds, &mut key);
    key
}

#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    BadSignature,
    Expired,
}

/// Issues and checks tokens of the form `user_id.issued_at.signature`.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Option<Duration>,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Option<Duration>) -> Self {
        TokenSigner {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(&self, user_id: &str, now: DateTime<Utc>) -> String {
        let claims = format!("{user_id}.{}", now.timestamp());
        let signature = hex::encode(self.mac(&claims).finalize().into_bytes());
        format!("{claims}.{signature}")
    }

    /// Returns the user id the token was issued for.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let (claims, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (user_id, issued_at) = claims.split_once('.').ok_or(TokenError::Malformed)?;
        if user_id.is_empty() {
            return Err(TokenError::Malformed);
        }
        let issued_at: i64 = issued_at.parse().map_err(|_| TokenError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        self.mac(claims)
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        if let Some(ttl) = self.ttl {
            let issued = DateTime::from_timestamp(issued_at, 0).ok_or(TokenError::Malformed)?;
            if now - issued > ttl {
                return Err(TokenError::Expired);
            }
        }
        Ok(user_id.to_owned())
    }

    fn mac(&self, claims: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(claims.as_bytes());
        mac
    }
}
