//! Admin authentication
//!
//! The configured admin password is salted and hashed at startup. A
//! successful login yields a session token of the form
//! `<expiry unix seconds>.<hex hmac-sha256>`, which admin requests present
//! as a bearer token.

use chrono::{DateTime, Duration, SubsecRound, TimeZone, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid password")]
    InvalidPassword,
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed session token")]
    MalformedToken,
    #[error("session token signature mismatch")]
    BadSignature,
    #[error("session expired")]
    Expired,
    #[error("admin password must not be blank")]
    BlankPassword,
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// HMAC-SHA256 of the password keyed by the salt
fn password_mac(password: &str, salt: &str) -> Result<HmacSha256, AuthError> {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes()).map_err(|_| AuthError::InvalidPassword)?;
    mac.update(password.as_bytes());
    Ok(mac)
}

/// Hash a password with salt
pub fn hash_password(password: &str, salt: &str) -> Result<Vec<u8>, AuthError> {
    Ok(password_mac(password, salt)?.finalize().into_bytes().to_vec())
}

/// The single staff login, stored hashed
#[derive(Clone)]
pub struct AdminCredentials {
    password_hash: Vec<u8>,
    salt: String,
}

impl AdminCredentials {
    pub fn new(password: &str) -> Result<Self, AuthError> {
        if password.trim().is_empty() {
            return Err(AuthError::BlankPassword);
        }
        let salt = random_hex(16);
        let password_hash = hash_password(password, &salt)?;
        Ok(Self { password_hash, salt })
    }

    /// Constant-time check through `hmac`'s `verify_slice`
    pub fn verify(&self, password: &str) -> bool {
        password_mac(password, &self.salt)
            .is_ok_and(|mac| mac.verify_slice(&self.password_hash).is_ok())
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks signed, expiring session tokens
#[derive(Clone)]
pub struct SessionSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: secret.to_vec(),
            ttl,
        }
    }

    /// Signer with a per-process key; tokens do not survive a restart
    pub fn random(ttl: Duration) -> Self {
        Self::new(random_hex(32).as_bytes(), ttl)
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| AuthError::BadSignature)?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    pub fn issue(&self) -> Result<Session, AuthError> {
        self.issue_at(Utc::now())
    }

    pub fn issue_at(&self, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let expires_at = (now + self.ttl).trunc_subsecs(0);
        let payload = expires_at.timestamp().to_string();
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(Session {
            token: format!("{payload}.{signature}"),
            expires_at,
        })
    }

    /// Check a token's signature and expiry, returning when it expires
    pub fn verify(&self, token: &str) -> Result<DateTime<Utc>, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::MalformedToken)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::MalformedToken)?;
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let expiry: i64 = payload.parse().map_err(|_| AuthError::MalformedToken)?;
        let expires_at = Utc
            .timestamp_opt(expiry, 0)
            .single()
            .ok_or(AuthError::MalformedToken)?;
        if now >= expires_at {
            return Err(AuthError::Expired);
        }
        Ok(expires_at)
    }
}

/// Log in with the admin password and get a fresh session
pub fn login(admin: &AdminCredentials, signer: &SessionSigner, password: &str) -> Result<Session, AuthError> {
    if !admin.verify(password) {
        return Err(AuthError::InvalidPassword);
    }
    signer.issue()
}

/// Pull the token out of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}
