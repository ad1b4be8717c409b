//! API keys
//!
//! A key is handed out once as `<salt>.<secret>`. Only the salt and an
//! HMAC-SHA256 of the secret keyed by the salt are kept, so a stored key
//! cannot be turned back into a usable one.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use sha2::Sha256;
use tracing::info;

use crate::error::{GatewayError, GatewayResult};

const SALT_LEN: usize = 22;
const SECRET_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize)]
pub struct ApiKey {
    pub id: Option<u64>,
    pub description: String,
    expiration: Option<DateTime<Utc>>,
    #[serde(skip)]
    salt: String,
    #[serde(skip)]
    hash: [u8; 32],
}

impl ApiKey {
    /// Create a key; the returned plaintext is not recoverable afterwards
    pub fn create(description: impl Into<String>, expiration: Option<DateTime<Utc>>) -> GatewayResult<(Self, String)> {
        let salt = random_string(SALT_LEN);
        let secret = random_string(SECRET_LEN);
        let mut key = Self {
            id: None,
            description: description.into(),
            expiration: None,
            hash: compute_hash(&salt, &secret)?,
            salt,
        };
        key.set_expiration(expiration)?;
        let plaintext = format!("{}.{}", key.salt, secret);
        info!("Created API key '{}'", key.description);
        Ok((key, plaintext))
    }

    /// Check a plaintext key against this one
    pub fn verify(&self, key: &str) -> bool {
        if !key.starts_with(&self.salt) || key.as_bytes().get(SALT_LEN) != Some(&b'.') {
            return false;
        }
        let Some(secret) = key.get(SALT_LEN + 1..) else {
            return false;
        };
        match HmacSha256::new_from_slice(self.salt.as_bytes()) {
            Ok(mut mac) => {
                mac.update(secret.as_bytes());
                mac.verify_slice(&self.hash).is_ok()
            }
            Err(_) => false,
        }
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Set the expiration; it must lie in the future
    pub fn set_expiration(&mut self, expiration: Option<DateTime<Utc>>) -> GatewayResult<()> {
        if let Some(expiration) = expiration {
            if expiration <= Utc::now() {
                return Err(GatewayError::ApiKeyExpirationPassed(format!(
                    "Expiration {} has already passed",
                    expiration.to_rfc3339()
                )));
            }
        }
        self.expiration = expiration;
        Ok(())
    }

    /// Set the expiration from an RFC 3339 string
    pub fn set_expiration_str(&mut self, expiration: Option<&str>) -> GatewayResult<()> {
        let expiration = expiration
            .map(|value| {
                DateTime::parse_from_rfc3339(value.trim())
                    .map(|date| date.with_timezone(&Utc))
                    .map_err(|e| GatewayError::ApiKeyInvalidExpiration(format!("{}: {}", value, e)))
            })
            .transpose()?;
        self.set_expiration(expiration)
    }

    pub fn is_expired(&self) -> bool {
        self.expiration.map_or(false, |expiration| expiration <= Utc::now())
    }

    /// Whether the plaintext key matches and has not expired yet
    pub fn is_valid(&self, key: &str) -> bool {
        !self.is_expired() && self.verify(key)
    }
}

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn compute_hash(salt: &str, secret: &str) -> GatewayResult<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes())
        .map_err(|e| GatewayError::InvalidParameter(format!("Invalid API key salt: {}", e)))?;
    mac.update(secret.as_bytes());
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&mac.finalize().into_bytes());
    Ok(hash)
}
