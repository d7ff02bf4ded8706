//! Account domain model

use std::ops::RangeInclusive;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Range public account numbers are drawn from. Zero means "not assigned".
pub const ACCOUNT_NUMBER_RANGE: RangeInclusive<i64> = 1..=i64::MAX;

/// A ledger participant
///
/// `id` is assigned by the store on insert; `number` is the public
/// identifier embedded in issued tokens and is not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub number: i64,
    pub email: String,
    /// Argon2id PHC string, never sent to clients
    #[serde(skip_serializing, default)]
    pub encrypted_password: Option<String>,
    /// Minor currency units
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Build a fresh, unpersisted account
    ///
    /// Draws a random public number, hashes the password when one is given
    /// and stamps the creation time. The balance starts at zero.
    pub fn open(email: impl Into<String>, password: Option<&str>) -> Result<Self> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(Error::validation("email cannot be empty"));
        }

        let encrypted_password = password.map(hash_password).transpose()?;

        Ok(Self {
            id: 0,
            number: rand::thread_rng().gen_range(ACCOUNT_NUMBER_RANGE),
            email,
            encrypted_password,
            balance: 0,
            // Stored with microsecond precision, so truncate up front
            created_at: Utc::now().trunc_subsecs(6),
        })
    }

    /// Check a candidate password against the stored hash
    ///
    /// Accounts opened without a password never verify.
    pub fn verify_password(&self, candidate: &str) -> Result<()> {
        let stored = self
            .encrypted_password
            .as_deref()
            .ok_or_else(|| Error::unauthorized("account has no password"))?;

        let parsed = PasswordHash::new(stored)
            .map_err(|e| Error::CredentialHashing(e.to_string()))?;

        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .map_err(|_| Error::unauthorized("password mismatch"))
    }
}

/// Hash a password with Argon2id and a random salt
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::CredentialHashing(e.to_string()))
}
