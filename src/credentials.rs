// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Credential Hashing
//!
//! Passwords are stretched with PBKDF2-HMAC-SHA256 and a random 16-byte salt.
//! The stored form is self-describing so the iteration count can be raised
//! later without invalidating existing hashes:
//!
//! ```text
//! pbkdf2-sha256$<iterations>$<salt, base64>$<derived key, base64>
//! ```
//!
//! The core record-keeping code only ever handles [`PasswordHash`]; plaintext
//! is confined to [`PasswordHasher::hash`] and [`PasswordHasher::verify`].

use std::fmt;
use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use ring::{
    pbkdf2,
    rand::{SecureRandom, SystemRandom},
};
use serde::{Deserialize, Serialize};

use crate::error::{ArcadeError, ArcadeResult, StoreError};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Encoded, salted password hash.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Accept an already-encoded hash, checking only that it is well-formed.
    pub fn parse(encoded: impl Into<String>) -> ArcadeResult<Self> {
        let encoded = encoded.into();
        if Parts::decode(&encoded).is_none() {
            return Err(ArcadeError::validation("malformed password hash"));
        }
        Ok(Self(encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Decoded components of an encoded hash.
struct Parts {
    iterations: NonZeroU32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl Parts {
    fn decode(encoded: &str) -> Option<Self> {
        let mut fields = encoded.split('$');
        if fields.next()? != SCHEME {
            return None;
        }
        let iterations = NonZeroU32::new(fields.next()?.parse().ok()?)?;
        let salt = Base64::decode_vec(fields.next()?).ok()?;
        let key = Base64::decode_vec(fields.next()?).ok()?;
        if fields.next().is_some() || salt.is_empty() || key.len() != KEY_LEN {
            return None;
        }
        Some(Self {
            iterations,
            salt,
            key,
        })
    }
}

/// Hashing capability handed to the account and profile layers.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(NonZeroU32::new(DEFAULT_ITERATIONS).unwrap_or(NonZeroU32::MIN))
    }
}

impl PasswordHasher {
    pub fn new(iterations: NonZeroU32) -> Self {
        Self {
            iterations,
            rng: SystemRandom::new(),
        }
    }

    /// Hash a plaintext password with a fresh salt.
    pub fn hash(&self, plaintext: &str) -> ArcadeResult<PasswordHash> {
        if plaintext.is_empty() {
            return Err(ArcadeError::validation("password must not be empty"));
        }

        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(randomness_failure)?;

        let mut key = [0u8; KEY_LEN];
        pbkdf2::derive(
            ALGORITHM,
            self.iterations,
            &salt,
            plaintext.as_bytes(),
            &mut key,
        );

        Ok(PasswordHash(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            Base64::encode_string(&salt),
            Base64::encode_string(&key),
        )))
    }

    /// Constant-time comparison of `plaintext` against a stored hash.
    ///
    /// Uses the iteration count recorded in the hash, not the hasher's own.
    pub fn verify(&self, plaintext: &str, hash: &PasswordHash) -> bool {
        let Some(parts) = Parts::decode(hash.as_str()) else {
            return false;
        };
        pbkdf2::verify(
            ALGORITHM,
            parts.iterations,
            &parts.salt,
            plaintext.as_bytes(),
            &parts.key,
        )
        .is_ok()
    }
}

/// A failed salt draw is a server fault, never a client one.
fn randomness_failure(_: ring::error::Unspecified) -> ArcadeError {
    tracing::error!("System randomness unavailable while hashing a password");
    StoreError::Randomness.into()
}
