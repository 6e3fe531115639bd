//! One-time token store.
//!
//! Tokens are 64 random alphanumerics handed out once; only their SHA-256
//! hash is kept. A token is good for a single forwarded submission until it
//! expires. Claiming removes the entry, so two concurrent submissions with
//! the same token cannot both be forwarded.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
use survey_core::models::building::BuildingTag;

/// Token length in characters.
const TOKEN_LEN: usize = 64;

/// Generate a random token (64 alphanumeric chars).
fn generate_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hash a token for storage.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A freshly issued token. The plaintext only exists here.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub building: BuildingTag,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Entry {
    building: BuildingTag,
    expires_at: DateTime<Utc>,
}

/// A token taken out of the store for one submission. Hand it back with
/// [`TokenStore::restore`] if the submission did not go through.
#[derive(Debug)]
pub struct ClaimedToken {
    hash: String,
    entry: Entry,
}

impl ClaimedToken {
    pub fn building(&self) -> BuildingTag {
        self.entry.building
    }
}

/// Concurrent map from token hash to expiry.
#[derive(Debug, Default)]
pub struct TokenStore {
    entries: DashMap<String, Entry>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token valid for `ttl` from now.
    pub fn issue(&self, ttl: Duration, building: BuildingTag) -> IssuedToken {
        self.issue_at(Utc::now(), ttl, building)
    }

    pub fn issue_at(&self, now: DateTime<Utc>, ttl: Duration, building: BuildingTag) -> IssuedToken {
        let token = generate_token();
        let expires_at = now + ttl;
        self.entries.insert(
            hash_token(&token),
            Entry {
                building,
                expires_at,
            },
        );
        IssuedToken {
            token,
            building,
            expires_at,
        }
    }

    /// Whether `token` is known, unclaimed and unexpired.
    pub fn is_live(&self, token: &str) -> bool {
        self.is_live_at(token, Utc::now())
    }

    pub fn is_live_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .get(&hash_token(token))
            .is_some_and(|e| e.expires_at > now)
    }

    /// Take `token` out of the store. `None` when it is unknown, already
    /// claimed or expired.
    pub fn claim(&self, token: &str) -> Option<ClaimedToken> {
        self.claim_at(token, Utc::now())
    }

    pub fn claim_at(&self, token: &str, now: DateTime<Utc>) -> Option<ClaimedToken> {
        let (hash, entry) = self.entries.remove(&hash_token(token))?;
        (entry.expires_at > now).then_some(ClaimedToken { hash, entry })
    }

    /// Put a claimed token back.
    pub fn restore(&self, claimed: ClaimedToken) {
        self.entries.insert(claimed.hash, claimed.entry);
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
