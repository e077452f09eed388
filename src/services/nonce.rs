//! Short-lived form tokens tying a submission to the user and action that
//! requested the form.
//!
//! A nonce is valid for the 12-hour tick in which it was issued and the one
//! after it, so a form opened just before a tick boundary still submits.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Action name bound into metabox nonces.
pub const METABOX_NONCE_ACTION: &str = "breaking_news_save";

const NONCE_LIFETIME_SECS: i64 = 24 * 60 * 60;
const NONCE_LENGTH: usize = 20;

pub struct NonceIssuer {
    secret: String,
}

impl NonceIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn create(&self, action: &str, user_id: Uuid, now: DateTime<Utc>) -> String {
        self.digest(tick(now), action, user_id)
    }

    pub fn verify(&self, nonce: &str, action: &str, user_id: Uuid, now: DateTime<Utc>) -> bool {
        if nonce.is_empty() {
            return false;
        }
        let current = tick(now);
        [current, current - 1]
            .iter()
            .any(|t| constant_time_eq(&self.digest(*t, action, user_id), nonce))
    }

    fn digest(&self, tick: i64, action: &str, user_id: Uuid) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(format!("|{tick}|{action}|{user_id}").as_bytes());
        let mut out = hex::encode(hasher.finalize());
        out.truncate(NONCE_LENGTH);
        out
    }
}

fn tick(now: DateTime<Utc>) -> i64 {
    let half = NONCE_LIFETIME_SECS / 2;
    (now.timestamp() + half - 1).div_euclid(half)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
