//! Single-use access keys. The raw key is handed to the notifier once; the store only
//! ever sees its SHA-256 digest.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::domain::{AccessKey, KeyDigest, KeyPurpose, UserId};
use crate::error::ServiceError;
use crate::store::{StoreResult, StoreTransaction};

const KEY_BYTES: usize = 32;

pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; KEY_BYTES] = rng.gen();
    hex::encode(bytes)
}

pub fn digest(raw: &str) -> KeyDigest {
    KeyDigest(hex::encode(Sha256::digest(raw.as_bytes())))
}

fn well_formed(raw: &str) -> bool {
    raw.len() == KEY_BYTES * 2 && raw.bytes().all(|byte| byte.is_ascii_hexdigit())
}

/// Issues a key for `user`, superseding every earlier key still outstanding for them.
pub(crate) fn issue(
    tx: &mut dyn StoreTransaction,
    user: UserId,
    purpose: KeyPurpose,
    now: DateTime<Utc>,
    ttl: Duration,
) -> StoreResult<String> {
    for mut stale in tx.access_keys_for(user)? {
        if stale.consumed_at.is_none() && stale.superseded_at.is_none() {
            stale.superseded_at = Some(now);
            tx.update_access_key(stale)?;
        }
    }

    let raw = generate();
    tx.insert_access_key(AccessKey {
        digest: digest(&raw),
        user_id: user,
        purpose,
        issued_at: now,
        expires_at: now + ttl,
        consumed_at: None,
        superseded_at: None,
    })?;
    Ok(raw)
}

/// Consumes `raw` if it is the live key for `user` and `purpose`.
pub(crate) fn redeem(
    tx: &mut dyn StoreTransaction,
    raw: &str,
    user: UserId,
    purpose: KeyPurpose,
    now: DateTime<Utc>,
) -> Result<AccessKey, ServiceError> {
    let raw = raw.trim();
    if !well_formed(raw) {
        return Err(ServiceError::InvalidOrConsumedKey);
    }

    let mut key = tx
        .find_access_key(&digest(&raw.to_ascii_lowercase()))?
        .filter(|key| key.user_id == user && key.purpose == purpose && key.is_redeemable(now))
        .ok_or(ServiceError::InvalidOrConsumedKey)?;

    key.consumed_at = Some(now);
    tx.update_access_key(key.clone())?;
    Ok(key)
}
