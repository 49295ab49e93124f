use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NotificationId, UserId};

/// What a single-use access key unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPurpose {
    Invitation,
    PasswordReset,
    /// Issued when an administrator disables or enables an account; never redeemable.
    AccountStatus,
}

/// Hex SHA-256 of a raw key. Raw keys only ever leave the service inside notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct KeyDigest(pub String);

/// Stored half of an access key, bound to one user and one pending transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKey {
    pub digest: KeyDigest,
    pub user_id: UserId,
    pub purpose: KeyPurpose,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    /// Set when a newer key was issued to the same user.
    pub superseded_at: Option<DateTime<Utc>>,
}

impl AccessKey {
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && self.superseded_at.is_none() && now < self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Invitation,
    PasswordReset,
}

/// Outbox entry written in the same transaction as the transition that caused it.
/// It carries the raw key only until the notifier accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub user_id: UserId,
    pub name: String,
    pub email_address: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
}
