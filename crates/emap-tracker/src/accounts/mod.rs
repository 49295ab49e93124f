//! User accounts: bootstrap sign-up, the invite/activate/disable lifecycle with
//! single-use access keys, profile maintenance, and notification dispatch.

pub mod credentials;
pub mod keys;
pub mod lifecycle;
pub mod notifier;
mod service;

#[cfg(test)]
mod tests;

use chrono::Duration;

use crate::config::{AppConfig, DEFAULT_ACCESS_KEY_TTL_HOURS, DEFAULT_PASSWORD_MIN_LENGTH};

pub use credentials::{Argon2Hasher, CredentialError, CredentialHasher};
pub use lifecycle::{Availability, Transition, TransitionRule, TRANSITIONS};
pub use notifier::{Delivery, MemoryNotifier, Notifier, NotifyError, Recipient};
pub use service::{AccountService, FlushReport};

/// Policy dials for the account lifecycle.
#[derive(Debug, Clone)]
pub struct AccountSettings {
    pub key_ttl: Duration,
    pub password_min_length: usize,
    /// Promote the very first account to an active administrator. Off under test execution.
    pub bootstrap_admin: bool,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            key_ttl: Duration::hours(DEFAULT_ACCESS_KEY_TTL_HOURS),
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            bootstrap_admin: true,
        }
    }
}

impl From<&AppConfig> for AccountSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            key_ttl: Duration::hours(config.accounts.access_key_ttl_hours),
            password_min_length: config.accounts.password_min_length,
            bootstrap_admin: !config.environment.is_test(),
        }
    }
}
