use std::sync::Mutex;

use serde::Serialize;

use crate::domain::{NotificationKind, UserId};

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub user_id: UserId,
    pub name: String,
    pub email_address: String,
}

/// Mail transport collaborator. Implementations receive the raw single-use key.
pub trait Notifier: Send + Sync {
    fn send_invite(&self, recipient: &Recipient, key: &str) -> Result<(), NotifyError>;
    fn send_password_reset(&self, recipient: &Recipient, key: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// A delivery captured by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub kind: NotificationKind,
    pub recipient: Recipient,
    pub key: String,
}

/// Records deliveries instead of sending them; used by tests and the demo.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    deliveries: Mutex<Vec<Delivery>>,
}

impl MemoryNotifier {
    pub fn deliveries(&self) -> Vec<Delivery> {
        match self.deliveries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Most recent key delivered to `user` for the given kind.
    pub fn last_key(&self, user: UserId, kind: NotificationKind) -> Option<String> {
        self.deliveries()
            .into_iter()
            .rev()
            .find(|delivery| delivery.recipient.user_id == user && delivery.kind == kind)
            .map(|delivery| delivery.key)
    }

    fn record(&self, kind: NotificationKind, recipient: &Recipient, key: &str) -> Result<(), NotifyError> {
        let mut deliveries = self
            .deliveries
            .lock()
            .map_err(|_| NotifyError::Transport("memory notifier poisoned".to_string()))?;
        deliveries.push(Delivery {
            kind,
            recipient: recipient.clone(),
            key: key.to_string(),
        });
        Ok(())
    }
}

impl Notifier for MemoryNotifier {
    fn send_invite(&self, recipient: &Recipient, key: &str) -> Result<(), NotifyError> {
        self.record(NotificationKind::Invitation, recipient, key)
    }

    fn send_password_reset(&self, recipient: &Recipient, key: &str) -> Result<(), NotifyError> {
        self.record(NotificationKind::PasswordReset, recipient, key)
    }
}
