//! Account state machine. Each transition is a row in [`TRANSITIONS`]; the service
//! interprets the row instead of hard-coding per-transition branches.

use std::fmt;

use serde::Serialize;

use crate::authorization::Actor;
use crate::domain::{KeyPurpose, NotificationKind, UserState};
use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Invite,
    AcceptInvitation,
    RequestPasswordReset,
    ResetPassword,
    DisableAccount,
    EnableAccount,
}

/// Who may fire a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Administrator,
    /// Whoever presents the key issued for the pending transition.
    KeyHolder,
    Anyone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub transition: Transition,
    /// `None` when the transition creates the account.
    pub from: Option<UserState>,
    pub to: UserState,
    pub available_to: Availability,
    pub consumes: Option<KeyPurpose>,
    pub issues: Option<KeyPurpose>,
    pub notifies: Option<NotificationKind>,
}

pub const TRANSITIONS: [TransitionRule; 6] = [
    TransitionRule {
        transition: Transition::Invite,
        from: None,
        to: UserState::Invited,
        available_to: Availability::Administrator,
        consumes: None,
        issues: Some(KeyPurpose::Invitation),
        notifies: Some(NotificationKind::Invitation),
    },
    TransitionRule {
        transition: Transition::AcceptInvitation,
        from: Some(UserState::Invited),
        to: UserState::Active,
        available_to: Availability::KeyHolder,
        consumes: Some(KeyPurpose::Invitation),
        issues: None,
        notifies: None,
    },
    TransitionRule {
        transition: Transition::RequestPasswordReset,
        from: Some(UserState::Active),
        to: UserState::Active,
        available_to: Availability::Anyone,
        consumes: None,
        issues: Some(KeyPurpose::PasswordReset),
        notifies: Some(NotificationKind::PasswordReset),
    },
    TransitionRule {
        transition: Transition::ResetPassword,
        from: Some(UserState::Active),
        to: UserState::Active,
        available_to: Availability::KeyHolder,
        consumes: Some(KeyPurpose::PasswordReset),
        issues: None,
        notifies: None,
    },
    TransitionRule {
        transition: Transition::DisableAccount,
        from: Some(UserState::Active),
        to: UserState::Disabled,
        available_to: Availability::Administrator,
        consumes: None,
        issues: Some(KeyPurpose::AccountStatus),
        notifies: None,
    },
    TransitionRule {
        transition: Transition::EnableAccount,
        from: Some(UserState::Disabled),
        to: UserState::Active,
        available_to: Availability::Administrator,
        consumes: None,
        issues: Some(KeyPurpose::AccountStatus),
        notifies: None,
    },
];

impl Transition {
    pub const fn label(self) -> &'static str {
        match self {
            Transition::Invite => "invite",
            Transition::AcceptInvitation => "accept_invitation",
            Transition::RequestPasswordReset => "request_password_reset",
            Transition::ResetPassword => "reset_password",
            Transition::DisableAccount => "disable_account",
            Transition::EnableAccount => "enable_account",
        }
    }

    pub fn rule(self) -> &'static TransitionRule {
        let index = match self {
            Transition::Invite => 0,
            Transition::AcceptInvitation => 1,
            Transition::RequestPasswordReset => 2,
            Transition::ResetPassword => 3,
            Transition::DisableAccount => 4,
            Transition::EnableAccount => 5,
        };
        &TRANSITIONS[index]
    }

    pub fn permits(self, actor: &Actor) -> bool {
        match self.rule().available_to {
            Availability::Administrator => actor.is_administrator(),
            Availability::KeyHolder | Availability::Anyone => true,
        }
    }

    /// State an account in `current` moves to, or `InvalidTransition`.
    pub fn target_from(self, current: UserState) -> Result<UserState, ServiceError> {
        let rule = self.rule();
        if rule.from == Some(current) {
            Ok(rule.to)
        } else {
            Err(ServiceError::InvalidTransition {
                transition: self,
                state: current,
            })
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().replace('_', " "))
    }
}
