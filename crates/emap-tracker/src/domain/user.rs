use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;
use super::UserId;

/// Lifecycle state of an account. New accounts start out invited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserState {
    #[default]
    Invited,
    Active,
    Disabled,
}

impl UserState {
    pub const ALL: [UserState; 3] = [UserState::Invited, UserState::Active, UserState::Disabled];

    pub const fn label(self) -> &'static str {
        match self {
            UserState::Invited => "invited",
            UserState::Active => "active",
            UserState::Disabled => "disabled",
        }
    }
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A person with access to the tracker. Role flags are independent of each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email_address: String,
    pub agency: Option<String>,
    pub job_title: Option<String>,
    pub administrator: bool,
    pub reviewer: bool,
    pub program: bool,
    pub state: UserState,
    #[serde(skip_serializing)]
    pub crypted_password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn signed_up(&self) -> bool {
        self.state == UserState::Active
    }

    pub fn blocked(&self) -> bool {
        self.state == UserState::Disabled
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.require_email("email_address", &self.email_address);
        errors.into_result()
    }
}

/// Attributes accepted by the open sign-up path (only usable while no account exists).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email_address: String,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub administrator: bool,
    #[serde(default)]
    pub reviewer: bool,
    #[serde(default)]
    pub program: bool,
    pub password: String,
    pub password_confirmation: String,
}

/// Attributes an administrator supplies when inviting someone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Invitation {
    pub name: String,
    pub email_address: String,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
}

/// New credential plus confirmation, and the current one when a user changes their own.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChange {
    #[serde(default)]
    pub current_password: Option<String>,
    pub password: String,
    pub password_confirmation: String,
}

/// Attributes of a user that updates and field-level view checks refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Name,
    EmailAddress,
    Agency,
    JobTitle,
    Administrator,
    Reviewer,
    Program,
    State,
    CryptedPassword,
    CurrentPassword,
    Password,
    PasswordConfirmation,
}

impl UserField {
    /// Fields a signed-up user may change on their own record.
    pub const SELF_SERVICE: [UserField; 7] = [
        UserField::EmailAddress,
        UserField::Agency,
        UserField::JobTitle,
        UserField::CryptedPassword,
        UserField::CurrentPassword,
        UserField::Password,
        UserField::PasswordConfirmation,
    ];
}

/// Partial update; `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub administrator: Option<bool>,
    #[serde(default)]
    pub reviewer: Option<bool>,
    #[serde(default)]
    pub program: Option<bool>,
    #[serde(default)]
    pub password: Option<PasswordChange>,
}

impl UserPatch {
    /// Applies the patch and reports which attributes actually changed.
    pub fn apply(&self, user: &mut User) -> Vec<UserField> {
        let mut changed = Vec::new();

        if let Some(name) = &self.name {
            if *name != user.name {
                user.name = name.clone();
                changed.push(UserField::Name);
            }
        }
        if let Some(email) = &self.email_address {
            let email = email.trim();
            if email != user.email_address {
                user.email_address = email.to_string();
                changed.push(UserField::EmailAddress);
            }
        }
        if let Some(agency) = &self.agency {
            let agency = non_blank(agency);
            if agency != user.agency {
                user.agency = agency;
                changed.push(UserField::Agency);
            }
        }
        if let Some(job_title) = &self.job_title {
            let job_title = non_blank(job_title);
            if job_title != user.job_title {
                user.job_title = job_title;
                changed.push(UserField::JobTitle);
            }
        }
        for (requested, current, field) in [
            (self.administrator, &mut user.administrator, UserField::Administrator),
            (self.reviewer, &mut user.reviewer, UserField::Reviewer),
            (self.program, &mut user.program, UserField::Program),
        ] {
            if let Some(value) = requested {
                if value != *current {
                    *current = value;
                    changed.push(field);
                }
            }
        }
        if let Some(change) = &self.password {
            if change.current_password.is_some() {
                changed.push(UserField::CurrentPassword);
            }
            changed.push(UserField::Password);
            changed.push(UserField::PasswordConfirmation);
        }

        changed
    }
}

pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::generate(),
            name: "Dana Ortiz".to_string(),
            email_address: "dana@county.gov".to_string(),
            agency: Some("Polk County EMA".to_string()),
            job_title: None,
            administrator: false,
            reviewer: false,
            program: true,
            state: UserState::Active,
            crypted_password: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn derived_predicates_partition_states() {
        let mut user = user();
        for state in UserState::ALL {
            user.state = state;
            let covered = [user.signed_up(), user.blocked(), state == UserState::Invited];
            assert_eq!(covered.iter().filter(|flag| **flag).count(), 1, "{state:?}");
        }
    }

    #[test]
    fn patch_reports_only_real_changes() {
        let mut user = user();
        let patch = UserPatch {
            agency: Some("Polk County EMA".to_string()),
            job_title: Some("Planner".to_string()),
            program: Some(true),
            administrator: Some(true),
            ..UserPatch::default()
        };

        let changed = patch.apply(&mut user);

        assert_eq!(changed, vec![UserField::JobTitle, UserField::Administrator]);
        assert!(user.administrator);
    }
}
