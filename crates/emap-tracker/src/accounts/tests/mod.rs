
use crate::authorization::Actor;
use crate::domain::{Invitation, NewUser, NotificationKind, PasswordChange, User};
use crate::test_support::Harness;

pub(super) fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email_address: email.to_string(),
        password: "correct-horse".to_string(),
        password_confirmation: "correct-horse".to_string(),
        ..NewUser::default()
    }
}

pub(super) fn invitation(name: &str, email: &str) -> Invitation {
    Invitation {
        name: name.to_string(),
        email_address: email.to_string(),
        agency: Some("Polk County EMA".to_string()),
        job_title: None,
    }
}

pub(super) fn password(value: &str) -> PasswordChange {
    PasswordChange {
        current_password: None,
        password: value.to_string(),
        password_confirmation: value.to_string(),
    }
}

/// Signs up the first account, which bootstrap promotes to administrator.
pub(super) fn bootstrap(harness: &Harness) -> User {
    harness
        .accounts
        .sign_up(
            &Actor::anonymous(),
            new_user("Avery Admin", "avery@county.gov"),
        )
        .expect("bootstrap sign-up")
}

pub(super) fn invitation_key(harness: &Harness, user: &User) -> String {
    harness
        .notifier
        .last_key(user.id, NotificationKind::Invitation)
        .expect("invitation delivered")
}

/// Invites `name` and accepts the invitation, returning the active account.
pub(super) fn member(harness: &Harness, admin: &User, name: &str, email: &str) -> User {
    let invited = harness
        .accounts
        .invite(&Actor::user(admin.clone()), invitation(name, email))
        .expect("invite member");
    let key = invitation_key(harness, &invited);
    harness
        .accounts
        .accept_invitation(invited.id, &key, password("member-pass"))
        .expect("accept invitation")
}
