
use crate::authorization::Actor;
use crate::domain::{Program, User};
use crate::store::EntityStore;
use crate::test_support::{program_input, Harness};

/// Persists `user` directly, skipping the invitation flow.
pub(super) fn seed(harness: &Harness, user: &User) {
    let user = user.clone();
    harness
        .store
        .transaction(|tx| tx.insert_user(user))
        .expect("seed user");
}

pub(super) fn enroll(harness: &Harness, owner: &User, name: &str, jurisdiction: &str) -> Program {
    harness
        .programs
        .create_program(&Actor::user(owner.clone()), program_input(name, jurisdiction))
        .expect("create program")
}
