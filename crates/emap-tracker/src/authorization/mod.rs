//! Per-entity permission predicates evaluated against the acting user.
//!
//! Every mutation and read in the services goes through [`ensure`] with the policy
//! for the entity being touched. Policies never consult ambient state: the acting
//! user is an explicit [`Actor`] and anything else a rule needs (current reviewers,
//! number of existing accounts) is loaded by the caller inside the same transaction.

mod policies;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::domain::{User, UserId};
use crate::error::ServiceError;

pub use policies::{
    EmapStandardPolicy, ProgramAccess, ReviewAccess, TpriorityPolicy, UserAccess,
};

/// The principal performing an operation. Anonymous callers carry no user.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    user: Option<User>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn user(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn account(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn id(&self) -> Option<UserId> {
        self.user.as_ref().map(|user| user.id)
    }

    pub fn is(&self, id: UserId) -> bool {
        self.id() == Some(id)
    }

    pub fn is_administrator(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.administrator)
    }

    pub fn has_program_role(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.program)
    }

    pub fn signed_up(&self) -> bool {
        self.user.as_ref().is_some_and(User::signed_up)
    }

    pub fn is_anonymous(&self) -> bool {
        self.user.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Destroy,
    View,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::View => "view",
        };
        f.write_str(label)
    }
}

/// The four decisions every entity answers. `view_permitted` receives `None` when the
/// record as a whole is being read.
pub trait Permissions {
    type Field: Copy + fmt::Debug;

    const RESOURCE: &'static str;

    fn create_permitted(&self, actor: &Actor) -> bool;
    fn update_permitted(&self, actor: &Actor, changed: &[Self::Field]) -> bool;
    fn destroy_permitted(&self, actor: &Actor) -> bool;
    fn view_permitted(&self, actor: &Actor, field: Option<Self::Field>) -> bool;
}

/// An operation to authorize, with the detail its predicate needs.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a, F> {
    Create,
    Update(&'a [F]),
    Destroy,
    View(Option<F>),
}

impl<F> Request<'_, F> {
    pub fn action(&self) -> Action {
        match self {
            Request::Create => Action::Create,
            Request::Update(_) => Action::Update,
            Request::Destroy => Action::Destroy,
            Request::View(_) => Action::View,
        }
    }
}

pub fn permitted<P: Permissions>(policy: &P, actor: &Actor, request: Request<'_, P::Field>) -> bool {
    match request {
        Request::Create => policy.create_permitted(actor),
        Request::Update(changed) => policy.update_permitted(actor, changed),
        Request::Destroy => policy.destroy_permitted(actor),
        Request::View(field) => policy.view_permitted(actor, field),
    }
}

/// Evaluates the policy and converts a refusal into `PermissionDenied`.
pub fn ensure<P: Permissions>(
    policy: &P,
    actor: &Actor,
    request: Request<'_, P::Field>,
) -> Result<(), ServiceError> {
    let action = request.action();
    let allowed = permitted(policy, actor, request);
    debug!(
        resource = P::RESOURCE,
        %action,
        actor = ?actor.id(),
        allowed,
        "evaluated permission"
    );

    if allowed {
        Ok(())
    } else {
        Err(ServiceError::denied(action, P::RESOURCE))
    }
}
