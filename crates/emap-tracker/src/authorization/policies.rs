use crate::domain::{
    EmapStandardField, ProgramField, ReviewField, TpriorityField, UserField, UserId,
};

use super::{Actor, Permissions};

/// Program rules need the owner and the reviewers derived through its reviews.
#[derive(Debug, Clone, Copy)]
pub struct ProgramAccess<'a> {
    pub owner: Option<UserId>,
    pub reviewers: &'a [UserId],
}

impl ProgramAccess<'_> {
    /// Access for a program that has not been persisted yet.
    pub fn draft() -> ProgramAccess<'static> {
        ProgramAccess {
            owner: None,
            reviewers: &[],
        }
    }

    fn owned_by(&self, actor: &Actor) -> bool {
        matches!((self.owner, actor.id()), (Some(owner), Some(id)) if owner == id)
    }

    fn reviewed_by(&self, actor: &Actor) -> bool {
        actor.id().is_some_and(|id| self.reviewers.contains(&id))
    }

    fn staff(&self, actor: &Actor) -> bool {
        actor.is_administrator() || self.reviewed_by(actor) || self.owned_by(actor)
    }
}

impl Permissions for ProgramAccess<'_> {
    type Field = ProgramField;

    const RESOURCE: &'static str = "program";

    fn create_permitted(&self, actor: &Actor) -> bool {
        actor.is_administrator() || actor.has_program_role()
    }

    fn update_permitted(&self, actor: &Actor, _changed: &[ProgramField]) -> bool {
        self.staff(actor)
    }

    fn destroy_permitted(&self, actor: &Actor) -> bool {
        actor.is_administrator() || self.owned_by(actor)
    }

    fn view_permitted(&self, actor: &Actor, _field: Option<ProgramField>) -> bool {
        self.staff(actor)
    }
}

/// Reviews are administered by administrators; assigned reviewers may add findings.
#[derive(Debug, Clone, Copy)]
pub struct ReviewAccess<'a> {
    pub assigned: &'a [UserId],
}

impl ReviewAccess<'_> {
    fn assigned_to(&self, actor: &Actor) -> bool {
        actor.id().is_some_and(|id| self.assigned.contains(&id))
    }
}

impl Permissions for ReviewAccess<'_> {
    type Field = ReviewField;

    const RESOURCE: &'static str = "review";

    fn create_permitted(&self, actor: &Actor) -> bool {
        actor.is_administrator()
    }

    fn update_permitted(&self, actor: &Actor, changed: &[ReviewField]) -> bool {
        if actor.is_administrator() {
            return true;
        }
        self.assigned_to(actor) && changed.iter().all(|field| *field == ReviewField::Findings)
    }

    fn destroy_permitted(&self, actor: &Actor) -> bool {
        actor.is_administrator()
    }

    fn view_permitted(&self, actor: &Actor, _field: Option<ReviewField>) -> bool {
        actor.is_administrator() || self.assigned_to(actor)
    }
}

/// User rules need the target account and how many accounts exist.
#[derive(Debug, Clone, Copy)]
pub struct UserAccess {
    pub target: Option<UserId>,
    pub existing_users: usize,
}

impl Permissions for UserAccess {
    type Field = UserField;

    const RESOURCE: &'static str = "user";

    /// Only the very first account can be created directly; everyone else is invited.
    fn create_permitted(&self, _actor: &Actor) -> bool {
        self.existing_users == 0
    }

    fn update_permitted(&self, actor: &Actor, changed: &[UserField]) -> bool {
        if actor.is_administrator() {
            return true;
        }
        let editing_self = matches!((self.target, actor.id()), (Some(target), Some(id)) if target == id);
        editing_self
            && changed
                .iter()
                .all(|field| UserField::SELF_SERVICE.contains(field))
    }

    fn destroy_permitted(&self, actor: &Actor) -> bool {
        actor.is_administrator()
    }

    fn view_permitted(&self, _actor: &Actor, _field: Option<UserField>) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TpriorityPolicy;

impl Permissions for TpriorityPolicy {
    type Field = TpriorityField;

    const RESOURCE: &'static str = "tpriority";

    fn create_permitted(&self, actor: &Actor) -> bool {
        actor.signed_up()
    }

    fn update_permitted(&self, actor: &Actor, _changed: &[TpriorityField]) -> bool {
        actor.signed_up()
    }

    fn destroy_permitted(&self, actor: &Actor) -> bool {
        actor.signed_up()
    }

    fn view_permitted(&self, actor: &Actor, _field: Option<TpriorityField>) -> bool {
        actor.signed_up()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmapStandardPolicy;

impl Permissions for EmapStandardPolicy {
    type Field = EmapStandardField;

    const RESOURCE: &'static str = "emap standard";

    fn create_permitted(&self, actor: &Actor) -> bool {
        actor.signed_up()
    }

    fn update_permitted(&self, actor: &Actor, _changed: &[EmapStandardField]) -> bool {
        actor.is_administrator()
    }

    fn destroy_permitted(&self, actor: &Actor) -> bool {
        actor.is_administrator()
    }

    fn view_permitted(&self, _actor: &Actor, _field: Option<EmapStandardField>) -> bool {
        true
    }
}
