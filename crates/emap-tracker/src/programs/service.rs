use std::sync::Arc;

use tracing::info;

use crate::authorization::{ensure, permitted, Actor, ProgramAccess, Request, ReviewAccess};
use crate::clock::{Clock, SystemClock};
use crate::domain::{
    AssignmentInput, Finding, FindingId, FindingInput, Program, ProgramField, ProgramId,
    ProgramInput, ProgramPatch, ProgramRecord, RecordId, RecordInput, Review, ReviewAssignment,
    ReviewAssignmentId, ReviewField, ReviewId, ReviewInput, User, UserId, ValidationErrors,
};
use crate::error::ServiceError;
use crate::store::{EntityStore, StoreTransaction};

use super::populate::populate;

/// Program operations. Every call takes the acting user explicitly.
pub struct ProgramService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

/// A program together with the reviewers its permission rules depend on.
struct Staffed {
    program: Program,
    reviewers: Vec<UserId>,
}

impl Staffed {
    fn load(tx: &dyn StoreTransaction, id: ProgramId) -> Result<Self, ServiceError> {
        let program = tx
            .fetch_program(id)?
            .ok_or(ServiceError::not_found("program"))?;
        let reviewers = tx.program_reviewers(id)?;
        Ok(Self { program, reviewers })
    }

    fn access(&self) -> ProgramAccess<'_> {
        ProgramAccess {
            owner: self.program.owner,
            reviewers: &self.reviewers,
        }
    }
}

/// A review with the users assigned to it.
struct Assigned {
    review: Review,
    assigned: Vec<UserId>,
}

impl Assigned {
    fn load(tx: &dyn StoreTransaction, id: ReviewId) -> Result<Self, ServiceError> {
        let review = tx
            .fetch_review(id)?
            .ok_or(ServiceError::not_found("review"))?;
        let assigned = tx
            .review_assignments(id)?
            .into_iter()
            .map(|assignment| assignment.user_id)
            .collect();
        Ok(Self { review, assigned })
    }

    fn access(&self) -> ReviewAccess<'_> {
        ReviewAccess {
            assigned: &self.assigned,
        }
    }
}

impl<S> ProgramService<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Enrolls a program owned by the actor, together with its required documents.
    pub fn create_program(&self, actor: &Actor, input: ProgramInput) -> Result<Program, ServiceError> {
        let now = self.clock.now();
        let program = self.store.transaction(|tx| -> Result<Program, ServiceError> {
            ensure(&ProgramAccess::draft(), actor, Request::Create)?;

            let program = input.into_program(ProgramId::generate(), actor.id(), now);
            program.validate()?;
            tx.insert_program(program.clone())?;
            populate(tx, program.id, now)?;
            Ok(program)
        })?;

        info!(
            program_id = %program.id,
            owner = ?program.owner,
            route = %program.route(),
            "program created"
        );
        Ok(program)
    }

    pub fn view_program(&self, actor: &Actor, id: ProgramId) -> Result<Program, ServiceError> {
        self.store.transaction(|tx| -> Result<Program, ServiceError> {
            let staffed = Staffed::load(tx, id)?;
            ensure(&staffed.access(), actor, Request::View(None))?;
            Ok(staffed.program)
        })
    }

    /// Programs the actor is allowed to see.
    pub fn list_programs(&self, actor: &Actor) -> Result<Vec<Program>, ServiceError> {
        self.store.transaction(|tx| -> Result<Vec<Program>, ServiceError> {
            let mut visible = Vec::new();
            for program in tx.programs()? {
                let reviewers = tx.program_reviewers(program.id)?;
                let access = ProgramAccess {
                    owner: program.owner,
                    reviewers: &reviewers,
                };
                if permitted(&access, actor, Request::View(None)) {
                    visible.push(program);
                }
            }
            Ok(visible)
        })
    }

    pub fn update_program(
        &self,
        actor: &Actor,
        id: ProgramId,
        patch: ProgramPatch,
    ) -> Result<Program, ServiceError> {
        let now = self.clock.now();
        let (program, changed) = self.store.transaction(
            |tx| -> Result<(Program, Vec<ProgramField>), ServiceError> {
                let staffed = Staffed::load(tx, id)?;
                let mut program = staffed.program.clone();
                let changed = patch.apply(&mut program);
                ensure(&staffed.access(), actor, Request::Update(&changed))?;

                program.validate()?;
                program.updated_at = now;
                tx.update_program(program.clone())?;
                Ok((program, changed))
            },
        )?;

        info!(program_id = %program.id, changed = ?changed, "program updated");
        Ok(program)
    }

    /// Removes the program and everything attached to it.
    pub fn destroy_program(&self, actor: &Actor, id: ProgramId) -> Result<(), ServiceError> {
        self.store.transaction(|tx| -> Result<(), ServiceError> {
            let staffed = Staffed::load(tx, id)?;
            ensure(&staffed.access(), actor, Request::Destroy)?;
            tx.delete_program(id)?;
            Ok(())
        })?;

        info!(program_id = %id, destroyed_by = ?actor.id(), "program destroyed");
        Ok(())
    }

    pub fn add_record(
        &self,
        actor: &Actor,
        program_id: ProgramId,
        input: RecordInput,
    ) -> Result<ProgramRecord, ServiceError> {
        let now = self.clock.now();
        let record = self.store.transaction(|tx| -> Result<ProgramRecord, ServiceError> {
            let staffed = Staffed::load(tx, program_id)?;
            ensure(&staffed.access(), actor, Request::Update(&[]))?;
            input.validate()?;

            let record = ProgramRecord {
                id: RecordId::generate(),
                program_id,
                kind: input.kind,
                name: input.name.trim().to_string(),
                created_at: now,
                updated_at: now,
            };
            tx.insert_record(record.clone())?;
            Ok(record)
        })?;

        info!(%program_id, record_id = %record.id, kind = %record.kind, "program record added");
        Ok(record)
    }

    pub fn program_records(
        &self,
        actor: &Actor,
        program_id: ProgramId,
    ) -> Result<Vec<ProgramRecord>, ServiceError> {
        self.store.transaction(|tx| -> Result<Vec<ProgramRecord>, ServiceError> {
            let staffed = Staffed::load(tx, program_id)?;
            ensure(&staffed.access(), actor, Request::View(None))?;
            Ok(tx.program_records(program_id)?)
        })
    }

    /// The records created by population, one per required documentation kind.
    pub fn required_documents(
        &self,
        actor: &Actor,
        program_id: ProgramId,
    ) -> Result<Vec<ProgramRecord>, ServiceError> {
        let records = self.program_records(actor, program_id)?;
        Ok(records
            .into_iter()
            .filter(|record| record.kind.is_required_document())
            .collect())
    }

    pub fn open_review(
        &self,
        actor: &Actor,
        program_id: ProgramId,
        input: ReviewInput,
    ) -> Result<Review, ServiceError> {
        let now = self.clock.now();
        let review = self.store.transaction(|tx| -> Result<Review, ServiceError> {
            ensure(&ReviewAccess { assigned: &[] }, actor, Request::Create)?;
            tx.fetch_program(program_id)?
                .ok_or(ServiceError::not_found("program"))?;

            let mut errors = ValidationErrors::new();
            errors.require("title", &input.title);
            errors.into_result()?;

            let review = Review {
                id: ReviewId::generate(),
                program_id,
                title: input.title.trim().to_string(),
                created_at: now,
            };
            tx.insert_review(review.clone())?;
            Ok(review)
        })?;

        info!(%program_id, review_id = %review.id, "review opened");
        Ok(review)
    }

    /// Assigns a user holding the reviewer role to a review, which also makes them a
    /// reviewer of the review's program.
    pub fn assign_reviewer(
        &self,
        actor: &Actor,
        review_id: ReviewId,
        input: AssignmentInput,
    ) -> Result<ReviewAssignment, ServiceError> {
        let now = self.clock.now();
        let assignment = self.store.transaction(|tx| -> Result<ReviewAssignment, ServiceError> {
            let assigned = Assigned::load(tx, review_id)?;
            ensure(
                &assigned.access(),
                actor,
                Request::Update(&[ReviewField::Assignments]),
            )?;

            let user: User = tx
                .fetch_user(input.user_id)?
                .ok_or(ServiceError::not_found("user"))?;
            if !user.reviewer {
                return Err(ServiceError::invalid(
                    "user_id",
                    "does not hold the reviewer role",
                ));
            }

            let assignment = ReviewAssignment {
                id: ReviewAssignmentId::generate(),
                review_id,
                user_id: user.id,
                created_at: now,
            };
            tx.insert_review_assignment(assignment.clone())?;
            Ok(assignment)
        })?;

        info!(%review_id, user_id = %assignment.user_id, "reviewer assigned");
        Ok(assignment)
    }

    pub fn record_finding(
        &self,
        actor: &Actor,
        review_id: ReviewId,
        input: FindingInput,
    ) -> Result<Finding, ServiceError> {
        let now = self.clock.now();
        let finding = self.store.transaction(|tx| -> Result<Finding, ServiceError> {
            let assigned = Assigned::load(tx, review_id)?;
            ensure(
                &assigned.access(),
                actor,
                Request::Update(&[ReviewField::Findings]),
            )?;

            let mut errors = ValidationErrors::new();
            errors.require("summary", &input.summary);
            errors.into_result()?;

            let finding = Finding {
                id: FindingId::generate(),
                review_id: assigned.review.id,
                summary: input.summary.trim().to_string(),
                recorded_by: actor.id(),
                created_at: now,
            };
            tx.insert_finding(finding.clone())?;
            Ok(finding)
        })?;

        info!(%review_id, finding_id = %finding.id, "finding recorded");
        Ok(finding)
    }

    pub fn program_findings(
        &self,
        actor: &Actor,
        program_id: ProgramId,
    ) -> Result<Vec<Finding>, ServiceError> {
        self.store.transaction(|tx| -> Result<Vec<Finding>, ServiceError> {
            let staffed = Staffed::load(tx, program_id)?;
            ensure(&staffed.access(), actor, Request::View(None))?;
            Ok(tx.program_findings(program_id)?)
        })
    }

    /// Users assigned to any review of the program.
    pub fn program_reviewers(
        &self,
        actor: &Actor,
        program_id: ProgramId,
    ) -> Result<Vec<User>, ServiceError> {
        self.store.transaction(|tx| -> Result<Vec<User>, ServiceError> {
            let staffed = Staffed::load(tx, program_id)?;
            ensure(&staffed.access(), actor, Request::View(None))?;

            let mut reviewers = Vec::with_capacity(staffed.reviewers.len());
            for id in &staffed.reviewers {
                if let Some(user) = tx.fetch_user(*id)? {
                    reviewers.push(user);
                }
            }
            Ok(reviewers)
        })
    }
}
