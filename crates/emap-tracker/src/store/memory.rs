use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::domain::{
    AccessKey, EmapStandard, EmapStandardId, Finding, FindingId, KeyDigest, Notification,
    NotificationId, Program, ProgramId, ProgramRecord, RecordId, RecordKind, Review,
    ReviewAssignment, ReviewAssignmentId, ReviewId, Tpriority, TpriorityId, User, UserId,
};

use super::{EntityStore, StoreError, StoreResult, StoreTransaction};

/// Process-local store. Transactions run against a copy of the tables and swap it in
/// on success; the lock is held for the whole transaction, so they are serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default, Clone)]
struct Tables {
    users: HashMap<UserId, User>,
    access_keys: HashMap<KeyDigest, AccessKey>,
    programs: HashMap<ProgramId, Program>,
    records: HashMap<RecordId, ProgramRecord>,
    reviews: HashMap<ReviewId, Review>,
    assignments: HashMap<ReviewAssignmentId, ReviewAssignment>,
    findings: HashMap<FindingId, Finding>,
    tpriorities: HashMap<TpriorityId, Tpriority>,
    emap_standards: HashMap<EmapStandardId, EmapStandard>,
    outbox: Vec<Notification>,
}

#[cfg(test)]
impl MemoryStore {
    /// True while some transaction holds the tables.
    pub(crate) fn in_transaction(&self) -> bool {
        matches!(
            self.tables.try_lock(),
            Err(std::sync::TryLockError::WouldBlock)
        )
    }
}

impl EntityStore for MemoryStore {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut committed = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;

        let mut working = committed.clone();
        let outcome = work(&mut working)?;
        *committed = working;
        Ok(outcome)
    }
}

fn sorted<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(key);
    rows
}

impl Tables {
    fn email_taken(&self, email: &str, except: UserId) -> bool {
        self.users
            .values()
            .any(|user| user.id != except && user.email_address.eq_ignore_ascii_case(email))
    }

    fn program_identity_taken(&self, program: &Program) -> bool {
        self.programs.values().any(|existing| {
            existing.id != program.id
                && existing.name == program.name
                && existing.program_jurisdiction == program.program_jurisdiction
        })
    }

    fn ensure_training_plan(&self, id: RecordId) -> StoreResult<()> {
        match self.records.get(&id) {
            Some(record) if record.kind == RecordKind::TrainingPlan => Ok(()),
            _ => Err(StoreError::MissingReference {
                entity: "tpriority",
                target: "training plan",
            }),
        }
    }
}

const USER_EMAIL: &[&str] = &["email_address"];
const PROGRAM_IDENTITY: &[&str] = &["name", "program_jurisdiction"];
const PRIMARY_KEY: &[&str] = &["id"];

impl StoreTransaction for Tables {
    fn user_count(&self) -> StoreResult<usize> {
        Ok(self.users.len())
    }

    fn insert_user(&mut self, user: User) -> StoreResult<()> {
        if self.users.contains_key(&user.id) {
            return Err(StoreError::UniqueViolation {
                entity: "user",
                fields: PRIMARY_KEY,
            });
        }
        if self.email_taken(&user.email_address, user.id) {
            return Err(StoreError::UniqueViolation {
                entity: "user",
                fields: USER_EMAIL,
            });
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    fn update_user(&mut self, user: User) -> StoreResult<()> {
        if !self.users.contains_key(&user.id) {
            return Err(StoreError::NotFound { entity: "user" });
        }
        if self.email_taken(&user.email_address, user.id) {
            return Err(StoreError::UniqueViolation {
                entity: "user",
                fields: USER_EMAIL,
            });
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    fn fetch_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.trim();
        Ok(self
            .users
            .values()
            .find(|user| user.email_address.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn delete_user(&mut self, id: UserId) -> StoreResult<()> {
        if self.users.remove(&id).is_none() {
            return Err(StoreError::NotFound { entity: "user" });
        }
        self.assignments.retain(|_, assignment| assignment.user_id != id);
        self.access_keys.retain(|_, key| key.user_id != id);
        self.outbox.retain(|notification| notification.user_id != id);
        for program in self.programs.values_mut() {
            if program.owner == Some(id) {
                program.owner = None;
            }
        }
        for finding in self.findings.values_mut() {
            if finding.recorded_by == Some(id) {
                finding.recorded_by = None;
            }
        }
        Ok(())
    }

    fn users(&self) -> StoreResult<Vec<User>> {
        Ok(sorted(self.users.values().cloned().collect(), |user| {
            (user.created_at, user.name.clone())
        }))
    }

    fn insert_access_key(&mut self, key: AccessKey) -> StoreResult<()> {
        if !self.users.contains_key(&key.user_id) {
            return Err(StoreError::MissingReference {
                entity: "access key",
                target: "user",
            });
        }
        if self.access_keys.contains_key(&key.digest) {
            return Err(StoreError::UniqueViolation {
                entity: "access key",
                fields: &["digest"],
            });
        }
        self.access_keys.insert(key.digest.clone(), key);
        Ok(())
    }

    fn update_access_key(&mut self, key: AccessKey) -> StoreResult<()> {
        match self.access_keys.get_mut(&key.digest) {
            Some(existing) => {
                *existing = key;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "access key",
            }),
        }
    }

    fn find_access_key(&self, digest: &KeyDigest) -> StoreResult<Option<AccessKey>> {
        Ok(self.access_keys.get(digest).cloned())
    }

    fn access_keys_for(&self, user: UserId) -> StoreResult<Vec<AccessKey>> {
        Ok(sorted(
            self.access_keys
                .values()
                .filter(|key| key.user_id == user)
                .cloned()
                .collect(),
            |key| key.issued_at,
        ))
    }

    fn insert_program(&mut self, program: Program) -> StoreResult<()> {
        if self.programs.contains_key(&program.id) {
            return Err(StoreError::UniqueViolation {
                entity: "program",
                fields: PRIMARY_KEY,
            });
        }
        if let Some(owner) = program.owner {
            if !self.users.contains_key(&owner) {
                return Err(StoreError::MissingReference {
                    entity: "program",
                    target: "owner",
                });
            }
        }
        if self.program_identity_taken(&program) {
            return Err(StoreError::UniqueViolation {
                entity: "program",
                fields: PROGRAM_IDENTITY,
            });
        }
        self.programs.insert(program.id, program);
        Ok(())
    }

    fn update_program(&mut self, program: Program) -> StoreResult<()> {
        if !self.programs.contains_key(&program.id) {
            return Err(StoreError::NotFound { entity: "program" });
        }
        if self.program_identity_taken(&program) {
            return Err(StoreError::UniqueViolation {
                entity: "program",
                fields: PROGRAM_IDENTITY,
            });
        }
        self.programs.insert(program.id, program);
        Ok(())
    }

    fn fetch_program(&self, id: ProgramId) -> StoreResult<Option<Program>> {
        Ok(self.programs.get(&id).cloned())
    }

    fn delete_program(&mut self, id: ProgramId) -> StoreResult<()> {
        if self.programs.remove(&id).is_none() {
            return Err(StoreError::NotFound { entity: "program" });
        }

        let records: HashSet<RecordId> = self
            .records
            .values()
            .filter(|record| record.program_id == id)
            .map(|record| record.id)
            .collect();
        self.records.retain(|record_id, _| !records.contains(record_id));
        self.tpriorities
            .retain(|_, tpriority| !records.contains(&tpriority.training_plan_id));

        let reviews: HashSet<ReviewId> = self
            .reviews
            .values()
            .filter(|review| review.program_id == id)
            .map(|review| review.id)
            .collect();
        self.reviews.retain(|review_id, _| !reviews.contains(review_id));
        self.assignments
            .retain(|_, assignment| !reviews.contains(&assignment.review_id));
        self.findings
            .retain(|_, finding| !reviews.contains(&finding.review_id));
        Ok(())
    }

    fn programs(&self) -> StoreResult<Vec<Program>> {
        Ok(sorted(self.programs.values().cloned().collect(), |program| {
            (program.name.clone(), program.program_jurisdiction.clone())
        }))
    }

    fn program_reviewers(&self, id: ProgramId) -> StoreResult<Vec<UserId>> {
        let reviews: HashSet<ReviewId> = self
            .reviews
            .values()
            .filter(|review| review.program_id == id)
            .map(|review| review.id)
            .collect();
        let mut reviewers: Vec<UserId> = self
            .assignments
            .values()
            .filter(|assignment| reviews.contains(&assignment.review_id))
            .map(|assignment| assignment.user_id)
            .collect();
        reviewers.sort();
        reviewers.dedup();
        Ok(reviewers)
    }

    fn insert_record(&mut self, record: ProgramRecord) -> StoreResult<()> {
        if !self.programs.contains_key(&record.program_id) {
            return Err(StoreError::MissingReference {
                entity: record.kind.label(),
                target: "program",
            });
        }
        if self.records.contains_key(&record.id) {
            return Err(StoreError::UniqueViolation {
                entity: record.kind.label(),
                fields: PRIMARY_KEY,
            });
        }
        self.records.insert(record.id, record);
        Ok(())
    }

    fn fetch_record(&self, id: RecordId) -> StoreResult<Option<ProgramRecord>> {
        Ok(self.records.get(&id).cloned())
    }

    fn program_records(&self, program: ProgramId) -> StoreResult<Vec<ProgramRecord>> {
        Ok(sorted(
            self.records
                .values()
                .filter(|record| record.program_id == program)
                .cloned()
                .collect(),
            |record| (record.created_at, record.name.clone()),
        ))
    }

    fn insert_review(&mut self, review: Review) -> StoreResult<()> {
        if !self.programs.contains_key(&review.program_id) {
            return Err(StoreError::MissingReference {
                entity: "review",
                target: "program",
            });
        }
        self.reviews.insert(review.id, review);
        Ok(())
    }

    fn fetch_review(&self, id: ReviewId) -> StoreResult<Option<Review>> {
        Ok(self.reviews.get(&id).cloned())
    }

    fn insert_review_assignment(&mut self, assignment: ReviewAssignment) -> StoreResult<()> {
        if !self.reviews.contains_key(&assignment.review_id) {
            return Err(StoreError::MissingReference {
                entity: "review assignment",
                target: "review",
            });
        }
        if !self.users.contains_key(&assignment.user_id) {
            return Err(StoreError::MissingReference {
                entity: "review assignment",
                target: "user",
            });
        }
        let duplicate = self.assignments.values().any(|existing| {
            existing.review_id == assignment.review_id && existing.user_id == assignment.user_id
        });
        if duplicate {
            return Err(StoreError::UniqueViolation {
                entity: "review assignment",
                fields: &["user_id"],
            });
        }
        self.assignments.insert(assignment.id, assignment);
        Ok(())
    }

    fn review_assignments(&self, review: ReviewId) -> StoreResult<Vec<ReviewAssignment>> {
        Ok(sorted(
            self.assignments
                .values()
                .filter(|assignment| assignment.review_id == review)
                .cloned()
                .collect(),
            |assignment| assignment.created_at,
        ))
    }

    fn insert_finding(&mut self, finding: Finding) -> StoreResult<()> {
        if !self.reviews.contains_key(&finding.review_id) {
            return Err(StoreError::MissingReference {
                entity: "finding",
                target: "review",
            });
        }
        self.findings.insert(finding.id, finding);
        Ok(())
    }

    fn program_findings(&self, program: ProgramId) -> StoreResult<Vec<Finding>> {
        let reviews: HashSet<ReviewId> = self
            .reviews
            .values()
            .filter(|review| review.program_id == program)
            .map(|review| review.id)
            .collect();
        Ok(sorted(
            self.findings
                .values()
                .filter(|finding| reviews.contains(&finding.review_id))
                .cloned()
                .collect(),
            |finding| finding.created_at,
        ))
    }

    fn insert_tpriority(&mut self, tpriority: Tpriority) -> StoreResult<()> {
        self.ensure_training_plan(tpriority.training_plan_id)?;
        self.tpriorities.insert(tpriority.id, tpriority);
        Ok(())
    }

    fn update_tpriority(&mut self, tpriority: Tpriority) -> StoreResult<()> {
        if !self.tpriorities.contains_key(&tpriority.id) {
            return Err(StoreError::NotFound {
                entity: "tpriority",
            });
        }
        self.ensure_training_plan(tpriority.training_plan_id)?;
        self.tpriorities.insert(tpriority.id, tpriority);
        Ok(())
    }

    fn fetch_tpriority(&self, id: TpriorityId) -> StoreResult<Option<Tpriority>> {
        Ok(self.tpriorities.get(&id).cloned())
    }

    fn delete_tpriority(&mut self, id: TpriorityId) -> StoreResult<()> {
        self.tpriorities
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                entity: "tpriority",
            })
    }

    fn tpriorities(&self, training_plan: RecordId) -> StoreResult<Vec<Tpriority>> {
        Ok(sorted(
            self.tpriorities
                .values()
                .filter(|tpriority| tpriority.training_plan_id == training_plan)
                .cloned()
                .collect(),
            |tpriority| (tpriority.created_at, tpriority.name.clone()),
        ))
    }

    fn insert_emap_standard(&mut self, standard: EmapStandard) -> StoreResult<()> {
        if self.emap_standards.contains_key(&standard.id) {
            return Err(StoreError::UniqueViolation {
                entity: "emap standard",
                fields: PRIMARY_KEY,
            });
        }
        self.emap_standards.insert(standard.id, standard);
        Ok(())
    }

    fn update_emap_standard(&mut self, standard: EmapStandard) -> StoreResult<()> {
        match self.emap_standards.get_mut(&standard.id) {
            Some(existing) => {
                *existing = standard;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "emap standard",
            }),
        }
    }

    fn fetch_emap_standard(&self, id: EmapStandardId) -> StoreResult<Option<EmapStandard>> {
        Ok(self.emap_standards.get(&id).cloned())
    }

    fn delete_emap_standard(&mut self, id: EmapStandardId) -> StoreResult<()> {
        self.emap_standards
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                entity: "emap standard",
            })
    }

    fn emap_standards(&self) -> StoreResult<Vec<EmapStandard>> {
        Ok(sorted(
            self.emap_standards.values().cloned().collect(),
            |standard| standard.name.clone(),
        ))
    }

    fn enqueue_notification(&mut self, notification: Notification) -> StoreResult<()> {
        self.outbox.push(notification);
        Ok(())
    }

    fn pending_notifications(&self) -> StoreResult<Vec<Notification>> {
        Ok(self.outbox.clone())
    }

    fn record_delivery_attempt(&mut self, id: NotificationId, delivered: bool) -> StoreResult<()> {
        let position = self
            .outbox
            .iter()
            .position(|notification| notification.id == id)
            .ok_or(StoreError::NotFound {
                entity: "notification",
            })?;
        if delivered {
            self.outbox.remove(position);
        } else {
            self.outbox[position].attempts += 1;
        }
        Ok(())
    }
}
