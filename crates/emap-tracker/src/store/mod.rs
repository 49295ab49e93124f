//! Persistence boundary. Services only talk to storage through a transaction handle so
//! permission checks, mutations and their side effects commit or roll back together.

mod memory;

use crate::domain::{
    AccessKey, EmapStandard, EmapStandardId, Finding, KeyDigest, Notification, NotificationId,
    Program, ProgramId, ProgramRecord, RecordId, Review, ReviewAssignment, ReviewId, Tpriority,
    TpriorityId, User, UserId,
};

pub use memory::MemoryStore;

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} violates unique constraint on {}", .fields.join(", "))]
    UniqueViolation {
        entity: &'static str,
        fields: &'static [&'static str],
    },
    #[error("{entity} references a missing {target}")]
    MissingReference {
        entity: &'static str,
        target: &'static str,
    },
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage abstraction so the services can be exercised against any backend.
pub trait EntityStore: Send + Sync {
    /// Runs `work` atomically: its writes become visible only if it returns `Ok`.
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<StoreError>;
}

/// Operations available inside a transaction. Inserts and updates enforce unique
/// constraints and foreign keys; deletes cascade to dependent rows.
pub trait StoreTransaction {
    fn user_count(&self) -> StoreResult<usize>;
    fn insert_user(&mut self, user: User) -> StoreResult<()>;
    fn update_user(&mut self, user: User) -> StoreResult<()>;
    fn fetch_user(&self, id: UserId) -> StoreResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Removes the account with its review assignments and access keys. Programs it
    /// owned remain, without an owner.
    fn delete_user(&mut self, id: UserId) -> StoreResult<()>;
    fn users(&self) -> StoreResult<Vec<User>>;

    fn insert_access_key(&mut self, key: AccessKey) -> StoreResult<()>;
    fn update_access_key(&mut self, key: AccessKey) -> StoreResult<()>;
    fn find_access_key(&self, digest: &KeyDigest) -> StoreResult<Option<AccessKey>>;
    fn access_keys_for(&self, user: UserId) -> StoreResult<Vec<AccessKey>>;

    fn insert_program(&mut self, program: Program) -> StoreResult<()>;
    fn update_program(&mut self, program: Program) -> StoreResult<()>;
    fn fetch_program(&self, id: ProgramId) -> StoreResult<Option<Program>>;
    /// Removes the program and every record, training priority, review, assignment
    /// and finding that hangs off it.
    fn delete_program(&mut self, id: ProgramId) -> StoreResult<()>;
    fn programs(&self) -> StoreResult<Vec<Program>>;
    /// Distinct users assigned to any review of the program.
    fn program_reviewers(&self, id: ProgramId) -> StoreResult<Vec<UserId>>;

    fn insert_record(&mut self, record: ProgramRecord) -> StoreResult<()>;
    fn fetch_record(&self, id: RecordId) -> StoreResult<Option<ProgramRecord>>;
    fn program_records(&self, program: ProgramId) -> StoreResult<Vec<ProgramRecord>>;

    fn insert_review(&mut self, review: Review) -> StoreResult<()>;
    fn fetch_review(&self, id: ReviewId) -> StoreResult<Option<Review>>;
    fn insert_review_assignment(&mut self, assignment: ReviewAssignment) -> StoreResult<()>;
    fn review_assignments(&self, review: ReviewId) -> StoreResult<Vec<ReviewAssignment>>;
    fn insert_finding(&mut self, finding: Finding) -> StoreResult<()>;
    fn program_findings(&self, program: ProgramId) -> StoreResult<Vec<Finding>>;

    fn insert_tpriority(&mut self, tpriority: Tpriority) -> StoreResult<()>;
    fn update_tpriority(&mut self, tpriority: Tpriority) -> StoreResult<()>;
    fn fetch_tpriority(&self, id: TpriorityId) -> StoreResult<Option<Tpriority>>;
    fn delete_tpriority(&mut self, id: TpriorityId) -> StoreResult<()>;
    fn tpriorities(&self, training_plan: RecordId) -> StoreResult<Vec<Tpriority>>;

    fn insert_emap_standard(&mut self, standard: EmapStandard) -> StoreResult<()>;
    fn update_emap_standard(&mut self, standard: EmapStandard) -> StoreResult<()>;
    fn fetch_emap_standard(&self, id: EmapStandardId) -> StoreResult<Option<EmapStandard>>;
    fn delete_emap_standard(&mut self, id: EmapStandardId) -> StoreResult<()>;
    fn emap_standards(&self) -> StoreResult<Vec<EmapStandard>>;

    fn enqueue_notification(&mut self, notification: Notification) -> StoreResult<()>;
    /// Undelivered outbox rows, oldest first.
    fn pending_notifications(&self) -> StoreResult<Vec<Notification>>;
    /// A delivered row is removed together with its raw key; a failed one stays
    /// queued with its attempt count bumped.
    fn record_delivery_attempt(&mut self, id: NotificationId, delivered: bool) -> StoreResult<()>;
}
