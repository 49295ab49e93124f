//! Entities tracked by the service and the identifiers that key them.

pub mod access;
pub mod catalog;
pub mod program;
pub mod user;
pub mod validation;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(raw.trim()).map(Self)
            }
        }
    };
}

entity_id!(
    /// Account identifier; also the value carried by the acting-user header.
    UserId
);
entity_id!(ProgramId);
entity_id!(
    /// Identifier shared by every program child record (Eeca, Hira, training plans, ...).
    RecordId
);
entity_id!(TpriorityId);
entity_id!(ReviewId);
entity_id!(ReviewAssignmentId);
entity_id!(FindingId);
entity_id!(EmapStandardId);
entity_id!(NotificationId);

pub use access::{AccessKey, KeyDigest, KeyPurpose, Notification, NotificationKind};
pub use catalog::{
    EmapStandard, EmapStandardField, EmapStandardInput, EmapStandardPatch, Tpriority,
    TpriorityField, TpriorityInput, TpriorityPatch,
};
pub use program::{
    AssignmentInput, Finding, FindingInput, Program, ProgramField, ProgramInput, ProgramPatch,
    ProgramRecord, RecordInput, RecordKind, Review, ReviewAssignment, ReviewField, ReviewInput,
    REQUIRED_DOCUMENTS,
};
pub use user::{Invitation, NewUser, PasswordChange, User, UserField, UserPatch, UserState};
pub use validation::{FieldError, ValidationErrors};
