use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::non_blank;
use super::validation::ValidationErrors;
use super::{FindingId, ProgramId, RecordId, ReviewAssignmentId, ReviewId, UserId};

pub const MAX_TOP_ISSUES: usize = 10;

/// An enrolled emergency management program; the aggregate root for its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub program_jurisdiction: String,
    pub program_state: Option<String>,
    pub program_street: String,
    pub program_city: String,
    pub program_zip: String,
    pub program_contact: String,
    pub contact_title: Option<String>,
    pub contact_phone: String,
    pub contact_mobile: Option<String>,
    pub contact_email: String,
    pub continuous_ca_plan: bool,
    pub proc_for_devel: bool,
    pub ca_tracked: bool,
    pub ca_summary: Option<String>,
    pub ca_resolved: Option<String>,
    /// Ranked corrective-action issues, most pressing first.
    pub top_issues: Vec<String>,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Program {
    pub fn route(&self) -> String {
        format!("/programs/{}", self.id)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.require("program_jurisdiction", &self.program_jurisdiction);
        errors.require("program_street", &self.program_street);
        errors.require("program_city", &self.program_city);
        errors.require("program_zip", &self.program_zip);
        errors.require("program_contact", &self.program_contact);
        errors.require("contact_phone", &self.contact_phone);
        errors.require_email("contact_email", &self.contact_email);
        if self.top_issues.len() > MAX_TOP_ISSUES {
            errors.add(
                "top_issues",
                format!("accepts at most {MAX_TOP_ISSUES} ranked issues"),
            );
        }
        errors.into_result()
    }
}

/// Attributes submitted when enrolling a program.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramInput {
    pub name: String,
    pub program_jurisdiction: String,
    #[serde(default)]
    pub program_state: Option<String>,
    pub program_street: String,
    pub program_city: String,
    pub program_zip: String,
    pub program_contact: String,
    #[serde(default)]
    pub contact_title: Option<String>,
    pub contact_phone: String,
    #[serde(default)]
    pub contact_mobile: Option<String>,
    pub contact_email: String,
    #[serde(default)]
    pub continuous_ca_plan: bool,
    #[serde(default)]
    pub proc_for_devel: bool,
    #[serde(default)]
    pub ca_tracked: bool,
    #[serde(default)]
    pub ca_summary: Option<String>,
    #[serde(default)]
    pub ca_resolved: Option<String>,
    #[serde(default)]
    pub top_issues: Vec<String>,
}

impl ProgramInput {
    pub fn into_program(
        self,
        id: ProgramId,
        owner: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Program {
        Program {
            id,
            name: self.name.trim().to_string(),
            program_jurisdiction: self.program_jurisdiction.trim().to_string(),
            program_state: self.program_state.as_deref().and_then(non_blank),
            program_street: self.program_street,
            program_city: self.program_city,
            program_zip: self.program_zip,
            program_contact: self.program_contact,
            contact_title: self.contact_title.as_deref().and_then(non_blank),
            contact_phone: self.contact_phone,
            contact_mobile: self.contact_mobile.as_deref().and_then(non_blank),
            contact_email: self.contact_email.trim().to_string(),
            continuous_ca_plan: self.continuous_ca_plan,
            proc_for_devel: self.proc_for_devel,
            ca_tracked: self.ca_tracked,
            ca_summary: self.ca_summary,
            ca_resolved: self.ca_resolved,
            top_issues: ranked_issues(self.top_issues),
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

fn ranked_issues(issues: Vec<String>) -> Vec<String> {
    issues
        .iter()
        .filter_map(|issue| non_blank(issue))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramField {
    Name,
    ProgramJurisdiction,
    ProgramState,
    ProgramStreet,
    ProgramCity,
    ProgramZip,
    ProgramContact,
    ContactTitle,
    ContactPhone,
    ContactMobile,
    ContactEmail,
    ContinuousCaPlan,
    ProcForDevel,
    CaTracked,
    CaSummary,
    CaResolved,
    TopIssues,
    Owner,
}

/// Partial update; `None` leaves the attribute untouched. Optional text set to an
/// empty string is cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub program_jurisdiction: Option<String>,
    #[serde(default)]
    pub program_state: Option<String>,
    #[serde(default)]
    pub program_street: Option<String>,
    #[serde(default)]
    pub program_city: Option<String>,
    #[serde(default)]
    pub program_zip: Option<String>,
    #[serde(default)]
    pub program_contact: Option<String>,
    #[serde(default)]
    pub contact_title: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_mobile: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub continuous_ca_plan: Option<bool>,
    #[serde(default)]
    pub proc_for_devel: Option<bool>,
    #[serde(default)]
    pub ca_tracked: Option<bool>,
    #[serde(default)]
    pub ca_summary: Option<String>,
    #[serde(default)]
    pub ca_resolved: Option<String>,
    #[serde(default)]
    pub top_issues: Option<Vec<String>>,
}

impl ProgramPatch {
    /// Applies the patch and reports which attributes actually changed.
    pub fn apply(&self, program: &mut Program) -> Vec<ProgramField> {
        let mut changed = Vec::new();

        let required = [
            (&self.name, &mut program.name, ProgramField::Name),
            (
                &self.program_jurisdiction,
                &mut program.program_jurisdiction,
                ProgramField::ProgramJurisdiction,
            ),
            (
                &self.program_street,
                &mut program.program_street,
                ProgramField::ProgramStreet,
            ),
            (
                &self.program_city,
                &mut program.program_city,
                ProgramField::ProgramCity,
            ),
            (
                &self.program_zip,
                &mut program.program_zip,
                ProgramField::ProgramZip,
            ),
            (
                &self.program_contact,
                &mut program.program_contact,
                ProgramField::ProgramContact,
            ),
            (
                &self.contact_phone,
                &mut program.contact_phone,
                ProgramField::ContactPhone,
            ),
            (
                &self.contact_email,
                &mut program.contact_email,
                ProgramField::ContactEmail,
            ),
        ];
        for (requested, current, field) in required {
            if let Some(value) = requested {
                let value = value.trim();
                if value != current.as_str() {
                    *current = value.to_string();
                    changed.push(field);
                }
            }
        }

        let optional = [
            (
                &self.program_state,
                &mut program.program_state,
                ProgramField::ProgramState,
            ),
            (
                &self.contact_title,
                &mut program.contact_title,
                ProgramField::ContactTitle,
            ),
            (
                &self.contact_mobile,
                &mut program.contact_mobile,
                ProgramField::ContactMobile,
            ),
            (
                &self.ca_summary,
                &mut program.ca_summary,
                ProgramField::CaSummary,
            ),
            (
                &self.ca_resolved,
                &mut program.ca_resolved,
                ProgramField::CaResolved,
            ),
        ];
        for (requested, current, field) in optional {
            if let Some(value) = requested {
                let value = non_blank(value);
                if value != *current {
                    *current = value;
                    changed.push(field);
                }
            }
        }

        let flags = [
            (
                self.continuous_ca_plan,
                &mut program.continuous_ca_plan,
                ProgramField::ContinuousCaPlan,
            ),
            (
                self.proc_for_devel,
                &mut program.proc_for_devel,
                ProgramField::ProcForDevel,
            ),
            (self.ca_tracked, &mut program.ca_tracked, ProgramField::CaTracked),
        ];
        for (requested, current, field) in flags {
            if let Some(value) = requested {
                if value != *current {
                    *current = value;
                    changed.push(field);
                }
            }
        }

        if let Some(issues) = &self.top_issues {
            let issues = ranked_issues(issues.clone());
            if issues != program.top_issues {
                program.top_issues = issues;
                changed.push(ProgramField::TopIssues);
            }
        }

        changed
    }
}

/// Kinds of records a program owns. The first four are created with every program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Eeca,
    Hira,
    Disdec,
    Upload,
    Event,
    TrainingPlan,
}

impl RecordKind {
    pub const fn label(self) -> &'static str {
        match self {
            RecordKind::Eeca => "eeca",
            RecordKind::Hira => "hira",
            RecordKind::Disdec => "disdec",
            RecordKind::Upload => "upload",
            RecordKind::Event => "event",
            RecordKind::TrainingPlan => "training_plan",
        }
    }

    pub fn is_required_document(self) -> bool {
        REQUIRED_DOCUMENTS.iter().any(|(kind, _)| *kind == self)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Documents every program must carry, with the names they are created under.
pub const REQUIRED_DOCUMENTS: [(RecordKind, &str); 4] = [
    (RecordKind::Eeca, "Exercises, Evals & CAs"),
    (RecordKind::Hira, "HIRA"),
    (RecordKind::Disdec, "Disaster Declarations"),
    (RecordKind::Upload, "Organizational Chart"),
];

/// A child record of a program (documentation category, event, or training plan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramRecord {
    pub id: RecordId,
    pub program_id: ProgramId,
    pub kind: RecordKind,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record added to a program after enrollment (events, training plans, extra documents).
#[derive(Debug, Clone, Deserialize)]
pub struct RecordInput {
    pub kind: RecordKind,
    pub name: String,
}

impl RecordInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub program_id: ProgramId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Links a reviewer to a review; the union of these defines a program's reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewAssignment {
    pub id: ReviewAssignmentId,
    pub review_id: ReviewId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub id: FindingId,
    pub review_id: ReviewId,
    pub summary: String,
    pub recorded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentInput {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindingInput {
    pub summary: String,
}

/// Parts of a review that permission checks distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewField {
    Title,
    Assignments,
    Findings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProgramInput {
        ProgramInput {
            name: " Polk County EMA ".to_string(),
            program_jurisdiction: "Polk County".to_string(),
            program_street: "111 Court Ave".to_string(),
            program_city: "Des Moines".to_string(),
            program_zip: "50309".to_string(),
            program_contact: "Dana Ortiz".to_string(),
            contact_phone: "515-555-0100".to_string(),
            contact_email: "dana@county.gov".to_string(),
            top_issues: vec!["Shelter capacity".to_string(), "  ".to_string()],
            ..ProgramInput::default()
        }
    }

    #[test]
    fn input_normalizes_identity_and_issues() {
        let program = input().into_program(ProgramId::generate(), None, Utc::now());
        assert_eq!(program.name, "Polk County EMA");
        assert_eq!(program.top_issues, vec!["Shelter capacity".to_string()]);
        assert!(program.validate().is_ok());
        assert_eq!(program.route(), format!("/programs/{}", program.id));
    }

    #[test]
    fn validation_names_missing_contact_fields() {
        let mut source = input();
        source.contact_phone = String::new();
        source.contact_email = "not-an-email".to_string();
        source.top_issues = (1..=11).map(|rank| format!("issue {rank}")).collect();
        let program = source.into_program(ProgramId::generate(), None, Utc::now());

        let errors = program.validate().expect_err("invalid program");
        assert!(errors.has("contact_phone"));
        assert!(errors.has("contact_email"));
        assert!(errors.has("top_issues"));
    }

    #[test]
    fn patch_clears_optional_text_and_tracks_flags() {
        let mut program = input().into_program(ProgramId::generate(), None, Utc::now());
        program.contact_title = Some("Coordinator".to_string());
        let patch = ProgramPatch {
            contact_title: Some(String::new()),
            ca_tracked: Some(true),
            name: Some("Polk County EMA".to_string()),
            ..ProgramPatch::default()
        };

        let changed = patch.apply(&mut program);

        assert_eq!(
            changed,
            vec![ProgramField::ContactTitle, ProgramField::CaTracked]
        );
        assert_eq!(program.contact_title, None);
    }

    #[test]
    fn required_documents_cover_population_kinds() {
        assert!(RecordKind::Hira.is_required_document());
        assert!(!RecordKind::TrainingPlan.is_required_document());
    }
}
