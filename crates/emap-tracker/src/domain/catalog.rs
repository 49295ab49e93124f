use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;
use super::{EmapStandardId, RecordId, TpriorityId};

/// Reference text of an accreditation standard, maintained by administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmapStandard {
    pub id: EmapStandardId,
    pub name: String,
    pub std_lang: String,
    pub tcap_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmapStandard {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmapStandardInput {
    pub name: String,
    #[serde(default)]
    pub std_lang: String,
    #[serde(default)]
    pub tcap_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmapStandardField {
    Name,
    StdLang,
    TcapId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmapStandardPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub std_lang: Option<String>,
    #[serde(default)]
    pub tcap_id: Option<i64>,
}

impl EmapStandardPatch {
    pub fn apply(&self, standard: &mut EmapStandard) -> Vec<EmapStandardField> {
        let mut changed = Vec::new();
        if let Some(name) = &self.name {
            if name.trim() != standard.name {
                standard.name = name.trim().to_string();
                changed.push(EmapStandardField::Name);
            }
        }
        if let Some(std_lang) = &self.std_lang {
            if *std_lang != standard.std_lang {
                standard.std_lang = std_lang.clone();
                changed.push(EmapStandardField::StdLang);
            }
        }
        if self.tcap_id.is_some() && self.tcap_id != standard.tcap_id {
            standard.tcap_id = self.tcap_id;
            changed.push(EmapStandardField::TcapId);
        }
        changed
    }
}

/// A ranked training priority attached to a training plan record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tpriority {
    pub id: TpriorityId,
    pub training_plan_id: RecordId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TpriorityInput {
    pub training_plan_id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TpriorityField {
    Name,
    TrainingPlan,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpriorityPatch {
    #[serde(default)]
    pub name: Option<String>,
}
