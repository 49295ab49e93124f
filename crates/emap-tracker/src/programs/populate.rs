use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{ProgramId, ProgramRecord, RecordId, REQUIRED_DOCUMENTS};
use crate::error::ServiceError;
use crate::store::StoreTransaction;

/// Creates the four required documentation records for a freshly inserted program.
/// Runs inside the program's own transaction, so a failure here discards the program.
pub fn populate(
    tx: &mut dyn StoreTransaction,
    program: ProgramId,
    now: DateTime<Utc>,
) -> Result<Vec<ProgramRecord>, ServiceError> {
    let mut created = Vec::with_capacity(REQUIRED_DOCUMENTS.len());
    for (kind, name) in REQUIRED_DOCUMENTS {
        let record = ProgramRecord {
            id: RecordId::generate(),
            program_id: program,
            kind,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        tx.insert_record(record.clone())
            .map_err(|source| ServiceError::PopulationFailure { kind, source })?;
        created.push(record);
    }

    debug!(%program, records = created.len(), "populated required documents");
    Ok(created)
}
