//! Record Service
//!
//! Lifecycle of experiment records. Updates are full replacements; deletes
//! take the record's equipment and reagent links with them.

use benchlog_core::{Entity, ExperimentRecord, ExperimentRecordDraft, RowId};
use benchlog_storage::{EntityStore, LabStore};

use crate::error::ApiResult;

/// Create a record under a fresh id.
pub async fn create_record(
    store: &dyn LabStore,
    draft: ExperimentRecordDraft,
) -> ApiResult<ExperimentRecord> {
    let record = EntityStore::<ExperimentRecord>::create(store, draft).await?;
    tracing::info!(record_id = record.id(), title = %record.title, "Record created");
    Ok(record)
}

/// Overwrite every field of a record except its id and `created_at`.
pub async fn update_record(
    store: &dyn LabStore,
    id: RowId,
    draft: ExperimentRecordDraft,
) -> ApiResult<ExperimentRecord> {
    Ok(EntityStore::<ExperimentRecord>::replace(store, id, draft).await?)
}

/// Delete a record and its link rows in one step.
pub async fn delete_record(store: &dyn LabStore, id: RowId) -> ApiResult<()> {
    EntityStore::<ExperimentRecord>::delete(store, id).await?;
    tracing::info!(record_id = id, "Record deleted");
    Ok(())
}
