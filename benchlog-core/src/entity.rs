//! The `Entity` trait: what every stored lab entity can do.
//!
//! Each entity comes in three shapes:
//! - the stored row (`Equipment`), carrying the id and timestamps
//! - a draft (`EquipmentDraft`), the create payload; unknown fields such as a
//!   caller-supplied `id` are ignored so ids are always issued by storage
//! - a patch (`EquipmentPatch`), the sparse update payload where every field
//!   is optional and absent fields keep their previous value

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use crate::{EntityKind, ListOrder, RowId, Timestamp, ValidationError};

/// A stored lab entity with a storage-issued integer id.
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Create payload.
    type Draft: Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Sparse update payload.
    type Patch: Clone + Debug + Default + DeserializeOwned + Send + Sync + 'static;

    const KIND: EntityKind;
    const ORDER: ListOrder;
    /// Column holding the label (`name` or `title`).
    const LABEL_FIELD: &'static str;
    /// Every data column except `id`, `created_at` and `updated_at`.
    const FIELDS: &'static [&'static str];

    fn id(&self) -> RowId;
    fn label(&self) -> &str;
    fn created_at(&self) -> Timestamp;

    /// Build a fresh row from a draft.
    fn from_draft(id: RowId, draft: Self::Draft, now: Timestamp) -> Self;

    /// Overwrite only the fields present in the patch.
    fn apply_patch(&mut self, patch: Self::Patch, now: Timestamp);

    /// Overwrite every field except `id` and `created_at`.
    fn replace(&mut self, draft: Self::Draft, now: Timestamp);

    fn check_draft(draft: &Self::Draft) -> Result<(), ValidationError>;
    fn check_patch(patch: &Self::Patch) -> Result<(), ValidationError>;
}

/// Sort rows into the entity's natural listing order.
pub fn sort_for_listing<E: Entity>(rows: &mut [E]) {
    match E::ORDER {
        ListOrder::NewestFirst => rows.sort_by(|a, b| b.id().cmp(&a.id())),
        ListOrder::ByLabel => {
            rows.sort_by(|a, b| a.label().cmp(b.label()).then(a.id().cmp(&b.id())))
        }
    }
}

pub(crate) fn require_label(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    Ok(())
}
