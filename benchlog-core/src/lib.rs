//! Benchlog Core - Entity Types
//!
//! Data structures and pure rules shared by storage and API crates:
//! lab entities with their draft/patch payloads, record link sets,
//! search scopes and predicates, and the error taxonomy.

#[macro_use]
mod macros;

pub mod attachment;
pub mod entities;
pub mod entity;
pub mod enums;
pub mod error;
pub mod links;
pub mod search;
pub mod serde_ext;

use chrono::{DateTime, Utc};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Storage-issued row identifier. Ids start at 1 and are never reused.
pub type RowId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

pub use attachment::{Attachment, NewAttachment, NewUser, User};
pub use entities::{
    Equipment, EquipmentDraft, EquipmentPatch, ExperimentRecord, ExperimentRecordDraft,
    ExperimentRecordPatch, ExperimentTemplate, ExperimentTemplateDraft, ExperimentTemplatePatch,
    Facility, FacilityDraft, FacilityPatch, Reagent, ReagentDraft, ReagentPatch, Sop, SopDraft,
    SopPatch,
};
pub use entity::{sort_for_listing, Entity};
pub use enums::{EntityKind, ListOrder};
pub use error::{BenchError, BenchResult, ConfigError, StorageError, ValidationError};
pub use links::{LinkKind, LinkSet};
pub use search::{SearchQuery, SearchResults, SearchScope, SearchTarget, Searchable};
