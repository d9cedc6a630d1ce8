//! Async storage traits.
//!
//! Every backend implements the full set; [`LabStore`] bundles them into one
//! object-safe trait so the API can hold an `Arc<dyn LabStore>` and pick the
//! backend at startup.
//!
//! Because `LabStore` inherits `EntityStore<E>` once per entity type, call
//! entity methods with the type spelled out:
//!
//! ```ignore
//! let sop = EntityStore::<Sop>::get(store, id).await?;
//! ```

use ::async_trait::async_trait;
use benchlog_core::{
    Attachment, BenchResult, Entity, EntityKind, Equipment, ExperimentRecord,
    ExperimentTemplate, Facility, LinkKind, LinkSet, NewAttachment, NewUser, Reagent, RowId,
    SearchQuery, Searchable, Sop, User,
};

/// CRUD over one entity table.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Get a row by id.
    async fn get(&self, id: RowId) -> BenchResult<Option<E>>;

    /// All rows in the entity's natural order.
    async fn list(&self) -> BenchResult<Vec<E>>;

    /// Insert a new row under a freshly issued id.
    async fn create(&self, draft: E::Draft) -> BenchResult<E>;

    /// Apply a sparse patch. Fails with `NotFound` when the row is missing.
    async fn update(&self, id: RowId, patch: E::Patch) -> BenchResult<E>;

    /// Overwrite every field except id and `created_at`.
    async fn replace(&self, id: RowId, draft: E::Draft) -> BenchResult<E>;

    /// Delete a row, together with any link rows that reference it, as one
    /// atomic step. Fails with `NotFound` when the row is missing.
    async fn delete(&self, id: RowId) -> BenchResult<()>;
}

/// Record-to-catalog link sets.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Linked target ids, ascending. Empty for unknown records.
    async fn linked_ids(&self, record_id: RowId, kind: LinkKind) -> BenchResult<Vec<RowId>>;

    /// Replace the whole link set of one record atomically.
    ///
    /// Fails with `NotFound` (and writes nothing) if the record or any
    /// target id does not exist. Concurrent replacements of the same record
    /// are serialized: the final set is exactly one caller's set.
    async fn replace_links(&self, record_id: RowId, kind: LinkKind, links: &LinkSet)
        -> BenchResult<()>;
}

/// Substring search over one entity table.
#[async_trait]
pub trait SearchStore<E: Entity + Searchable>: Send + Sync {
    /// Rows where any search field contains the query, in natural order.
    async fn search(&self, query: &SearchQuery) -> BenchResult<Vec<E>>;
}

/// Attachment metadata.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn attachment_create(&self, new: NewAttachment) -> BenchResult<Attachment>;

    /// Attachments of one entity, oldest first.
    async fn attachments_for(&self, kind: EntityKind, entity_id: RowId)
        -> BenchResult<Vec<Attachment>>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user_by_email(&self, email: &str) -> BenchResult<Option<User>>;

    /// Insert a user. Fails with `StorageError::Duplicate` if the email is taken.
    async fn user_create(&self, new: NewUser) -> BenchResult<User>;
}

/// Everything the API needs from a backend.
#[async_trait]
pub trait LabStore:
    EntityStore<Facility>
    + EntityStore<Equipment>
    + EntityStore<Reagent>
    + EntityStore<Sop>
    + EntityStore<ExperimentTemplate>
    + EntityStore<ExperimentRecord>
    + SearchStore<Equipment>
    + SearchStore<Facility>
    + SearchStore<Reagent>
    + SearchStore<ExperimentRecord>
    + LinkStore
    + AttachmentStore
    + UserStore
{
    /// Cheap liveness probe for readiness checks.
    async fn ping(&self) -> BenchResult<()>;

    /// Whether a row of `kind` exists.
    async fn exists(&self, kind: EntityKind, id: RowId) -> BenchResult<bool> {
        Ok(match kind {
            EntityKind::Facility => EntityStore::<Facility>::get(self, id).await?.is_some(),
            EntityKind::Equipment => EntityStore::<Equipment>::get(self, id).await?.is_some(),
            EntityKind::Reagent => EntityStore::<Reagent>::get(self, id).await?.is_some(),
            EntityKind::Sop => EntityStore::<Sop>::get(self, id).await?.is_some(),
            EntityKind::Template => {
                EntityStore::<ExperimentTemplate>::get(self, id).await?.is_some()
            }
            EntityKind::Record => EntityStore::<ExperimentRecord>::get(self, id).await?.is_some(),
            EntityKind::Attachment | EntityKind::User => false,
        })
    }
}
