//! In-memory storage backend.
//!
//! All state sits behind one `RwLock`, so every multi-step operation
//! (link replacement, cascading delete) runs inside a single write-lock
//! critical section and is atomic with respect to other callers.

use ::async_trait::async_trait;
use benchlog_core::{
    sort_for_listing, Attachment, BenchError, BenchResult, Entity, EntityKind, Equipment,
    ExperimentRecord, ExperimentTemplate, Facility, LinkKind, LinkSet, NewAttachment, NewUser,
    Reagent, RowId, SearchQuery, Searchable, Sop, StorageError, User,
};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{AttachmentStore, EntityStore, LabStore, LinkStore, SearchStore, UserStore};

// ============================================================================
// TABLES
// ============================================================================

/// One table with its own id sequence.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: BTreeMap<RowId, T>,
    next_id: RowId,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn issue_id(&mut self) -> RowId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Whole store state. Link sets are `(record_id, target_id)` pairs, so the
/// composite key is unique by construction.
#[derive(Debug, Default)]
pub struct StoreState {
    facilities: Table<Facility>,
    equipment: Table<Equipment>,
    reagents: Table<Reagent>,
    sops: Table<Sop>,
    templates: Table<ExperimentTemplate>,
    records: Table<ExperimentRecord>,
    attachments: Table<Attachment>,
    users: Table<User>,
    equipment_links: BTreeSet<(RowId, RowId)>,
    reagent_links: BTreeSet<(RowId, RowId)>,
}

impl StoreState {
    fn links(&self, kind: LinkKind) -> &BTreeSet<(RowId, RowId)> {
        match kind {
            LinkKind::Equipment => &self.equipment_links,
            LinkKind::Reagent => &self.reagent_links,
        }
    }

    fn links_mut(&mut self, kind: LinkKind) -> &mut BTreeSet<(RowId, RowId)> {
        match kind {
            LinkKind::Equipment => &mut self.equipment_links,
            LinkKind::Reagent => &mut self.reagent_links,
        }
    }

    fn target_exists(&self, kind: LinkKind, id: RowId) -> bool {
        match kind {
            LinkKind::Equipment => self.equipment.rows.contains_key(&id),
            LinkKind::Reagent => self.reagents.rows.contains_key(&id),
        }
    }
}

/// Maps an entity type to its table inside [`StoreState`].
pub trait MemoryTable: Entity {
    fn table(state: &StoreState) -> &Table<Self>;
    fn table_mut(state: &mut StoreState) -> &mut Table<Self>;

    /// Runs inside the delete critical section, before the row is removed.
    fn on_delete(state: &mut StoreState, id: RowId) {
        if let Some(kind) = LinkKind::targeting(Self::KIND) {
            state.links_mut(kind).retain(|&(_, target)| target != id);
        }
    }
}

macro_rules! memory_table {
    ($entity:ty, $field:ident) => {
        impl MemoryTable for $entity {
            fn table(state: &StoreState) -> &Table<Self> {
                &state.$field
            }

            fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
                &mut state.$field
            }
        }
    };
}

memory_table!(Facility, facilities);
memory_table!(Equipment, equipment);
memory_table!(Reagent, reagents);
memory_table!(Sop, sops);
memory_table!(ExperimentTemplate, templates);

impl MemoryTable for ExperimentRecord {
    fn table(state: &StoreState) -> &Table<Self> {
        &state.records
    }

    fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
        &mut state.records
    }

    fn on_delete(state: &mut StoreState, id: RowId) {
        for kind in LinkKind::ALL {
            state.links_mut(kind).retain(|&(record_id, _)| record_id != id);
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// In-memory storage for tests and single-process development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> BenchResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| BenchError::Storage(StorageError::LockPoisoned))
    }

    fn write(&self) -> BenchResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| BenchError::Storage(StorageError::LockPoisoned))
    }

    /// Number of rows of one entity type.
    pub fn count<E: MemoryTable>(&self) -> BenchResult<usize> {
        Ok(E::table(&*self.read()?).len())
    }

    /// Total link rows of one kind, across all records.
    pub fn link_count(&self, kind: LinkKind) -> BenchResult<usize> {
        Ok(self.read()?.links(kind).len())
    }

    fn modify<E: MemoryTable>(&self, id: RowId, change: impl FnOnce(&mut E)) -> BenchResult<E> {
        let mut state = self.write()?;
        let row = E::table_mut(&mut state)
            .rows
            .get_mut(&id)
            .ok_or_else(|| BenchError::not_found(E::KIND, id))?;
        change(row);
        Ok(row.clone())
    }
}

#[async_trait]
impl<E: MemoryTable> EntityStore<E> for InMemoryStore {
    async fn get(&self, id: RowId) -> BenchResult<Option<E>> {
        Ok(E::table(&*self.read()?).rows.get(&id).cloned())
    }

    async fn list(&self) -> BenchResult<Vec<E>> {
        let mut rows: Vec<E> = E::table(&*self.read()?).rows.values().cloned().collect();
        sort_for_listing(&mut rows);
        Ok(rows)
    }

    async fn create(&self, draft: E::Draft) -> BenchResult<E> {
        E::check_draft(&draft)?;
        let mut state = self.write()?;
        let table = E::table_mut(&mut state);
        let id = table.issue_id();
        let row = E::from_draft(id, draft, Utc::now());
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: RowId, patch: E::Patch) -> BenchResult<E> {
        E::check_patch(&patch)?;
        self.modify(id, |row: &mut E| row.apply_patch(patch, Utc::now()))
    }

    async fn replace(&self, id: RowId, draft: E::Draft) -> BenchResult<E> {
        E::check_draft(&draft)?;
        self.modify(id, |row: &mut E| row.replace(draft, Utc::now()))
    }

    async fn delete(&self, id: RowId) -> BenchResult<()> {
        let mut state = self.write()?;
        if !E::table(&state).rows.contains_key(&id) {
            return Err(BenchError::not_found(E::KIND, id));
        }
        E::on_delete(&mut state, id);
        E::table_mut(&mut state).rows.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl LinkStore for InMemoryStore {
    async fn linked_ids(&self, record_id: RowId, kind: LinkKind) -> BenchResult<Vec<RowId>> {
        let state = self.read()?;
        Ok(state
            .links(kind)
            .range((record_id, RowId::MIN)..=(record_id, RowId::MAX))
            .map(|&(_, target)| target)
            .collect())
    }

    async fn replace_links(
        &self,
        record_id: RowId,
        kind: LinkKind,
        links: &LinkSet,
    ) -> BenchResult<()> {
        let mut state = self.write()?;

        if !state.records.rows.contains_key(&record_id) {
            return Err(BenchError::not_found(EntityKind::Record, record_id));
        }
        if let Some(&missing) = links.ids().iter().find(|&&id| !state.target_exists(kind, id)) {
            return Err(BenchError::not_found(kind.target(), missing));
        }

        let set = state.links_mut(kind);
        set.retain(|&(owner, _)| owner != record_id);
        set.extend(links.ids().iter().map(|&target| (record_id, target)));
        tracing::debug!(record_id, %kind, linked = links.ids().len(), "link set replaced");
        Ok(())
    }
}

#[async_trait]
impl<E: MemoryTable + Searchable> SearchStore<E> for InMemoryStore {
    async fn search(&self, query: &SearchQuery) -> BenchResult<Vec<E>> {
        let mut rows: Vec<E> = E::table(&*self.read()?)
            .rows
            .values()
            .filter(|row| row.matches(query.needle()))
            .cloned()
            .collect();
        sort_for_listing(&mut rows);
        Ok(rows)
    }
}

#[async_trait]
impl AttachmentStore for InMemoryStore {
    async fn attachment_create(&self, new: NewAttachment) -> BenchResult<Attachment> {
        let mut state = self.write()?;
        let id = state.attachments.issue_id();
        let attachment = Attachment::from_new(id, new, Utc::now());
        state.attachments.rows.insert(id, attachment.clone());
        Ok(attachment)
    }

    async fn attachments_for(
        &self,
        kind: EntityKind,
        entity_id: RowId,
    ) -> BenchResult<Vec<Attachment>> {
        let state = self.read()?;
        Ok(state
            .attachments
            .rows
            .values()
            .filter(|a| a.entity_type == kind && a.entity_id == entity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn user_by_email(&self, email: &str) -> BenchResult<Option<User>> {
        let state = self.read()?;
        Ok(state.users.rows.values().find(|u| u.email == email).cloned())
    }

    async fn user_create(&self, new: NewUser) -> BenchResult<User> {
        let mut state = self.write()?;
        if state.users.rows.values().any(|u| u.email == new.email) {
            return Err(BenchError::Storage(StorageError::Duplicate {
                entity_type: EntityKind::User,
                reason: format!("email {} is already registered", new.email),
            }));
        }
        let id = state.users.issue_id();
        let user = User::from_new(id, new, Utc::now());
        state.users.rows.insert(id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl LabStore for InMemoryStore {
    async fn ping(&self) -> BenchResult<()> {
        self.read().map(|_| ())
    }
}

// ============================================================================
// TESTS
// ============================================================================
