//! Generic CRUD route handlers for catalog entities.
//!
//! These helpers work for any [`Entity`] the store can hold. The catalog
//! module wraps them in per-entity handlers that carry the OpenAPI docs and
//! do the extraction.

use axum::Json;
use benchlog_core::{Entity, RowId};
use benchlog_storage::{EntityStore, LabStore};

use crate::{
    error::{ApiError, ApiResult},
    state::SharedStore,
    types::OkResponse,
};

// ============================================================================
// GENERIC HANDLER HELPERS
// ============================================================================

/// All rows in the entity's natural order.
pub async fn list_handler<E>(store: SharedStore) -> ApiResult<Json<Vec<E>>>
where
    E: Entity,
    dyn LabStore: EntityStore<E>,
{
    let rows = EntityStore::<E>::list(&*store).await?;
    Ok(Json(rows))
}

/// One row by id, 404 when missing.
pub async fn get_handler<E>(store: SharedStore, id: RowId) -> ApiResult<Json<E>>
where
    E: Entity,
    dyn LabStore: EntityStore<E>,
{
    EntityStore::<E>::get(&*store, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::entity_not_found(E::KIND.display_name(), id))
}

/// Create a row from a draft; any id in the body is ignored.
pub async fn create_handler<E>(store: SharedStore, draft: E::Draft) -> ApiResult<Json<E>>
where
    E: Entity,
    dyn LabStore: EntityStore<E>,
{
    let row = EntityStore::<E>::create(&*store, draft).await?;
    tracing::debug!(kind = %E::KIND, id = row.id(), "Created");
    Ok(Json(row))
}

/// Apply the fields present in the body, keep the rest.
pub async fn update_handler<E>(store: SharedStore, id: RowId, patch: E::Patch) -> ApiResult<Json<E>>
where
    E: Entity,
    dyn LabStore: EntityStore<E>,
{
    let row = EntityStore::<E>::update(&*store, id, patch).await?;
    Ok(Json(row))
}

pub async fn delete_handler<E>(store: SharedStore, id: RowId) -> ApiResult<Json<OkResponse>>
where
    E: Entity,
    dyn LabStore: EntityStore<E>,
{
    EntityStore::<E>::delete(&*store, id).await?;
    tracing::debug!(kind = %E::KIND, id, "Deleted");
    Ok(Json(OkResponse::ok()))
}
