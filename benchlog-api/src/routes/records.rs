//! Experiment Record REST API Routes
//!
//! Records have a full-replace `PUT` and carry two link sets, equipment and
//! reagents, each replaced as a whole.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use benchlog_core::{ExperimentRecord, ExperimentRecordDraft, LinkKind};
use serde_json::Value as JsonValue;

use crate::{
    error::{ApiError, ApiResult},
    extractors::{JsonBody, PathId},
    routes::generic,
    services::{link_service, record_service},
    state::{AppState, SharedStore},
    types::{LinkIdsResponse, OkResponse, SetLinksResponse},
};

// ============================================================================
// RECORD CRUD
// ============================================================================

/// GET /records - List records, newest first
#[utoipa::path(
    get,
    path = "/records",
    tag = "Records",
    responses(
        (status = 200, description = "All records, newest first", body = Vec<ExperimentRecord>),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_records(State(store): State<SharedStore>) -> ApiResult<Json<Vec<ExperimentRecord>>> {
    generic::list_handler::<ExperimentRecord>(store).await
}

/// GET /records/{id} - Get a record by id
#[utoipa::path(
    get,
    path = "/records/{id}",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record details", body = ExperimentRecord),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Record not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_record(
    State(store): State<SharedStore>,
    PathId(id): PathId,
) -> ApiResult<Json<ExperimentRecord>> {
    generic::get_handler::<ExperimentRecord>(store, id).await
}

/// POST /records - Create a record
#[utoipa::path(
    post,
    path = "/records",
    tag = "Records",
    request_body = ExperimentRecordDraft,
    responses(
        (status = 200, description = "Record created", body = ExperimentRecord),
        (status = 400, description = "Invalid request", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_record(
    State(store): State<SharedStore>,
    JsonBody(draft): JsonBody<ExperimentRecordDraft>,
) -> ApiResult<Json<ExperimentRecord>> {
    let record = record_service::create_record(store.as_ref(), draft).await?;
    Ok(Json(record))
}

/// PUT /records/{id} - Replace every field of a record
#[utoipa::path(
    put,
    path = "/records/{id}",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    request_body = ExperimentRecordDraft,
    responses(
        (status = 200, description = "Record replaced", body = ExperimentRecord),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Record not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_record(
    State(store): State<SharedStore>,
    PathId(id): PathId,
    JsonBody(draft): JsonBody<ExperimentRecordDraft>,
) -> ApiResult<Json<ExperimentRecord>> {
    let record = record_service::update_record(store.as_ref(), id, draft).await?;
    Ok(Json(record))
}

/// DELETE /records/{id} - Delete a record and its links
#[utoipa::path(
    delete,
    path = "/records/{id}",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record deleted", body = OkResponse),
        (status = 404, description = "Record not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_record(
    State(store): State<SharedStore>,
    PathId(id): PathId,
) -> ApiResult<Json<OkResponse>> {
    record_service::delete_record(store.as_ref(), id).await?;
    Ok(Json(OkResponse::ok()))
}

// ============================================================================
// LINK SETS
// ============================================================================

/// GET /records/{id}/equipment-ids
#[utoipa::path(
    get,
    path = "/records/{id}/equipment-ids",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "Linked equipment ids, ascending", body = LinkIdsResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_equipment_ids(
    State(store): State<SharedStore>,
    PathId(id): PathId,
) -> ApiResult<Json<LinkIdsResponse>> {
    linked(store, id, LinkKind::Equipment).await
}

/// GET /records/{id}/reagent-ids
#[utoipa::path(
    get,
    path = "/records/{id}/reagent-ids",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "Linked reagent ids, ascending", body = LinkIdsResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_reagent_ids(
    State(store): State<SharedStore>,
    PathId(id): PathId,
) -> ApiResult<Json<LinkIdsResponse>> {
    linked(store, id, LinkKind::Reagent).await
}

/// POST /records/{id}/set-equipment - Replace the equipment link set
#[utoipa::path(
    post,
    path = "/records/{id}/set-equipment",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    request_body(content = Object, description = "`{\"ids\": [...]}`; integers, integral floats or integer strings"),
    responses(
        (status = 200, description = "Links replaced; count is the submitted list length", body = SetLinksResponse),
        (status = 400, description = "ids is not a list of integers", body = ApiError),
        (status = 404, description = "Record or equipment not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_equipment(
    State(store): State<SharedStore>,
    PathId(id): PathId,
    JsonBody(body): JsonBody<JsonValue>,
) -> ApiResult<Json<SetLinksResponse>> {
    replace(store, id, LinkKind::Equipment, body).await
}

/// POST /records/{id}/set-reagents - Replace the reagent link set
#[utoipa::path(
    post,
    path = "/records/{id}/set-reagents",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    request_body(content = Object, description = "`{\"ids\": [...]}`; integers, integral floats or integer strings"),
    responses(
        (status = 200, description = "Links replaced; count is the submitted list length", body = SetLinksResponse),
        (status = 400, description = "ids is not a list of integers", body = ApiError),
        (status = 404, description = "Record or reagent not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_reagents(
    State(store): State<SharedStore>,
    PathId(id): PathId,
    JsonBody(body): JsonBody<JsonValue>,
) -> ApiResult<Json<SetLinksResponse>> {
    replace(store, id, LinkKind::Reagent, body).await
}

async fn linked(store: SharedStore, id: i64, kind: LinkKind) -> ApiResult<Json<LinkIdsResponse>> {
    let ids = link_service::linked_ids(store.as_ref(), id, kind).await?;
    Ok(Json(LinkIdsResponse { ids }))
}

async fn replace(
    store: SharedStore,
    id: i64,
    kind: LinkKind,
    body: JsonValue,
) -> ApiResult<Json<SetLinksResponse>> {
    let count = link_service::set_linked_ids(store.as_ref(), id, kind, &body).await?;
    Ok(Json(SetLinksResponse { ok: true, count }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the records router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_records).post(create_record))
        .route("/:id", get(get_record).put(update_record).delete(delete_record))
        .route("/:id/equipment-ids", get(get_equipment_ids))
        .route("/:id/reagent-ids", get(get_reagent_ids))
        .route("/:id/set-equipment", post(set_equipment))
        .route("/:id/set-reagents", post(set_reagents))
}
