//! Upload REST API Routes
//!
//! `POST /uploads` takes a multipart form with a `file` part; the owning
//! entity comes from the query string.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use benchlog_core::RowId;

use crate::{
    error::{ApiError, ApiResult},
    services::upload_service::{self, UploadSettings, UploadedFile},
    state::{AppState, SharedStore},
    types::{AttachmentResponse, UploadParams},
};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(e.body_text())
    } else {
        ApiError::invalid_input(e.body_text())
    }
}

/// Pull the `file` part out of the form, ignoring any other parts.
async fn read_file_part(mut multipart: Multipart) -> ApiResult<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(UploadedFile {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::missing_field("file"))
}

/// POST /uploads - Attach a file to an entity
#[utoipa::path(
    post,
    path = "/uploads",
    tag = "Uploads",
    params(UploadParams),
    request_body(content_type = "multipart/form-data", description = "Form with a `file` part"),
    responses(
        (status = 200, description = "File stored", body = AttachmentResponse),
        (status = 400, description = "Bad entity type or missing file", body = ApiError),
        (status = 404, description = "Owning entity not found", body = ApiError),
        (status = 413, description = "File too large", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    State(store): State<SharedStore>,
    State(settings): State<Arc<UploadSettings>>,
    params: Result<Query<UploadParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AttachmentResponse>> {
    let Query(params) = params.map_err(|e| ApiError::invalid_input(e.body_text()))?;
    let multipart = multipart.map_err(|e| ApiError::invalid_input(e.body_text()))?;
    let file = read_file_part(multipart).await?;
    let response = upload_service::store_upload(store.as_ref(), &settings, params, file).await?;
    Ok(Json(response))
}

/// GET /uploads/{entity_type}/{entity_id} - Attachments of one entity
#[utoipa::path(
    get,
    path = "/uploads/{entity_type}/{entity_id}",
    tag = "Uploads",
    params(
        ("entity_type" = String, Path, description = "equipment, facility, reagent, record, sop or template"),
        ("entity_id" = i64, Path, description = "Owning entity id"),
    ),
    responses(
        (status = 200, description = "Attachments, oldest first", body = Vec<AttachmentResponse>),
        (status = 400, description = "Bad entity type", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_attachments(
    State(store): State<SharedStore>,
    path: Result<Path<(String, RowId)>, PathRejection>,
) -> ApiResult<Json<Vec<AttachmentResponse>>> {
    let Path((entity_type, entity_id)) = path.map_err(|e| ApiError::invalid_input(e.body_text()))?;
    let attachments = upload_service::list_attachments(store.as_ref(), &entity_type, entity_id).await?;
    Ok(Json(attachments))
}

/// Create the uploads router. Request bodies above `max_upload_bytes`
/// (plus multipart framing) are refused before reaching the handler.
pub fn create_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(upload_file)
                .layer(DefaultBodyLimit::max(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))),
        )
        .route("/:entity_type/:entity_id", get(list_attachments))
}
