//! Upload Service
//!
//! Files attached to lab entities. Bytes go to the upload directory under a
//! generated name; the metadata row keeps the original filename.

use std::path::{Path, PathBuf};

use benchlog_core::{BenchError, EntityKind, NewAttachment, RowId};
use benchlog_storage::LabStore;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::{AttachmentResponse, UploadParams};

/// Where uploads are written and how large they may be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

impl UploadSettings {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            dir: config.upload_dir.clone(),
            max_bytes: config.max_upload_bytes,
        }
    }
}

/// A file received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// `.ext` of the uploaded filename, or empty when it has none we can keep.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Name the file is stored under: `{entity_type}_{entity_id}_{uuid}{ext}`.
pub fn stored_name_for(kind: EntityKind, entity_id: RowId, filename: &str) -> String {
    format!(
        "{}_{}_{}{}",
        kind.as_str(),
        entity_id,
        Uuid::now_v7().simple(),
        extension_of(filename)
    )
}

/// Write an uploaded file and record it against its owning entity.
pub async fn store_upload(
    store: &dyn LabStore,
    settings: &UploadSettings,
    params: UploadParams,
    file: UploadedFile,
) -> ApiResult<AttachmentResponse> {
    let kind = EntityKind::parse_attachable(&params.entity_type)?;
    if !store.exists(kind, params.entity_id).await? {
        return Err(BenchError::not_found(kind, params.entity_id).into());
    }
    if file.bytes.len() > settings.max_bytes {
        return Err(ApiError::payload_too_large(format!(
            "File exceeds the {} byte upload limit",
            settings.max_bytes
        )));
    }

    tokio::fs::create_dir_all(&settings.dir).await.map_err(|e| {
        tracing::error!(dir = %settings.dir.display(), "Cannot create upload directory: {}", e);
        ApiError::internal_error("Failed to store upload")
    })?;

    let stored_path = settings
        .dir
        .join(stored_name_for(kind, params.entity_id, &file.filename));
    tokio::fs::write(&stored_path, &file.bytes).await.map_err(|e| {
        tracing::error!(path = %stored_path.display(), "Cannot write upload: {}", e);
        ApiError::internal_error("Failed to store upload")
    })?;

    let created = store
        .attachment_create(NewAttachment {
            entity_type: kind,
            entity_id: params.entity_id,
            filename: file.filename,
            content_type: file.content_type,
            stored_path: stored_path.to_string_lossy().into_owned(),
            note: params.note,
        })
        .await;

    let attachment = match created {
        Ok(attachment) => attachment,
        Err(err) => {
            if let Err(e) = tokio::fs::remove_file(&stored_path).await {
                tracing::warn!(path = %stored_path.display(), "Orphaned upload left on disk: {}", e);
            }
            return Err(err.into());
        }
    };

    tracing::info!(
        attachment_id = attachment.id,
        entity_type = %kind,
        entity_id = attachment.entity_id,
        bytes = file.bytes.len(),
        "Upload stored"
    );
    Ok(AttachmentResponse::from(&attachment))
}

/// Attachments of one entity, oldest first.
pub async fn list_attachments(
    store: &dyn LabStore,
    entity_type: &str,
    entity_id: RowId,
) -> ApiResult<Vec<AttachmentResponse>> {
    let kind = EntityKind::parse_attachable(entity_type)?;
    let attachments = store.attachments_for(kind, entity_id).await?;
    Ok(attachments.iter().map(AttachmentResponse::from).collect())
}
