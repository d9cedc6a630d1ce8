//! API Request and Response Types
//!
//! Entity bodies are the `benchlog-core` row and draft types themselves; this
//! module holds the small envelopes around them.

use benchlog_core::{Attachment, RowId};
use serde::{Deserialize, Serialize};

// ============================================================================
// GENERIC ENVELOPES
// ============================================================================

/// `{"ok": true}`, returned by deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

// ============================================================================
// LINKS
// ============================================================================

/// Linked ids of one record, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LinkIdsResponse {
    pub ids: Vec<RowId>,
}

/// Result of replacing a link set.
///
/// `count` is the length of the submitted list, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetLinksResponse {
    pub ok: bool,
    pub count: usize,
}

// ============================================================================
// SEARCH
// ============================================================================

/// Query string of `GET /search`.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct SearchParams {
    /// Substring to look for. Empty matches nothing.
    #[serde(default)]
    pub q: String,

    /// One of `all`, `equipment`, `facilities`, `reagents`, `records`.
    #[serde(default, rename = "type")]
    pub scope: Option<String>,
}

// ============================================================================
// AUTH
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

// ============================================================================
// UPLOADS
// ============================================================================

/// Query string of `POST /uploads`.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct UploadParams {
    /// equipment, facility, reagent, record, sop or template
    pub entity_type: String,
    pub entity_id: RowId,
    #[serde(default)]
    pub note: String,
}

/// Public view of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttachmentResponse {
    pub id: RowId,
    pub filename: String,
    pub url: String,
    pub note: String,
}

impl From<&Attachment> for AttachmentResponse {
    fn from(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id,
            filename: attachment.filename.clone(),
            url: format!("/uploads/{}", attachment.stored_name()),
            note: attachment.note.clone(),
        }
    }
}
