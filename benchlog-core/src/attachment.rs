//! File attachments and user accounts.

use serde::{Deserialize, Serialize};

use crate::{EntityKind, RowId, Timestamp};

/// A stored file belonging to some attachable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: RowId,
    pub entity_type: EntityKind,
    pub entity_id: RowId,
    /// Name of the file as uploaded.
    pub filename: String,
    pub content_type: String,
    /// Path on disk under the upload directory.
    pub stored_path: String,
    pub note: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for [`Attachment`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttachment {
    pub entity_type: EntityKind,
    pub entity_id: RowId,
    pub filename: String,
    pub content_type: String,
    pub stored_path: String,
    pub note: String,
}

impl Attachment {
    pub fn from_new(id: RowId, new: NewAttachment, now: Timestamp) -> Self {
        Self {
            id,
            entity_type: new.entity_type,
            entity_id: new.entity_id,
            filename: new.filename,
            content_type: new.content_type,
            stored_path: new.stored_path,
            note: new.note,
            created_at: now,
            updated_at: now,
        }
    }

    /// File name component of `stored_path`.
    pub fn stored_name(&self) -> &str {
        self.stored_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.stored_path)
    }
}

/// A registered user. The password hash never leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RowId,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for [`User`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

impl User {
    pub fn from_new(id: RowId, new: NewUser, now: Timestamp) -> Self {
        Self {
            id,
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}
