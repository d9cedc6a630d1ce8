//! Discriminator enums shared by every layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// Entity type discriminator for errors, storage dispatch and attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Facility,
    Equipment,
    Reagent,
    Sop,
    Template,
    Record,
    Attachment,
    User,
}

impl EntityKind {
    /// Kinds that may own attachments.
    pub const ATTACHABLE: [EntityKind; 6] = [
        EntityKind::Equipment,
        EntityKind::Facility,
        EntityKind::Reagent,
        EntityKind::Record,
        EntityKind::Sop,
        EntityKind::Template,
    ];

    /// Lowercase name used in URLs, stored attachment rows and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Facility => "facility",
            EntityKind::Equipment => "equipment",
            EntityKind::Reagent => "reagent",
            EntityKind::Sop => "sop",
            EntityKind::Template => "template",
            EntityKind::Record => "record",
            EntityKind::Attachment => "attachment",
            EntityKind::User => "user",
        }
    }

    /// Human-readable name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Facility => "Facility",
            EntityKind::Equipment => "Equipment",
            EntityKind::Reagent => "Reagent",
            EntityKind::Sop => "SOP",
            EntityKind::Template => "Template",
            EntityKind::Record => "Record",
            EntityKind::Attachment => "Attachment",
            EntityKind::User => "User",
        }
    }

    /// Whether attachments may be uploaded against this kind.
    pub fn is_attachable(&self) -> bool {
        Self::ATTACHABLE.contains(self)
    }

    /// Parse an attachment owner type, rejecting kinds that cannot own files.
    pub fn parse_attachable(s: &str) -> Result<Self, ValidationError> {
        match s.parse::<EntityKind>() {
            Ok(kind) if kind.is_attachable() => Ok(kind),
            _ => Err(ValidationError::InvalidValue {
                field: "entity_type".to_string(),
                reason: format!(
                    "must be one of: {}",
                    Self::ATTACHABLE
                        .iter()
                        .map(|k| k.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "facility" => EntityKind::Facility,
            "equipment" => EntityKind::Equipment,
            "reagent" => EntityKind::Reagent,
            "sop" => EntityKind::Sop,
            "template" => EntityKind::Template,
            "record" => EntityKind::Record,
            "attachment" => EntityKind::Attachment,
            "user" => EntityKind::User,
            other => {
                return Err(ValidationError::InvalidValue {
                    field: "entity_type".to_string(),
                    reason: format!("unknown entity type '{}'", other),
                })
            }
        })
    }
}

/// Natural listing order of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Highest id first.
    NewestFirst,
    /// Ascending by the entity's label column (name or title), ties by id.
    ByLabel,
}
