//! Record-to-catalog links.
//!
//! A record owns two link sets: the equipment it used and the reagents it
//! consumed. Link sets are always replaced whole; there is no add/remove.
//! Parsing of the replacement payload lives here so every storage backend
//! sees an already-validated, deduplicated id set.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;

use crate::{EntityKind, RowId, ValidationError};

/// Which link set of a record is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Equipment,
    Reagent,
}

impl LinkKind {
    pub const ALL: [LinkKind; 2] = [LinkKind::Equipment, LinkKind::Reagent];

    /// Entity kind on the far side of the link.
    pub fn target(&self) -> EntityKind {
        match self {
            LinkKind::Equipment => EntityKind::Equipment,
            LinkKind::Reagent => EntityKind::Reagent,
        }
    }

    /// Kinds whose links point at `kind`, if any.
    pub fn targeting(kind: EntityKind) -> Option<LinkKind> {
        Self::ALL.into_iter().find(|link| link.target() == kind)
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Equipment => f.write_str("equipment"),
            LinkKind::Reagent => f.write_str("reagent"),
        }
    }
}

/// A validated replacement link set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkSet {
    ids: BTreeSet<RowId>,
    requested: usize,
}

impl LinkSet {
    /// Build from already-typed ids.
    pub fn from_ids(ids: impl IntoIterator<Item = RowId>) -> Self {
        let mut requested = 0;
        let ids = ids
            .into_iter()
            .inspect(|_| requested += 1)
            .collect::<BTreeSet<_>>();
        Self { ids, requested }
    }

    /// Parse a `{"ids": [...]}` request body.
    ///
    /// A missing or `null` `ids` field means "no links". Every element must
    /// be integer-coercible: a JSON integer, a float with no fractional part,
    /// or a string holding an integer. Nothing is accepted partially.
    pub fn from_payload(payload: &JsonValue) -> Result<Self, ValidationError> {
        let object = payload.as_object().ok_or_else(|| invalid("body must be a JSON object"))?;

        let elements = match object.get("ids") {
            None | Some(JsonValue::Null) => return Ok(Self::default()),
            Some(JsonValue::Array(elements)) => elements,
            Some(_) => return Err(invalid("ids must be a list")),
        };

        let ids = elements
            .iter()
            .enumerate()
            .map(|(index, value)| {
                coerce_id(value).ok_or_else(|| {
                    invalid(format!("ids[{}] is not an integer: {}", index, value))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_ids(ids))
    }

    /// Distinct ids, ascending.
    pub fn ids(&self) -> &BTreeSet<RowId> {
        &self.ids
    }

    /// Number of ids in the request, duplicates included.
    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: "ids".to_string(),
        reason: reason.into(),
    }
}

fn coerce_id(value: &JsonValue) -> Option<RowId> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            (f.fract() == 0.0 && in_range).then_some(f as i64)
        }),
        JsonValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicates_collapse_but_count_raw_length() -> Result<(), ValidationError> {
        let set = LinkSet::from_payload(&json!({"ids": [3, 3, 5]}))?;
        assert_eq!(set.requested(), 3);
        assert_eq!(set.ids().iter().copied().collect::<Vec<_>>(), vec![3, 5]);
        Ok(())
    }

    #[test]
    fn test_missing_or_null_ids_is_empty() -> Result<(), ValidationError> {
        assert!(LinkSet::from_payload(&json!({}))?.is_empty());
        let null = LinkSet::from_payload(&json!({"ids": null}))?;
        assert!(null.is_empty());
        assert_eq!(null.requested(), 0);
        Ok(())
    }

    #[test]
    fn test_non_list_ids_rejected() {
        for bad in [json!({"ids": "not-a-list"}), json!({"ids": 4}), json!({"ids": {"a": 1}})] {
            let err = LinkSet::from_payload(&bad);
            assert!(
                matches!(err, Err(ValidationError::InvalidValue { ref reason, .. }) if reason == "ids must be a list"),
                "expected rejection for {}",
                bad
            );
        }
    }

    #[test]
    fn test_empty_looking_ids_are_not_treated_as_empty_list() {
        for falsy in [json!({"ids": ""}), json!({"ids": 0}), json!({"ids": false}), json!({"ids": {}})] {
            assert!(LinkSet::from_payload(&falsy).is_err(), "{} should be rejected", falsy);
        }
    }

    #[test]
    fn test_body_must_be_object() {
        assert!(LinkSet::from_payload(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_integer_coercion() -> Result<(), ValidationError> {
        let set = LinkSet::from_payload(&json!({"ids": [1, 2.0, "3", " 4 "]}))?;
        assert_eq!(set.ids().iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn test_non_integer_elements_rejected() {
        for bad in [json!(1.5), json!("x"), json!(true), json!(null), json!([1]), json!({})] {
            let payload = json!({"ids": [1, bad]});
            assert!(LinkSet::from_payload(&payload).is_err(), "accepted {}", payload);
        }
    }

    #[test]
    fn test_link_kind_targets() {
        assert_eq!(LinkKind::Equipment.target(), EntityKind::Equipment);
        assert_eq!(LinkKind::targeting(EntityKind::Reagent), Some(LinkKind::Reagent));
        assert_eq!(LinkKind::targeting(EntityKind::Sop), None);
    }
}
