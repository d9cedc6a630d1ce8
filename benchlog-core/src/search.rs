//! Cross-entity substring search.
//!
//! Each searchable table is a [`SearchTarget`] with a fixed list of text
//! fields. A [`SearchScope`] selects which targets run. Matching is a plain
//! case-sensitive "contains" on any listed field; storage backends that
//! push the query down (SQL `LIKE`) use the same field list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{
    Equipment, ExperimentRecord, Facility, Reagent, ValidationError,
};

// ============================================================================
// TARGETS
// ============================================================================

/// One searchable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchTarget {
    Equipment,
    Facilities,
    Reagents,
    Records,
}

impl SearchTarget {
    pub const ALL: [SearchTarget; 4] = [
        SearchTarget::Equipment,
        SearchTarget::Facilities,
        SearchTarget::Reagents,
        SearchTarget::Records,
    ];

    /// Key under which this target's matches are returned.
    pub fn key(&self) -> &'static str {
        match self {
            SearchTarget::Equipment => "equipment",
            SearchTarget::Facilities => "facilities",
            SearchTarget::Reagents => "reagents",
            SearchTarget::Records => "records",
        }
    }

    /// Fields OR-combined by the substring match.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            SearchTarget::Equipment => Equipment::SEARCH_FIELDS,
            SearchTarget::Facilities => Facility::SEARCH_FIELDS,
            SearchTarget::Reagents => Reagent::SEARCH_FIELDS,
            SearchTarget::Records => ExperimentRecord::SEARCH_FIELDS,
        }
    }
}

/// Search scope as given by the `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    All,
    Equipment,
    Facilities,
    Reagents,
    Records,
}

impl SearchScope {
    /// Dispatch table: which targets a scope runs.
    pub fn targets(&self) -> &'static [SearchTarget] {
        match self {
            SearchScope::All => &SearchTarget::ALL,
            SearchScope::Equipment => &[SearchTarget::Equipment],
            SearchScope::Facilities => &[SearchTarget::Facilities],
            SearchScope::Reagents => &[SearchTarget::Reagents],
            SearchScope::Records => &[SearchTarget::Records],
        }
    }
}

impl FromStr for SearchScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(SearchScope::All),
            "equipment" => Ok(SearchScope::Equipment),
            "facilities" => Ok(SearchScope::Facilities),
            "reagents" => Ok(SearchScope::Reagents),
            "records" => Ok(SearchScope::Records),
            other => Err(ValidationError::InvalidValue {
                field: "type".to_string(),
                reason: format!(
                    "unknown search type '{}', expected one of: all, equipment, facilities, reagents, records",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchScope::All => f.write_str("all"),
            SearchScope::Equipment => f.write_str("equipment"),
            SearchScope::Facilities => f.write_str("facilities"),
            SearchScope::Reagents => f.write_str("reagents"),
            SearchScope::Records => f.write_str("records"),
        }
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// An entity that can be matched against a search query.
pub trait Searchable {
    const SEARCH_FIELDS: &'static [&'static str];

    fn field_value(&self, field: &str) -> Option<&str>;

    /// True when any search field contains `needle`.
    fn matches(&self, needle: &str) -> bool {
        Self::SEARCH_FIELDS
            .iter()
            .filter_map(|field| self.field_value(field))
            .any(|value| value.contains(needle))
    }
}

impl Searchable for Equipment {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "tags", "asset_no"];

    fn field_value(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "tags" => Some(&self.tags),
            "asset_no" => Some(&self.asset_no),
            _ => None,
        }
    }
}

impl Searchable for Facility {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "tags", "location"];

    fn field_value(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "tags" => Some(&self.tags),
            "location" => Some(&self.location),
            _ => None,
        }
    }
}

impl Searchable for Reagent {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "tags", "cat_no", "lot_no"];

    fn field_value(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "tags" => Some(&self.tags),
            "cat_no" => Some(&self.cat_no),
            "lot_no" => Some(&self.lot_no),
            _ => None,
        }
    }
}

impl Searchable for ExperimentRecord {
    const SEARCH_FIELDS: &'static [&'static str] = &["title", "tags", "purpose"];

    fn field_value(&self, field: &str) -> Option<&str> {
        match field {
            "title" => Some(&self.title),
            "tags" => Some(&self.tags),
            "purpose" => Some(&self.purpose),
            _ => None,
        }
    }
}

// ============================================================================
// QUERY + RESULTS
// ============================================================================

/// A normalized search query. `None` when the trimmed text is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        if needle.is_empty() {
            None
        } else {
            Some(Self {
                needle: needle.to_string(),
            })
        }
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// `%needle%` with `\`, `%` and `_` escaped for a SQL `LIKE ... ESCAPE '\'`.
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.needle.len() + 2);
        pattern.push('%');
        for c in self.needle.chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

/// Matches partitioned by target. Keys for targets outside the scope are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Vec<Equipment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilities: Option<Vec<Facility>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reagents: Option<Vec<Reagent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<ExperimentRecord>>,
}

impl SearchResults {
    /// Every key present with no matches; the answer to an empty query.
    pub fn empty_all() -> Self {
        Self {
            equipment: Some(Vec::new()),
            facilities: Some(Vec::new()),
            reagents: Some(Vec::new()),
            records: Some(Vec::new()),
        }
    }

    /// Total number of matches across all present keys.
    pub fn total(&self) -> usize {
        self.equipment.as_ref().map_or(0, Vec::len)
            + self.facilities.as_ref().map_or(0, Vec::len)
            + self.reagents.as_ref().map_or(0, Vec::len)
            + self.records.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, EquipmentDraft};
    use chrono::Utc;
    use proptest::prelude::*;

    fn equipment(name: &str, tags: &str, asset_no: &str, owner: &str) -> Equipment {
        Equipment::from_draft(
            1,
            EquipmentDraft {
                name: name.to_string(),
                tags: tags.to_string(),
                asset_no: asset_no.to_string(),
                owner: owner.to_string(),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("all".parse::<SearchScope>(), Ok(SearchScope::All));
        assert_eq!("".parse::<SearchScope>(), Ok(SearchScope::All));
        assert_eq!("reagents".parse::<SearchScope>(), Ok(SearchScope::Reagents));
        assert!("widgets".parse::<SearchScope>().is_err());
    }

    #[test]
    fn test_scope_dispatch_table() {
        assert_eq!(SearchScope::All.targets().len(), 4);
        assert_eq!(SearchScope::Records.targets(), &[SearchTarget::Records]);
        for target in SearchTarget::ALL {
            assert!(!target.fields().is_empty());
        }
    }

    #[test]
    fn test_blank_query_normalizes_to_none() {
        assert_eq!(SearchQuery::parse("   "), None);
        assert_eq!(SearchQuery::parse(""), None);
        assert_eq!(SearchQuery::parse("  pcr ").map(|q| q.needle().to_string()), Some("pcr".to_string()));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        let q = SearchQuery::parse("50%_a\\b").map(|q| q.like_pattern());
        assert_eq!(q.as_deref(), Some("%50\\%\\_a\\\\b%"));
    }

    #[test]
    fn test_equipment_matches_only_its_fields() {
        let eq = equipment("Centrifuge", "spin,bio", "A-100", "Dana");
        assert!(eq.matches("trifu"));
        assert!(eq.matches("bio"));
        assert!(eq.matches("A-1"));
        assert!(!eq.matches("Dana"));
        assert!(!eq.matches("centrifuge"));
    }

    #[test]
    fn test_empty_all_has_every_key() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(SearchResults::empty_all())?;
        for key in ["equipment", "facilities", "reagents", "records"] {
            assert_eq!(json[key], serde_json::json!([]));
        }
        Ok(())
    }

    #[test]
    fn test_absent_keys_are_omitted() -> Result<(), serde_json::Error> {
        let results = SearchResults {
            reagents: Some(Vec::new()),
            ..Default::default()
        };
        let json = serde_json::to_value(results)?;
        assert_eq!(json.as_object().map(|o| o.len()), Some(1));
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_equipment_match_is_field_containment(
            name in "[a-c]{0,6}",
            tags in "[a-c]{0,6}",
            asset in "[a-c]{0,6}",
            needle in "[a-c]{1,3}",
        ) {
            let eq = equipment(&name, &tags, &asset, "");
            let expected = name.contains(&needle) || tags.contains(&needle) || asset.contains(&needle);
            prop_assert_eq!(eq.matches(&needle), expected);
        }
    }
}
