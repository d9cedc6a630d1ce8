//! Benchlog Test Utilities
//!
//! Shared test infrastructure for the Benchlog workspace:
//! - Proptest generators for drafts and link payloads
//! - Fixtures that seed an in-memory store
//! - Assertions for Benchlog error shapes

// Re-export the in-memory store from its source crate
pub use benchlog_storage::InMemoryStore;

// Re-export core types for convenience
pub use benchlog_core::{
    BenchError, BenchResult, EntityKind, Equipment, EquipmentDraft, ExperimentRecord,
    ExperimentRecordDraft, Facility, FacilityDraft, LinkKind, LinkSet, Reagent, ReagentDraft,
    RowId, StorageError, ValidationError,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Benchlog payloads.

    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value as JsonValue};

    /// Short label made of lowercase words.
    pub fn arb_label() -> impl Strategy<Value = String> {
        "[a-z]{1,8}( [a-z]{1,8}){0,2}"
    }

    /// Comma-separated tag string, possibly empty.
    pub fn arb_tags() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{2,6}", 0..4).prop_map(|tags| tags.join(","))
    }

    pub fn arb_equipment_draft() -> impl Strategy<Value = EquipmentDraft> {
        (arb_label(), arb_tags(), "[A-Z]-[0-9]{2,4}").prop_map(|(name, tags, asset_no)| {
            EquipmentDraft {
                name,
                tags,
                asset_no,
                ..Default::default()
            }
        })
    }

    pub fn arb_reagent_draft() -> impl Strategy<Value = ReagentDraft> {
        (arb_label(), arb_tags(), "[0-9]{3,6}", "L[0-9]{2,4}").prop_map(
            |(name, tags, cat_no, lot_no)| ReagentDraft {
                name,
                tags,
                cat_no,
                lot_no,
                ..Default::default()
            },
        )
    }

    pub fn arb_record_draft() -> impl Strategy<Value = ExperimentRecordDraft> {
        (arb_label(), arb_tags(), arb_label()).prop_map(|(title, tags, purpose)| {
            ExperimentRecordDraft {
                title,
                tags,
                purpose,
                ..Default::default()
            }
        })
    }

    /// A list of ids within `1..=max`, duplicates allowed.
    pub fn arb_id_list(max: RowId) -> impl Strategy<Value = Vec<RowId>> {
        prop::collection::vec(1..=max, 0..12)
    }

    /// One id element in any accepted JSON spelling.
    pub fn arb_coercible_id(max: RowId) -> impl Strategy<Value = (RowId, JsonValue)> {
        (1..=max, 0u8..3).prop_map(|(id, spelling)| {
            let value = match spelling {
                0 => json!(id),
                1 => json!(id as f64),
                _ => json!(id.to_string()),
            };
            (id, value)
        })
    }

    /// A JSON value that is never integer-coercible.
    pub fn arb_non_integer() -> impl Strategy<Value = JsonValue> {
        prop_oneof![
            Just(json!(true)),
            Just(json!(null)),
            Just(json!({"id": 1})),
            Just(json!([1])),
            "[a-z]{1,5}".prop_map(JsonValue::String),
            (1i32..1000).prop_map(|n| json!(n as f64 + 0.5)),
        ]
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built data for common testing scenarios.

    use super::*;
    use benchlog_storage::EntityStore;

    pub fn equipment_draft(name: &str) -> EquipmentDraft {
        EquipmentDraft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn reagent_draft(name: &str) -> ReagentDraft {
        ReagentDraft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn record_draft(title: &str) -> ExperimentRecordDraft {
        ExperimentRecordDraft {
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// A small lab: one facility, `equipment` equipment rows named `eq-N`,
    /// `reagents` reagent rows named `rg-N`, and one record titled "baseline".
    pub async fn seeded_store(equipment: usize, reagents: usize) -> BenchResult<InMemoryStore> {
        let store = InMemoryStore::new();
        EntityStore::<Facility>::create(
            &store,
            FacilityDraft {
                name: "Main lab".to_string(),
                location: "Building 2".to_string(),
                ..Default::default()
            },
        )
        .await?;
        for n in 1..=equipment {
            EntityStore::<Equipment>::create(&store, equipment_draft(&format!("eq-{}", n)))
                .await?;
        }
        for n in 1..=reagents {
            EntityStore::<Reagent>::create(&store, reagent_draft(&format!("rg-{}", n))).await?;
        }
        EntityStore::<ExperimentRecord>::create(&store, record_draft("baseline")).await?;
        Ok(store)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for Benchlog error shapes.

    use super::*;

    /// Assert that a result is a `NotFound` for the given kind.
    pub fn assert_not_found<T: std::fmt::Debug>(result: &BenchResult<T>, kind: EntityKind) {
        match result {
            Err(BenchError::Storage(StorageError::NotFound { entity_type, .. })) => {
                assert_eq!(*entity_type, kind, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound for {:?}, got: {:?}", kind, other),
        }
    }

    /// Assert that a result is a validation failure.
    pub fn assert_invalid<T: std::fmt::Debug>(result: &BenchResult<T>) {
        assert!(
            matches!(result, Err(BenchError::Validation(_))),
            "Expected validation error, got: {:?}",
            result
        );
    }
}
