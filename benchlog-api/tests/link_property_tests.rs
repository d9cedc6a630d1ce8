//! Property-Based Tests for Record Link Sets
//!
//! For any list of existing target ids, replacing a record's links and
//! reading them back yields the sorted, de-duplicated list, while the
//! reported count is the length of the submitted list. Any payload with a
//! non-integer element is refused and leaves the previous set in place.

use std::collections::BTreeSet;

use benchlog_api::services::link_service::{linked_ids, set_linked_ids};
use benchlog_test_utils::fixtures::seeded_store;
use benchlog_test_utils::generators::{arb_coercible_id, arb_id_list, arb_non_integer};
use benchlog_test_utils::LinkKind;
use proptest::prelude::*;
use serde_json::json;

const TARGETS: i64 = 8;

fn arb_kind() -> impl Strategy<Value = LinkKind> {
    prop_oneof![Just(LinkKind::Equipment), Just(LinkKind::Reagent)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_replace_then_read_is_sorted_set(kind in arb_kind(), ids in arb_id_list(TARGETS)) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        rt.block_on(async {
            let store = seeded_store(TARGETS as usize, TARGETS as usize).await.expect("seed store");

            let count = set_linked_ids(&store, 1, kind, &json!({ "ids": ids.clone() }))
                .await
                .expect("replace");
            prop_assert_eq!(count, ids.len());

            let expected: Vec<i64> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
            let stored = linked_ids(&store, 1, kind).await.expect("read");
            prop_assert_eq!(stored, expected);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_every_id_spelling_is_accepted(
        kind in arb_kind(),
        entries in prop::collection::vec(arb_coercible_id(TARGETS), 1..6),
    ) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        rt.block_on(async {
            let store = seeded_store(TARGETS as usize, TARGETS as usize).await.expect("seed store");
            let (ids, values): (Vec<i64>, Vec<_>) = entries.into_iter().unzip();

            set_linked_ids(&store, 1, kind, &json!({ "ids": values }))
                .await
                .expect("replace");

            let expected: Vec<i64> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
            prop_assert_eq!(linked_ids(&store, 1, kind).await.expect("read"), expected);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_bad_element_keeps_previous_links(
        kind in arb_kind(),
        good in arb_id_list(TARGETS),
        bad in arb_non_integer(),
        position in 0usize..4,
    ) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        rt.block_on(async {
            let store = seeded_store(TARGETS as usize, TARGETS as usize).await.expect("seed store");
            set_linked_ids(&store, 1, kind, &json!({ "ids": [1, 2] }))
                .await
                .expect("initial links");

            let mut payload: Vec<serde_json::Value> = good.iter().map(|id| json!(id)).collect();
            payload.insert(position.min(payload.len()), bad);
            let result = set_linked_ids(&store, 1, kind, &json!({ "ids": payload })).await;
            prop_assert!(result.is_err());

            prop_assert_eq!(linked_ids(&store, 1, kind).await.expect("read"), vec![1, 2]);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
