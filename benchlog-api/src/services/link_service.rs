//! Link Service
//!
//! Equipment and reagent link sets of experiment records.

use benchlog_core::{LinkKind, LinkSet, RowId};
use benchlog_storage::LabStore;
use serde_json::Value as JsonValue;

use crate::error::ApiResult;

/// Linked ids of one record, ascending.
///
/// Unknown records simply have no links.
pub async fn linked_ids(store: &dyn LabStore, record_id: RowId, kind: LinkKind) -> ApiResult<Vec<RowId>> {
    Ok(store.linked_ids(record_id, kind).await?)
}

/// Replace the link set of a record with the ids in `payload`.
///
/// `payload` is the whole request body, `{"ids": [...]}`. It is fully
/// validated before storage is touched. Returns the number of ids
/// submitted, duplicates included.
pub async fn set_linked_ids(
    store: &dyn LabStore,
    record_id: RowId,
    kind: LinkKind,
    payload: &JsonValue,
) -> ApiResult<usize> {
    let links = LinkSet::from_payload(payload)?;
    store.replace_links(record_id, kind, &links).await?;

    tracing::debug!(
        record_id,
        %kind,
        requested = links.requested(),
        stored = links.ids().len(),
        "Link set replaced"
    );
    Ok(links.requested())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use benchlog_storage::InMemoryStore;
    use serde_json::json;

    async fn store() -> InMemoryStore {
        benchlog_test_utils::fixtures::seeded_store(5, 2)
            .await
            .expect("seed store")
    }

    #[tokio::test]
    async fn test_count_includes_duplicates() {
        let store = store().await;
        let count = set_linked_ids(&store, 1, LinkKind::Equipment, &json!({"ids": [3, 3, 5]}))
            .await
            .expect("set links");
        assert_eq!(count, 3);

        let ids = linked_ids(&store, 1, LinkKind::Equipment).await.expect("get links");
        assert_eq!(ids, vec![3, 5]);
    }

    #[tokio::test]
    async fn test_not_a_list_writes_nothing() {
        let store = store().await;
        set_linked_ids(&store, 1, LinkKind::Reagent, &json!({"ids": [1]}))
            .await
            .expect("seed links");

        let err = set_linked_ids(&store, 1, LinkKind::Reagent, &json!({"ids": "not-a-list"}))
            .await
            .expect_err("must reject");
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let ids = linked_ids(&store, 1, LinkKind::Reagent).await.expect("get links");
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_bad_element_writes_nothing() {
        let store = store().await;
        let err = set_linked_ids(&store, 1, LinkKind::Equipment, &json!({"ids": [1, "x"]}))
            .await
            .expect_err("must reject");
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(store.link_count(LinkKind::Equipment).expect("count"), 0);
    }

    #[tokio::test]
    async fn test_unknown_target_is_not_found() {
        let store = store().await;
        let err = set_linked_ids(&store, 1, LinkKind::Reagent, &json!({"ids": [1, 99]}))
            .await
            .expect_err("must reject");
        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert_eq!(store.link_count(LinkKind::Reagent).expect("count"), 0);
    }

    #[tokio::test]
    async fn test_unknown_record_is_not_found() {
        let store = store().await;
        let err = set_linked_ids(&store, 42, LinkKind::Equipment, &json!({"ids": [1]}))
            .await
            .expect_err("must reject");
        assert_eq!(err.code, ErrorCode::EntityNotFound);
    }

    #[tokio::test]
    async fn test_body_must_be_object() {
        let store = store().await;
        let err = set_linked_ids(&store, 1, LinkKind::Equipment, &json!([1, 2]))
            .await
            .expect_err("must reject");
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_null_clears() {
        let store = store().await;
        set_linked_ids(&store, 1, LinkKind::Equipment, &json!({"ids": [1, 2]}))
            .await
            .expect("seed links");
        let count = set_linked_ids(&store, 1, LinkKind::Equipment, &json!({"ids": null}))
            .await
            .expect("clear links");
        assert_eq!(count, 0);
        assert!(linked_ids(&store, 1, LinkKind::Equipment)
            .await
            .expect("get links")
            .is_empty());
    }
}
