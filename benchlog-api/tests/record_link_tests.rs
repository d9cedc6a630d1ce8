//! HTTP tests for experiment records and their equipment/reagent links.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use support::seeded_app;

#[tokio::test]
async fn test_set_equipment_dedupes_and_counts_input() {
    let app = seeded_app(5, 0).await;
    let token = app.token().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/records/1/set-equipment",
            Some(&token),
            Some(json!({ "ids": [3, 3, 5] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "count": 3 }));

    let (status, body) = app
        .send(Method::GET, "/records/1/equipment-ids", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ids": [3, 5] }));
}

#[tokio::test]
async fn test_link_sets_are_replaced_not_merged() {
    let app = seeded_app(0, 4).await;
    let token = app.token().await;

    for ids in [json!([1, 2]), json!(["4", 3.0])] {
        let (status, _) = app
            .send(
                Method::POST,
                "/records/1/set-reagents",
                Some(&token),
                Some(json!({ "ids": ids })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = app
        .send(Method::GET, "/records/1/reagent-ids", Some(&token), None)
        .await;
    assert_eq!(body, json!({ "ids": [3, 4] }));
}

#[tokio::test]
async fn test_bad_link_payloads_leave_links_untouched() {
    let app = seeded_app(3, 0).await;
    let token = app.token().await;
    app.send(
        Method::POST,
        "/records/1/set-equipment",
        Some(&token),
        Some(json!({ "ids": [1] })),
    )
    .await;

    for payload in [
        json!({ "ids": "3" }),
        json!({ "ids": [1, "two"] }),
        json!({ "ids": [true] }),
        json!([1, 2]),
    ] {
        let (status, body) = app
            .send(Method::POST, "/records/1/set-equipment", Some(&token), Some(payload.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {} accepted", payload);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    let (status, body) = app
        .send(
            Method::POST,
            "/records/1/set-equipment",
            Some(&token),
            Some(json!({ "ids": [2, 99] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ENTITY_NOT_FOUND");

    let (_, body) = app
        .send(Method::GET, "/records/1/equipment-ids", Some(&token), None)
        .await;
    assert_eq!(body, json!({ "ids": [1] }));
}

#[tokio::test]
async fn test_missing_or_null_ids_clear_links() {
    let app = seeded_app(2, 0).await;
    let token = app.token().await;
    for payload in [json!({ "ids": [1, 2] }), json!({})] {
        app.send(Method::POST, "/records/1/set-equipment", Some(&token), Some(payload))
            .await;
    }
    let (_, body) = app
        .send(Method::GET, "/records/1/equipment-ids", Some(&token), None)
        .await;
    assert_eq!(body, json!({ "ids": [] }));

    let (status, body) = app
        .send(
            Method::POST,
            "/records/1/set-equipment",
            Some(&token),
            Some(json!({ "ids": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_record_crud_and_link_cascade() {
    let app = seeded_app(2, 2).await;
    let token = app.token().await;

    let (status, created) = app
        .send(
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({ "title": "PCR run", "purpose": "genotyping", "tags": "pcr" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_i64().expect("id");
    assert_eq!(created["title"], "PCR run");

    // Newest first
    let (_, listed) = app.send(Method::GET, "/records", Some(&token), None).await;
    assert_eq!(listed[0]["id"], id);

    // PUT replaces every field; omitted ones fall back to defaults
    let (status, replaced) = app
        .send(
            Method::PUT,
            &format!("/records/{}", id),
            Some(&token),
            Some(json!({ "title": "PCR run 2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["title"], "PCR run 2");
    assert_eq!(replaced["purpose"], "");

    app.send(
        Method::POST,
        &format!("/records/{}/set-reagents", id),
        Some(&token),
        Some(json!({ "ids": [1, 2] })),
    )
    .await;

    let (status, body) = app
        .send(Method::DELETE, &format!("/records/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (status, _) = app
        .send(Method::GET, &format!("/records/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app
        .send(Method::GET, &format!("/records/{}/reagent-ids", id), Some(&token), None)
        .await;
    assert_eq!(body, json!({ "ids": [] }));
}

#[tokio::test]
async fn test_record_validation_errors() {
    let app = seeded_app(0, 0).await;
    let token = app.token().await;

    let (status, body) = app
        .send(Method::POST, "/records", Some(&token), Some(json!({ "title": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");

    let (status, body) = app
        .send(Method::GET, "/records/not-a-number", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, _) = app
        .send(
            Method::PUT,
            "/records/404",
            Some(&token),
            Some(json!({ "title": "ghost" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
