//! Catalog routes: facilities, equipment, reagents, SOPs and templates.
//!
//! Every catalog entity exposes the same CRUD surface. `PUT` and `PATCH`
//! both apply only the fields present in the body.

/// Generate a route module for one catalog entity: documented handlers
/// over [`super::generic`] plus its `create_router`.
macro_rules! catalog_routes {
    (
        $module:ident,
        entity = $entity:ident,
        draft = $draft:ident,
        tag = $tag:tt,
        collection = $collection:tt,
        item = $item:tt $(,)?
    ) => {
        pub mod $module {
            use axum::{extract::State, routing::get, Json, Router};
            use benchlog_core::{Entity, $draft, $entity};

            use crate::error::{ApiError, ApiResult};
            use crate::extractors::{JsonBody, PathId};
            use crate::routes::generic;
            use crate::state::{AppState, SharedStore};
            use crate::types::OkResponse;

            #[utoipa::path(
                get,
                path = $collection,
                tag = $tag,
                responses(
                    (status = 200, description = "All rows in listing order", body = Vec<$entity>),
                    (status = 401, description = "Unauthorized", body = ApiError),
                ),
                security(("bearer_auth" = []))
            )]
            pub async fn list_rows(State(store): State<SharedStore>) -> ApiResult<Json<Vec<$entity>>> {
                generic::list_handler::<$entity>(store).await
            }

            #[utoipa::path(
                post,
                path = $collection,
                tag = $tag,
                request_body = $draft,
                responses(
                    (status = 200, description = "Created row", body = $entity),
                    (status = 400, description = "Invalid input", body = ApiError),
                    (status = 401, description = "Unauthorized", body = ApiError),
                ),
                security(("bearer_auth" = []))
            )]
            pub async fn create_row(
                State(store): State<SharedStore>,
                JsonBody(draft): JsonBody<$draft>,
            ) -> ApiResult<Json<$entity>> {
                generic::create_handler::<$entity>(store, draft).await
            }

            #[utoipa::path(
                get,
                path = $item,
                tag = $tag,
                params(("id" = i64, Path, description = "Row id")),
                responses(
                    (status = 200, description = "The row", body = $entity),
                    (status = 404, description = "Not found", body = ApiError),
                ),
                security(("bearer_auth" = []))
            )]
            pub async fn get_row(
                State(store): State<SharedStore>,
                PathId(id): PathId,
            ) -> ApiResult<Json<$entity>> {
                generic::get_handler::<$entity>(store, id).await
            }

            #[utoipa::path(
                put,
                path = $item,
                tag = $tag,
                params(("id" = i64, Path, description = "Row id")),
                request_body(content = $draft, description = "Any subset of the fields"),
                responses(
                    (status = 200, description = "Updated row", body = $entity),
                    (status = 400, description = "Invalid input", body = ApiError),
                    (status = 404, description = "Not found", body = ApiError),
                ),
                security(("bearer_auth" = []))
            )]
            pub async fn put_row(
                State(store): State<SharedStore>,
                PathId(id): PathId,
                JsonBody(patch): JsonBody<<$entity as Entity>::Patch>,
            ) -> ApiResult<Json<$entity>> {
                generic::update_handler::<$entity>(store, id, patch).await
            }

            #[utoipa::path(
                patch,
                path = $item,
                tag = $tag,
                params(("id" = i64, Path, description = "Row id")),
                request_body(content = $draft, description = "Any subset of the fields"),
                responses(
                    (status = 200, description = "Updated row", body = $entity),
                    (status = 400, description = "Invalid input", body = ApiError),
                    (status = 404, description = "Not found", body = ApiError),
                ),
                security(("bearer_auth" = []))
            )]
            pub async fn patch_row(
                State(store): State<SharedStore>,
                PathId(id): PathId,
                JsonBody(patch): JsonBody<<$entity as Entity>::Patch>,
            ) -> ApiResult<Json<$entity>> {
                generic::update_handler::<$entity>(store, id, patch).await
            }

            #[utoipa::path(
                delete,
                path = $item,
                tag = $tag,
                params(("id" = i64, Path, description = "Row id")),
                responses(
                    (status = 200, description = "Deleted", body = OkResponse),
                    (status = 404, description = "Not found", body = ApiError),
                ),
                security(("bearer_auth" = []))
            )]
            pub async fn delete_row(
                State(store): State<SharedStore>,
                PathId(id): PathId,
            ) -> ApiResult<Json<OkResponse>> {
                generic::delete_handler::<$entity>(store, id).await
            }

            pub fn create_router() -> Router<AppState> {
                Router::new()
                    .route("/", get(list_rows).post(create_row))
                    .route(
                        "/:id",
                        get(get_row).put(put_row).patch(patch_row).delete(delete_row),
                    )
            }
        }
    };
}

catalog_routes!(
    facilities,
    entity = Facility,
    draft = FacilityDraft,
    tag = "Facilities",
    collection = "/facilities",
    item = "/facilities/{id}",
);

catalog_routes!(
    equipment,
    entity = Equipment,
    draft = EquipmentDraft,
    tag = "Equipment",
    collection = "/equipment",
    item = "/equipment/{id}",
);

catalog_routes!(
    reagents,
    entity = Reagent,
    draft = ReagentDraft,
    tag = "Reagents",
    collection = "/reagents",
    item = "/reagents/{id}",
);

catalog_routes!(
    sops,
    entity = Sop,
    draft = SopDraft,
    tag = "SOPs",
    collection = "/sops",
    item = "/sops/{id}",
);

catalog_routes!(
    templates,
    entity = ExperimentTemplate,
    draft = ExperimentTemplateDraft,
    tag = "Templates",
    collection = "/templates",
    item = "/templates/{id}",
);
