//! Search REST API Route

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use benchlog_core::{SearchResults, SearchScope};

use crate::{
    error::{ApiError, ApiResult},
    services::search_service,
    state::{AppState, SharedStore},
    types::SearchParams,
};

/// GET /search - Substring search across catalog entities and records
///
/// Only the keys selected by `type` are present in the response.
#[utoipa::path(
    get,
    path = "/search",
    tag = "Search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matches grouped by entity type", body = SearchResults),
        (status = 400, description = "Unknown search type", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn search(
    State(store): State<SharedStore>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResults>> {
    let scope: SearchScope = params.scope.as_deref().unwrap_or("all").parse()?;
    let results = search_service::search(store.as_ref(), &params.q, scope).await?;
    Ok(Json(results))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/", get(search))
}
