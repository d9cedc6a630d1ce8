//! Search Service
//!
//! Runs one substring search per target selected by the scope and gathers
//! the matches under each target's key.

use benchlog_core::{
    Equipment, ExperimentRecord, Facility, Reagent, SearchQuery, SearchResults, SearchScope,
    SearchTarget,
};
use benchlog_storage::{LabStore, SearchStore};

use crate::error::ApiResult;

/// Search `raw` across the targets of `scope`.
///
/// A blank query returns every key with no matches and never reaches storage.
pub async fn search(store: &dyn LabStore, raw: &str, scope: SearchScope) -> ApiResult<SearchResults> {
    let Some(query) = SearchQuery::parse(raw) else {
        return Ok(SearchResults::empty_all());
    };

    let mut results = SearchResults::default();
    for target in scope.targets() {
        match target {
            SearchTarget::Equipment => {
                results.equipment = Some(SearchStore::<Equipment>::search(store, &query).await?);
            }
            SearchTarget::Facilities => {
                results.facilities = Some(SearchStore::<Facility>::search(store, &query).await?);
            }
            SearchTarget::Reagents => {
                results.reagents = Some(SearchStore::<Reagent>::search(store, &query).await?);
            }
            SearchTarget::Records => {
                results.records =
                    Some(SearchStore::<ExperimentRecord>::search(store, &query).await?);
            }
        }
    }

    tracing::debug!(
        q = query.needle(),
        %scope,
        matches = results.total(),
        "Search completed"
    );
    Ok(results)
}
