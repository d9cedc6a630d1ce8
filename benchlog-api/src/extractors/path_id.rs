//! Path extractor for integer row ids.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use benchlog_core::RowId;

use crate::error::ApiError;

/// Extractor for the `:id` segment of a route.
///
/// ```rust,ignore
/// async fn get_record(PathId(id): PathId) -> ApiResult<Json<ExperimentRecord>> { ... }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub RowId);

/// Error returned when PathId extraction fails.
#[derive(Debug)]
pub struct PathIdError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for PathIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid id in path '{}': {}", self.path, self.message)
    }
}

impl std::error::Error for PathIdError {}

impl IntoResponse for PathIdError {
    fn into_response(self) -> Response {
        ApiError::invalid_input(self.to_string())
            .with_details(serde_json::json!({ "path": self.path }))
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = PathIdError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<RowId> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| PathIdError {
                path: parts.uri.path().to_string(),
                message: e.body_text(),
            })?;
        Ok(PathId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/items/:id",
            get(|PathId(id): PathId| async move { id.to_string() }),
        )
    }

    async fn get_status(uri: &str) -> Result<(StatusCode, String), String> {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = app().oneshot(request).await.map_err(|e| e.to_string())?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
    }

    #[tokio::test]
    async fn test_integer_id_is_extracted() -> Result<(), String> {
        let (status, body) = get_status("/items/42").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "42");
        Ok(())
    }

    #[tokio::test]
    async fn test_non_integer_id_is_bad_request() -> Result<(), String> {
        let (status, body) = get_status("/items/abc").await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("INVALID_INPUT"));
        assert!(body.contains("/items/abc"));
        Ok(())
    }
}
