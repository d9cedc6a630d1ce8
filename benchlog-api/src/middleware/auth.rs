//! Bearer-token guard for the protected routes.
//!
//! Every request under the guard needs `Authorization: Bearer <jwt>` whose
//! subject is a registered email; the resolved user lands in the request
//! extensions as an [`AuthContext`]. With `BENCHLOG_DEV_BYPASS_AUTH` on,
//! every request runs as `dev@local` instead.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{bearer_token, validate_jwt_token, AuthConfig, AuthContext};
use crate::error::{ApiError, ApiResult};
use crate::services::user_service;
use crate::state::SharedStore;

/// State handed to [`auth_middleware`] through `from_fn_with_state`.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,
    pub store: SharedStore,
}

impl AuthMiddlewareState {
    pub fn new(auth_config: Arc<AuthConfig>, store: SharedStore) -> Self {
        Self { auth_config, store }
    }
}

/// Wraps [`ApiError`] so the guard can reject with the usual error body.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl From<ApiError> for AuthMiddlewareError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

async fn authenticate(state: &AuthMiddlewareState, headers: &HeaderMap) -> ApiResult<AuthContext> {
    if state.auth_config.dev_bypass_auth {
        let user = user_service::ensure_dev_user(state.store.as_ref()).await?;
        return Ok(AuthContext::from(&user));
    }

    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    let claims = validate_jwt_token(&state.auth_config, bearer_token(value)?)?;

    match state.store.user_by_email(&claims.sub).await? {
        Some(user) => Ok(AuthContext::from(&user)),
        None => Err(ApiError::unauthorized("User not found")),
    }
}

pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let context = authenticate(&state, request.headers()).await?;
    tracing::trace!(user_id = context.user_id, "Request authenticated");
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// The caller's [`AuthContext`]. Only valid behind [`auth_middleware`];
/// anywhere else it answers 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthContext>() {
            Some(context) => Ok(AuthExtractor(context.clone())),
            None => Err(ApiError::internal_error("Route is missing the auth guard").into()),
        }
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt_token, hash_password, JwtSecret};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use benchlog_core::NewUser;
    use benchlog_storage::{InMemoryStore, UserStore};
    use tower::ServiceExt; // for `oneshot`

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("middleware-test-secret-0123456789abcdef".to_string())
                .expect("test secret should be valid"),
            ..AuthConfig::default()
        }
    }

    async fn store_with_user(email: &str) -> Result<SharedStore, String> {
        let store = InMemoryStore::new();
        store
            .user_create(NewUser {
                email: email.to_string(),
                name: "Tester".to_string(),
                password_hash: hash_password("pw"),
            })
            .await
            .map_err(|e| e.to_string())?;
        Ok(Arc::new(store))
    }

    async fn whoami(AuthExtractor(auth): AuthExtractor) -> String {
        format!("{}:{}", auth.user_id, auth.email)
    }

    fn test_app(config: AuthConfig, store: SharedStore) -> Router {
        let auth_state = AuthMiddlewareState::new(Arc::new(config), store);
        Router::new()
            .route("/protected", get(whoami))
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
    }

    async fn body_string(response: Response) -> Result<String, String> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
    }

    async fn send(app: Router, auth_header: Option<&str>) -> Result<Response, String> {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = auth_header {
            builder = builder.header("authorization", value);
        }
        let request = builder.body(Body::empty()).map_err(|e| e.to_string())?;
        app.oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))
    }

    #[tokio::test]
    async fn test_middleware_with_valid_jwt() -> Result<(), String> {
        let config = test_auth_config();
        let token = generate_jwt_token(&config, "ada@lab.org").map_err(|e| e.message)?;
        let app = test_app(config, store_with_user("ada@lab.org").await?);

        let response = send(app, Some(&format!("Bearer {}", token))).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await?, "1:ada@lab.org");
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_without_authentication() -> Result<(), String> {
        let app = test_app(test_auth_config(), store_with_user("ada@lab.org").await?);
        let response = send(app, None).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_invalid_jwt() -> Result<(), String> {
        let app = test_app(test_auth_config(), store_with_user("ada@lab.org").await?);
        let response = send(app, Some("Bearer not.a.jwt")).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_malformed_auth_header() -> Result<(), String> {
        let app = test_app(test_auth_config(), store_with_user("ada@lab.org").await?);
        let response = send(app, Some("Basic dXNlcjpwYXNz")).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_unknown_user() -> Result<(), String> {
        let config = test_auth_config();
        let token = generate_jwt_token(&config, "ghost@lab.org").map_err(|e| e.message)?;
        let app = test_app(config, store_with_user("ada@lab.org").await?);

        let response = send(app, Some(&format!("Bearer {}", token))).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await?.contains("User not found"));
        Ok(())
    }

    #[tokio::test]
    async fn test_dev_bypass_acts_as_dev_user() -> Result<(), String> {
        let config = AuthConfig {
            dev_bypass_auth: true,
            ..test_auth_config()
        };
        let store: SharedStore = Arc::new(InMemoryStore::new());
        let app = test_app(config, store.clone());

        let response = send(app.clone(), None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await?, "1:dev@local");

        // Second request reuses the same account
        let response = send(app, None).await?;
        assert_eq!(body_string(response).await?, "1:dev@local");
        Ok(())
    }

    #[tokio::test]
    async fn test_auth_extractor_without_middleware() -> Result<(), String> {
        let app = Router::new().route("/unprotected", get(whoami));

        let request = Request::builder()
            .uri("/unprotected")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }
}
