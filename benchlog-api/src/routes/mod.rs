//! REST API Routes Module
//!
//! Route handlers organized by entity type:
//! - Catalog CRUD (facilities, equipment, reagents, SOPs, templates)
//! - Experiment records and their equipment/reagent link sets
//! - Cross-entity search
//! - File uploads
//! - Registration and login
//! - Health check endpoints
//! - CORS support for browser-based clients

pub mod auth;
pub mod catalog;
pub mod generic;
pub mod health;
pub mod records;
pub mod search;
pub mod uploads;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::auth::AuthConfig;
use crate::config::{is_production_environment, ApiConfig};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{auth_middleware, AuthMiddlewareState};
use crate::openapi::ApiDoc;
use crate::services::UploadSettings;
use crate::state::{AppState, SharedStore};

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Document the Swagger UI loads. Kept apart from `/openapi.json`, which
/// `SwaggerUi` would otherwise register a second time.
#[cfg(feature = "swagger-ui")]
pub const SWAGGER_DOC_URL: &str = "/api-docs/openapi.json";

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Validate API configuration for production use.
fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set BENCHLOG_CORS_ORIGINS.",
        ));
    }
    Ok(())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Any origin when none are configured; otherwise only those
/// [`ApiConfig::is_origin_allowed`] accepts, wildcard subdomains included.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let base = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS open to every origin");
        return base.allow_origin(Any);
    }

    tracing::info!(origins = ?config.cors_origins, "CORS restricted");
    let allowed = config.clone();
    let base = base.allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        origin
            .to_str()
            .map(|origin| allowed.is_origin_allowed(origin))
            .unwrap_or(false)
    }));
    base.allow_credentials(config.cors_allow_credentials)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Routes that require an authenticated user.
fn protected_routes(api_config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .nest("/records", records::create_router())
        .nest("/facilities", catalog::facilities::create_router())
        .nest("/equipment", catalog::equipment::create_router())
        .nest("/reagents", catalog::reagents::create_router())
        .nest("/sops", catalog::sops::create_router())
        .nest("/templates", catalog::templates::create_router())
        .nest("/search", search::create_router())
        .nest("/uploads", uploads::create_router(api_config.max_upload_bytes))
}

/// Create the complete API router.
///
/// - Records, catalog, search and uploads require a bearer token
/// - `/auth/*`, `/health/*` and the OpenAPI documents are public
/// - Swagger UI at /swagger-ui (when the swagger-ui feature is enabled)
///
/// In production, refuses insecure auth or CORS configuration.
pub fn create_api_router(
    store: SharedStore,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
) -> ApiResult<Router> {
    auth_config.validate_for_production()?;
    if is_production_environment() {
        validate_api_config_for_production(api_config)?;
    }

    let state = AppState::new(
        store.clone(),
        auth_config,
        UploadSettings::from_config(api_config),
    );
    let auth_state = AuthMiddlewareState::new(state.auth_config.clone(), store);

    let protected = protected_routes(api_config)
        .layer(from_fn_with_state(auth_state, auth_middleware));

    #[allow(unused_mut)]
    let mut router = Router::new()
        .merge(protected)
        .nest("/auth", auth::create_router())
        .nest("/health", health::create_router())
        .route("/openapi.json", get(openapi_json));

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(SwaggerUi::new("/swagger-ui").url(SWAGGER_DOC_URL, ApiDoc::openapi()));
    }

    Ok(router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(api_config)))
}
