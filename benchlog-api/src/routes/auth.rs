//! Account REST API Routes
//!
//! Registration and login. These routes are public.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use crate::{
    auth::AuthConfig,
    error::{ApiError, ApiResult},
    extractors::JsonBody,
    services::user_service,
    state::{AppState, SharedStore},
    types::{LoginRequest, RegisterRequest, TokenResponse},
};

/// POST /auth/register - Create an account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = TokenResponse),
        (status = 400, description = "Missing email or password", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError),
    )
)]
pub async fn register(
    State(store): State<SharedStore>,
    State(auth_config): State<Arc<AuthConfig>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = user_service::register(store.as_ref(), &auth_config, req).await?;
    Ok(Json(token))
}

/// POST /auth/login - Exchange credentials for a token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ApiError),
    )
)]
pub async fn login(
    State(store): State<SharedStore>,
    State(auth_config): State<Arc<AuthConfig>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = user_service::login(store.as_ref(), &auth_config, req).await?;
    Ok(Json(token))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
