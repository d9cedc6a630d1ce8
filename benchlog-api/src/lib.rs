//! Benchlog API - REST API Layer
//!
//! This crate exposes the Benchlog lab inventory over HTTP (Axum):
//! catalog CRUD, experiment records with their equipment/reagent link
//! sets, cross-entity search, file uploads and token authentication.
//!
//! Storage is pluggable behind `benchlog_storage::LabStore`. The PostgreSQL
//! backend lives in [`db`]; the in-memory backend comes from
//! `benchlog-storage` and is used by tests and `BENCHLOG_STORAGE=memory`.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use auth::{
    generate_jwt_token, hash_password, validate_jwt_token, verify_password, AuthConfig,
    AuthContext, Claims,
};
pub use config::{ApiConfig, StorageBackend};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AuthExtractor, AuthMiddlewareState};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::{AppState, SharedStore};
