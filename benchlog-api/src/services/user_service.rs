//! User Service
//!
//! Registration, login and the development bypass user.

use benchlog_core::{NewUser, User};
use benchlog_storage::LabStore;

use crate::auth::{generate_jwt_token, hash_password, verify_password, AuthConfig};
use crate::error::{ApiError, ApiResult};
use crate::types::{LoginRequest, RegisterRequest, TokenResponse};

/// Account every request acts as when the dev bypass is on.
pub const DEV_USER_EMAIL: &str = "dev@local";
const DEV_USER_NAME: &str = "DEV";
const DEV_USER_PASSWORD: &str = "dev";

/// Create an account and return a token for it.
pub async fn register(
    store: &dyn LabStore,
    config: &AuthConfig,
    req: RegisterRequest,
) -> ApiResult<TokenResponse> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err(ApiError::missing_field("email"));
    }
    if req.password.is_empty() {
        return Err(ApiError::missing_field("password"));
    }
    if store.user_by_email(email).await?.is_some() {
        return Err(ApiError::entity_already_exists("Email already registered"));
    }

    let user = store
        .user_create(NewUser {
            email: email.to_string(),
            name: req.name,
            password_hash: hash_password(&req.password),
        })
        .await?;
    tracing::info!(user_id = user.id, "User registered");

    Ok(TokenResponse::bearer(generate_jwt_token(config, &user.email)?))
}

/// Check credentials and return a fresh token.
pub async fn login(
    store: &dyn LabStore,
    config: &AuthConfig,
    req: LoginRequest,
) -> ApiResult<TokenResponse> {
    let user = store.user_by_email(req.email.trim()).await?;
    match user {
        Some(user) if verify_password(&req.password, &user.password_hash) => {
            Ok(TokenResponse::bearer(generate_jwt_token(config, &user.email)?))
        }
        _ => Err(ApiError::unauthorized("Invalid credentials")),
    }
}

/// The `dev@local` account, created on first use.
pub async fn ensure_dev_user(store: &dyn LabStore) -> ApiResult<User> {
    if let Some(user) = store.user_by_email(DEV_USER_EMAIL).await? {
        return Ok(user);
    }

    let created = store
        .user_create(NewUser {
            email: DEV_USER_EMAIL.to_string(),
            name: DEV_USER_NAME.to_string(),
            password_hash: hash_password(DEV_USER_PASSWORD),
        })
        .await;

    match created {
        Ok(user) => {
            tracing::warn!("Created {} for the development auth bypass", DEV_USER_EMAIL);
            Ok(user)
        }
        // Another request created it first
        Err(_) => store
            .user_by_email(DEV_USER_EMAIL)
            .await?
            .ok_or_else(|| ApiError::internal_error("Development user could not be created")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{test_clocks, validate_jwt_token, JwtSecret};
    use crate::error::ErrorCode;
    use benchlog_storage::InMemoryStore;
    use std::sync::Arc;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("user-service-test-secret-with-32-chars".to_string())
                .expect("secret"),
            clock: Arc::new(test_clocks::valid()),
            ..AuthConfig::default()
        }
    }

    fn register_req(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: "Ada".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = InMemoryStore::new();
        let config = config();

        let token = register(&store, &config, register_req("ada@lab.org", "s3cret"))
            .await
            .expect("register");
        assert_eq!(token.token_type, "bearer");
        let claims = validate_jwt_token(&config, &token.access_token).expect("valid token");
        assert_eq!(claims.sub, "ada@lab.org");

        let token = login(
            &store,
            &config,
            LoginRequest {
                email: "ada@lab.org".to_string(),
                password: "s3cret".to_string(),
            },
        )
        .await
        .expect("login");
        assert!(!token.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let store = InMemoryStore::new();
        let config = config();
        register(&store, &config, register_req("ada@lab.org", "a"))
            .await
            .expect("first");
        let err = register(&store, &config, register_req("ada@lab.org", "b"))
            .await
            .expect_err("second");
        assert_eq!(err.code, ErrorCode::EntityAlreadyExists);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let store = InMemoryStore::new();
        let config = config();
        register(&store, &config, register_req("ada@lab.org", "right"))
            .await
            .expect("register");

        for (email, password) in [("ada@lab.org", "wrong"), ("nobody@lab.org", "right")] {
            let err = login(
                &store,
                &config,
                LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await
            .expect_err("bad credentials");
            assert_eq!(err.code, ErrorCode::Unauthorized);
        }
    }

    #[tokio::test]
    async fn test_register_requires_email_and_password() {
        let store = InMemoryStore::new();
        let config = config();
        let err = register(&store, &config, register_req(" ", "x"))
            .await
            .expect_err("no email");
        assert_eq!(err.code, ErrorCode::MissingField);
        let err = register(&store, &config, register_req("a@b.c", ""))
            .await
            .expect_err("no password");
        assert_eq!(err.code, ErrorCode::MissingField);
    }

    #[tokio::test]
    async fn test_dev_user_is_created_once() {
        let store = InMemoryStore::new();
        let first = ensure_dev_user(&store).await.expect("create");
        let second = ensure_dev_user(&store).await.expect("reuse");
        assert_eq!(first.id, second.id);
        assert_eq!(first.name, "DEV");
        assert!(verify_password("dev", &first.password_hash));
    }
}
