//! Authentication Module
//!
//! Bearer-token authentication for the Benchlog API:
//! - JWT issuing and validation (HS256 by default) with an injectable clock
//! - PBKDF2-HMAC-SHA256 password hashing for stored user accounts
//! - The `AuthContext` injected into requests by the auth middleware

use crate::config::is_production_environment;
use crate::error::{ApiError, ApiResult};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use benchlog_core::{BenchError, ConfigError, RowId, User};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::pbkdf2;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

const FALLBACK_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;
const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;
const DEFAULT_LEEWAY_SECS: i64 = 60;

// ----------------------------------------------------------------------------
// Clocks
// ----------------------------------------------------------------------------

/// Source of "now" for token issuing and expiry checks.
pub trait JwtClock: Send + Sync {
    /// Seconds since the Unix epoch; may be negative on a misconfigured host.
    fn now_epoch_secs(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
pub mod test_clocks {
    use super::FixedClock;

    /// New Year 2024, UTC.
    pub fn valid() -> FixedClock {
        FixedClock(1_704_067_200)
    }

    /// New Year 2030, UTC. Far past any test token's expiry.
    pub fn future() -> FixedClock {
        FixedClock(1_893_456_000)
    }
}

// ----------------------------------------------------------------------------
// Signing secret
// ----------------------------------------------------------------------------

/// HMAC key for session tokens. `Debug` prints only its length.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    pub fn new(secret: String) -> Result<Self, BenchError> {
        if secret.is_empty() {
            return Err(BenchError::Config(ConfigError::MissingRequired {
                field: "jwt_secret".to_string(),
            }));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Secret from an env value; blank or unset falls back to the dev key.
    fn or_fallback(value: Option<String>) -> Self {
        let value = value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_SECRET.to_string());
        Self(SecretString::new(value.into()))
    }

    /// Raw key bytes for signing and verification.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.expose().len()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.expose() == FALLBACK_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("JwtSecret")
            .field(&format_args!("<{} chars hidden>", self.len()))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Token and account settings for the API.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: JwtSecret,
    pub jwt_algorithm: Algorithm,
    /// Lifetime of an issued token.
    pub jwt_expiration_secs: i64,
    /// Grace period past `exp` before a token is refused.
    pub jwt_clock_skew_secs: i64,
    /// Skip token checks and act as the `dev@local` user.
    pub dev_bypass_auth: bool,
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("dev_bypass_auth", &self.dev_bypass_auth)
            .finish_non_exhaustive()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: JwtSecret::or_fallback(None),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: DEFAULT_TOKEN_TTL_SECS,
            jwt_clock_skew_secs: DEFAULT_LEEWAY_SECS,
            dev_bypass_auth: false,
            clock: Arc::new(SystemClock),
        }
    }
}

fn env_number(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

impl AuthConfig {
    /// Reads `BENCHLOG_JWT_SECRET`, `BENCHLOG_JWT_EXPIRATION_SECS`,
    /// `BENCHLOG_JWT_CLOCK_SKEW_SECS` and `BENCHLOG_DEV_BYPASS_AUTH`
    /// (`true` or `1`). Anything unset keeps its default.
    pub fn from_env() -> Self {
        Self {
            jwt_secret: JwtSecret::or_fallback(std::env::var("BENCHLOG_JWT_SECRET").ok()),
            jwt_expiration_secs: env_number("BENCHLOG_JWT_EXPIRATION_SECS", DEFAULT_TOKEN_TTL_SECS),
            jwt_clock_skew_secs: env_number("BENCHLOG_JWT_CLOCK_SKEW_SECS", DEFAULT_LEEWAY_SECS),
            dev_bypass_auth: matches!(
                std::env::var("BENCHLOG_DEV_BYPASS_AUTH").as_deref(),
                Ok("true") | Ok("1")
            ),
            ..Self::default()
        }
    }

    /// Weak settings are fatal when `BENCHLOG_ENVIRONMENT` is production and
    /// logged as warnings otherwise.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let mut problems = Vec::new();
        if self.dev_bypass_auth {
            problems.push("BENCHLOG_DEV_BYPASS_AUTH is enabled".to_string());
        }
        if self.jwt_secret.is_insecure_default() {
            problems.push("BENCHLOG_JWT_SECRET is not set".to_string());
        } else if self.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            problems.push(format!(
                "BENCHLOG_JWT_SECRET has {} chars, need at least {}",
                self.jwt_secret.len(),
                MIN_PRODUCTION_SECRET_LEN
            ));
        }

        if problems.is_empty() {
            return Ok(());
        }
        if is_production_environment() {
            return Err(ApiError::invalid_input(format!(
                "Refusing to start in production: {}",
                problems.join("; ")
            )));
        }
        for problem in &problems {
            tracing::warn!(problem = %problem, "Auth settings unsafe outside development");
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tokens
// ----------------------------------------------------------------------------

/// Session token payload; `sub` holds the account email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(email: String, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let iat = clock.now_epoch_secs();
        Self {
            sub: email,
            iat,
            exp: iat + expiration_secs,
        }
    }

    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        clock.now_epoch_secs() > self.exp
    }
}

/// The authenticated user, injected into request extensions by the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: RowId,
    pub email: String,
    pub name: String,
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Issue a signed token for `email`.
pub fn generate_jwt_token(config: &AuthConfig, email: &str) -> ApiResult<String> {
    let claims = Claims::new(email.to_string(), config.jwt_expiration_secs, &*config.clock);
    let key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    encode(&Header::new(config.jwt_algorithm), &claims, &key)
        .map_err(|e| ApiError::internal_error(format!("Could not sign token: {}", e)))
}

/// Verify the signature, then check `exp` against the configured clock.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    use jsonwebtoken::errors::ErrorKind;

    let key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let mut rules = Validation::new(config.jwt_algorithm);
    rules.validate_exp = false;
    rules.validate_nbf = false;
    rules.set_required_spec_claims(&["exp"]);

    let claims = decode::<Claims>(token, &key, &rules)
        .map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::InvalidSignature => "bad signature".to_string(),
                ErrorKind::InvalidToken => "malformed token".to_string(),
                other => format!("{:?}", other),
            };
            ApiError::invalid_token(format!("Rejected token: {}", reason))
        })?
        .claims;

    let now = config.clock.now_epoch_secs();
    if now < 0 {
        tracing::error!(now, "Clock reads before 1970; cannot check token expiry");
        return Err(ApiError::internal_error("Server time configuration error"));
    }
    if now - config.jwt_clock_skew_secs > claims.exp {
        return Err(ApiError::token_expired());
    }

    Ok(claims)
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> ApiResult<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::invalid_token("Authorization header must use Bearer scheme"))
}

// ============================================================================
// PASSWORD HASHING
// ============================================================================

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const HASH_SCHEME: &str = "pbkdf2-sha256";

/// Hash a password as `pbkdf2-sha256$<iterations>$<salt>$<hash>`
/// (salt and hash base64, unpadded).
pub fn hash_password(password: &str) -> String {
    use rand::Rng;

    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    hash_with_salt(password, &salt, PBKDF2_ITERATIONS)
}

fn hash_with_salt(password: &str, salt: &[u8], iterations: u32) -> String {
    let iterations = NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN);
    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        password.as_bytes(),
        &mut hash,
    );
    format!(
        "{}${}${}${}",
        HASH_SCHEME,
        iterations,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Check a password against a stored hash in constant time.
///
/// Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(hash)) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}
