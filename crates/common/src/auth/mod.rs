//! Authentication and authorization utilities
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing (argon2)
//! - `AuthContext` extraction from a bearer header or the auth cookie
//! - The editor guard used by mutating routes

use crate::config::AuthConfig;
use crate::db::models::{User, ROLE_EDITOR};
use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID
    pub user_id: i32,

    /// Login email
    pub email: String,

    /// Effective roles at the time the token was issued
    pub roles: Vec<String>,
}

impl AuthContext {
    /// Check if the context holds a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_editor(&self) -> bool {
        self.has_role(ROLE_EDITOR)
    }

    /// Require the editor role for `action`, e.g. "update this movie"
    pub fn require_editor(&self, action: &str) -> Result<()> {
        if self.is_editor() {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!(
                    "You do not have permission to {}. {} required.",
                    action, ROLE_EDITOR
                ),
            })
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    pub email: String,

    /// Effective roles
    #[serde(default)]
    pub roles: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl TryFrom<JwtClaims> for AuthContext {
    type Error = AppError;

    fn try_from(claims: JwtClaims) -> Result<Self> {
        let user_id = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;
        Ok(AuthContext {
            user_id,
            email: claims.email,
            roles: claims.roles,
        })
    }
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
    cookie_name: String,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
            cookie_name: "auth_token".to_string(),
        }
    }

    /// Build from configuration; the secret is mandatory
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let secret = config
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "JWT secret is not set".to_string(),
            })?;

        let mut manager = Self::new(secret, config.jwt_expiration_secs);
        manager.cookie_name = config.cookie_name.clone();
        Ok(manager)
    }

    /// Name of the cookie page flows keep the token in
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }

    /// Generate a new JWT token for a user
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            roles: user.effective_roles(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }

    /// Token from `Authorization: Bearer ...`, falling back to the auth cookie
    fn token_from_parts(&self, parts: &Parts) -> Option<String> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer)
            .map(String::from);

        bearer.or_else(|| {
            CookieJar::from_headers(&parts.headers)
                .get(&self.cookie_name)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty())
        })
    }
}

/// Extract the token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

/// Hash a plain password into an argon2 PHC string
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Check a plain password against a stored PHC string
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let jwt = Arc::<JwtManager>::from_ref(state);

        let token = jwt
            .token_from_parts(parts)
            .ok_or_else(|| AppError::Unauthorized {
                message: "JWT Token not found".to_string(),
            })?;

        jwt.validate_token(&token)?.try_into()
    }
}

/// `Option<AuthContext>` for pages that render for anonymous visitors too;
/// an invalid or expired token counts as anonymous
impl<S> OptionalFromRequestParts<S> for AuthContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Option<Self>, Self::Rejection> {
        let jwt = Arc::<JwtManager>::from_ref(state);

        let context = jwt
            .token_from_parts(parts)
            .and_then(|token| jwt.validate_token(&token).ok())
            .and_then(|claims| AuthContext::try_from(claims).ok());

        Ok(context)
    }
}
