/*!
 * # Authentication Module
 *
 * Issues and verifies the HS256 bearer tokens handed out by `POST /login`.
 *
 * - [`AuthService`] signs and decodes [`Claims`]
 * - [`auth_middleware`] guards mutating routes and stores the caller as an
 *   [`AuthUser`] request extension
 * - [`AuthRouterExt::with_auth`] attaches the middleware to a router
 *
 * The middleware looks the service up in the request extensions, so the
 * application router must carry an `Extension(Arc<AuthService>)` layer.
 */

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::entities::{host, user};
use crate::errors::ServiceError;

pub const MISSING_TOKEN_MESSAGE: &str = "Unauthorized: No token provided!";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token!";

/// Role carried by tokens issued to hosts.
pub const HOST_ROLE: &str = "host";

/// Claim structure for JWT tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // Subject (account id)
    pub id: String,       // Same as `sub`, kept for clients reading `id`
    pub username: String, // Login name
    pub role: String,     // user | admin | host
    pub iat: i64,         // Issued at time
    pub exp: i64,         // Expiration time
}

/// Authenticated caller extracted from the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

impl From<&user::Model> for AuthUser {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id.clone(),
            username: model.username.clone(),
            role: model.role.as_str().to_string(),
        }
    }
}

impl From<&host::Model> for AuthUser {
    fn from(model: &host::Model) -> Self {
        Self {
            id: model.id.clone(),
            username: model.username.clone(),
            role: HOST_ROLE.to_string(),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            token_expiration,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            Duration::from_secs(config.jwt_expiration_secs),
        )
    }
}

/// Signs and verifies bearer tokens
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("token_expiration", &self.config.token_expiration)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generate a signed token for an account
    pub fn generate_token(&self, account: &AuthUser) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: account.id.clone(),
            id: account.id.clone(),
            username: account.username.clone(),
            role: account.role.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{}", MISSING_TOKEN_MESSAGE)]
    MissingToken,

    #[error("{}", INVALID_TOKEN_MESSAGE)]
    InvalidToken,

    #[error("{}", INVALID_TOKEN_MESSAGE)]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Authentication service not available")]
    ServiceUnavailable,
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ServiceError::Unauthorized(err.to_string()),
            AuthError::InvalidToken | AuthError::TokenExpired => {
                ServiceError::Forbidden(err.to_string())
            }
            AuthError::TokenCreation(_) | AuthError::ServiceUnavailable => {
                ServiceError::InternalError(err.to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Authentication middleware that validates the bearer token
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => return AuthError::ServiceUnavailable.into_response(),
    };

    match authenticate(request.headers(), &auth_service) {
        Ok(user) => {
            debug!(user_id = %user.id, role = %user.role, "request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            warn!(error = %e, uri = %request.uri(), "rejected unauthenticated request");
            e.into_response()
        }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>` and decodes it.
fn authenticate(headers: &HeaderMap, auth_service: &AuthService) -> Result<AuthUser, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    auth_service.validate_token(token).map(AuthUser::from)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}
