use axum::{extract::State, response::Response, routing::post, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    auth::AuthUser,
    errors::{ErrorResponse, ServiceError},
    handlers::common::{success_response, Json},
    validation::has_text,
    AppState,
};

pub const LOGIN_FAILED_MESSAGE: &str = "Invalid login credentials or authentication failed!";

/// Login request payload
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Token response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

pub fn auth_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Login handler
///
/// Users are looked up first, then hosts. Passwords are compared as stored.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Username or password missing", body = ErrorResponse),
        (status = 401, description = "Bad credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ServiceError> {
    if !has_text(&payload.username) || !has_text(&payload.password) {
        return Err(ServiceError::bad_request("Username and password are required!"));
    }
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    // Users and hosts are unique separately, so a password mismatch on the
    // user row still falls through to hosts.
    let account = match state.services.users.find_by_username(&username).await? {
        Some(user) if user.password == password => Some(AuthUser::from(&user)),
        _ => state
            .services
            .hosts
            .find_by_username(&username)
            .await?
            .filter(|host| host.password == password)
            .map(|host| AuthUser::from(&host)),
    };

    let Some(account) = account else {
        warn!(username = %username, "login rejected");
        return Err(ServiceError::Unauthorized(LOGIN_FAILED_MESSAGE.to_string()));
    };

    let token = state.auth.generate_token(&account)?;
    info!(account_id = %account.id, role = %account.role, "login succeeded");

    Ok(success_response(LoginResponse {
        message: "Successfully logged in!".to_string(),
        token,
    }))
}
