use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::AuthRouterExt,
    entities::user,
    errors::{ErrorResponse, ServiceError},
    handlers::common::{created_response, success_response, Json, Query},
    services::users::{CreateUserRequest, UpdateUserRequest, UserFilter, UserWithRelations},
    AppState,
};

/// Mutation acknowledgement carrying the affected user
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMessage {
    pub message: String,
    pub user: user::Model,
}

#[utoipa::path(
    get,
    path = "/users",
    params(UserFilter),
    responses(
        (status = 200, description = "Users with their bookings and reviews", body = [UserWithRelations]),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Response, ServiceError> {
    let users = state.services.users.list(filter).await?;
    Ok(success_response(users))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserWithRelations),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let user = state.services.users.get(&id).await?;
    Ok(success_response(user))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserMessage),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username, email or phone number already taken", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Response, ServiceError> {
    let user = state.services.users.create(payload).await?;
    Ok(created_response(UserMessage {
        message: "User created successfully!".to_string(),
        user,
    }))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    request_body = UpdateUserRequest,
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User updated", body = UserMessage),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing token", body = ErrorResponse),
        (status = 403, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Response, ServiceError> {
    let user = state.services.users.update(&id, payload).await?;
    Ok(success_response(UserMessage {
        message: format!("User with ID {} successfully updated", id),
        user,
    }))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = UserMessage),
        (status = 401, description = "Missing token", body = ErrorResponse),
        (status = 403, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let user = state.services.users.delete(&id).await?;
    Ok(success_response(UserMessage {
        message: format!("User with ID {} successfully deleted", id),
        user,
    }))
}

/// Reads and sign-up are public; changing an existing account needs a token.
pub fn user_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user));
    let protected = Router::new()
        .route("/:id", axum::routing::put(update_user).delete(delete_user))
        .with_auth();
    public.merge(protected)
}
