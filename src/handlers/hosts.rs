use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, put},
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::AuthRouterExt,
    entities::host,
    errors::{ErrorResponse, ServiceError},
    handlers::common::{created_response, success_response, Json, Query},
    services::hosts::{CreateHostRequest, HostFilter, HostWithListings, UpdateHostRequest},
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HostMessage {
    pub message: String,
    pub host: host::Model,
}

#[utoipa::path(
    get,
    path = "/hosts",
    params(HostFilter),
    responses(
        (status = 200, description = "Hosts with their listings", body = [HostWithListings])
    ),
    tag = "hosts"
)]
pub async fn list_hosts(
    State(state): State<AppState>,
    Query(filter): Query<HostFilter>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.hosts.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/hosts/{id}",
    params(("id" = String, Path, description = "Host ID")),
    responses(
        (status = 200, description = "Host found", body = HostWithListings),
        (status = 404, description = "Host not found", body = ErrorResponse)
    ),
    tag = "hosts"
)]
pub async fn get_host(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.hosts.get(&id).await?))
}

#[utoipa::path(
    post,
    path = "/hosts",
    request_body = CreateHostRequest,
    responses(
        (status = 201, description = "Host created", body = HostMessage),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Duplicate username, email or phone number", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "hosts"
)]
pub async fn create_host(
    State(state): State<AppState>,
    Json(payload): Json<CreateHostRequest>,
) -> Result<Response, ServiceError> {
    let host = state.services.hosts.create(payload).await?;
    Ok(created_response(HostMessage {
        message: "Host created successfully!".to_string(),
        host,
    }))
}

#[utoipa::path(
    put,
    path = "/hosts/{id}",
    request_body = UpdateHostRequest,
    params(("id" = String, Path, description = "Host ID")),
    responses(
        (status = 200, description = "Host updated", body = HostMessage),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Host not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "hosts"
)]
pub async fn update_host(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateHostRequest>,
) -> Result<Response, ServiceError> {
    let host = state.services.hosts.update(&id, payload).await?;
    Ok(success_response(HostMessage {
        message: format!("Host with ID {} successfully updated", id),
        host,
    }))
}

#[utoipa::path(
    delete,
    path = "/hosts/{id}",
    params(("id" = String, Path, description = "Host ID")),
    responses(
        (status = 200, description = "Host and their listings deleted", body = HostMessage),
        (status = 404, description = "Host not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "hosts"
)]
pub async fn delete_host(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let host = state.services.hosts.delete(&id).await?;
    Ok(success_response(HostMessage {
        message: format!("Host with ID {} successfully deleted", id),
        host,
    }))
}

pub fn host_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_hosts))
        .route("/:id", get(get_host));
    let protected = Router::new()
        .route("/", axum::routing::post(create_host))
        .route("/:id", put(update_host).delete(delete_host))
        .with_auth();
    public.merge(protected)
}
