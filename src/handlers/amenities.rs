use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::AuthRouterExt,
    entities::amenity,
    errors::{ErrorResponse, ServiceError},
    handlers::common::{created_response, success_response, Json, Query},
    services::amenities::{AmenityFilter, AmenityRequest},
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AmenityMessage {
    pub message: String,
    pub amenity: amenity::Model,
}

#[utoipa::path(
    get,
    path = "/amenities",
    params(AmenityFilter),
    responses((status = 200, description = "Amenities ordered by name", body = [amenity::Model])),
    tag = "amenities"
)]
pub async fn list_amenities(
    State(state): State<AppState>,
    Query(filter): Query<AmenityFilter>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.amenities.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/amenities/{id}",
    params(("id" = String, Path, description = "Amenity ID")),
    responses(
        (status = 200, description = "Amenity found", body = amenity::Model),
        (status = 404, description = "Amenity not found", body = ErrorResponse)
    ),
    tag = "amenities"
)]
pub async fn get_amenity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.amenities.get(&id).await?))
}

#[utoipa::path(
    post,
    path = "/amenities",
    request_body = AmenityRequest,
    responses(
        (status = 201, description = "Amenity created", body = AmenityMessage),
        (status = 400, description = "Name missing", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "amenities"
)]
pub async fn create_amenity(
    State(state): State<AppState>,
    Json(payload): Json<AmenityRequest>,
) -> Result<Response, ServiceError> {
    let amenity = state.services.amenities.create(payload).await?;
    Ok(created_response(AmenityMessage {
        message: "Amenity created successfully!".to_string(),
        amenity,
    }))
}

#[utoipa::path(
    put,
    path = "/amenities/{id}",
    request_body = AmenityRequest,
    params(("id" = String, Path, description = "Amenity ID")),
    responses(
        (status = 200, description = "Amenity renamed", body = AmenityMessage),
        (status = 404, description = "Amenity not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "amenities"
)]
pub async fn update_amenity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AmenityRequest>,
) -> Result<Response, ServiceError> {
    let amenity = state.services.amenities.update(&id, payload).await?;
    Ok(success_response(AmenityMessage {
        message: format!("Amenity with ID {} successfully updated", id),
        amenity,
    }))
}

#[utoipa::path(
    delete,
    path = "/amenities/{id}",
    params(("id" = String, Path, description = "Amenity ID")),
    responses(
        (status = 200, description = "Amenity deleted", body = AmenityMessage),
        (status = 404, description = "Amenity not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "amenities"
)]
pub async fn delete_amenity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let amenity = state.services.amenities.delete(&id).await?;
    Ok(success_response(AmenityMessage {
        message: format!("Amenity with ID {} successfully deleted", id),
        amenity,
    }))
}

pub fn amenity_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_amenities))
        .route("/:id", get(get_amenity));
    let protected = Router::new()
        .route("/", post(create_amenity))
        .route("/:id", put(update_amenity).delete(delete_amenity))
        .with_auth();
    public.merge(protected)
}
