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
    entities::property,
    errors::{ErrorResponse, ServiceError},
    handlers::common::{created_response, success_response, Json, Query},
    services::properties::{
        CreatePropertyRequest, PropertyFilter, PropertyWithRelations, UpdatePropertyRequest,
    },
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyMessage {
    pub message: String,
    pub property: PropertyWithRelations,
}

/// Delete only has the removed row, its relations are gone with it.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedPropertyMessage {
    pub message: String,
    pub property: property::Model,
}

#[utoipa::path(
    get,
    path = "/properties",
    params(PropertyFilter),
    responses(
        (status = 200, description = "Properties with amenities, reviews and host", body = [PropertyWithRelations]),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    tag = "properties"
)]
pub async fn list_properties(
    State(state): State<AppState>,
    Query(filter): Query<PropertyFilter>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.properties.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/properties/{id}",
    params(("id" = String, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Property found", body = PropertyWithRelations),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "properties"
)]
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.properties.get(&id).await?))
}

#[utoipa::path(
    post,
    path = "/properties",
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Property created", body = PropertyMessage),
        (status = 400, description = "Invalid request or unknown host/amenity", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "properties"
)]
pub async fn create_property(
    State(state): State<AppState>,
    Json(payload): Json<CreatePropertyRequest>,
) -> Result<Response, ServiceError> {
    let property = state.services.properties.create(payload).await?;
    Ok(created_response(PropertyMessage {
        message: "Property created successfully!".to_string(),
        property,
    }))
}

#[utoipa::path(
    put,
    path = "/properties/{id}",
    request_body = UpdatePropertyRequest,
    params(("id" = String, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Property updated", body = PropertyMessage),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "properties"
)]
pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePropertyRequest>,
) -> Result<Response, ServiceError> {
    let property = state.services.properties.update(&id, payload).await?;
    Ok(success_response(PropertyMessage {
        message: format!("Property with ID {} successfully updated", id),
        property,
    }))
}

#[utoipa::path(
    delete,
    path = "/properties/{id}",
    params(("id" = String, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Property deleted", body = DeletedPropertyMessage),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "properties"
)]
pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let property = state.services.properties.delete(&id).await?;
    Ok(success_response(DeletedPropertyMessage {
        message: format!("Property with ID {} successfully deleted", id),
        property,
    }))
}

pub fn property_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_properties))
        .route("/:id", get(get_property));
    let protected = Router::new()
        .route("/", post(create_property))
        .route("/:id", put(update_property).delete(delete_property))
        .with_auth();
    public.merge(protected)
}
