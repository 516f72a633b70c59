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
    entities::review,
    errors::{ErrorResponse, ServiceError},
    handlers::common::{created_response, success_response, Json, Query},
    services::reviews::{
        CreateReviewRequest, ReviewFilter, ReviewWithRelations, UpdateReviewRequest,
    },
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewMessage {
    pub message: String,
    pub review: review::Model,
}

#[utoipa::path(
    get,
    path = "/reviews",
    params(ReviewFilter),
    responses(
        (status = 200, description = "Reviews with author and property", body = [ReviewWithRelations]),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(filter): Query<ReviewFilter>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.reviews.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/reviews/{id}",
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review found", body = ReviewWithRelations),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.reviews.get(&id).await?))
}

#[utoipa::path(
    post,
    path = "/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewMessage),
        (status = 400, description = "Rating out of range or unknown user/property", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Response, ServiceError> {
    let review = state.services.reviews.create(payload).await?;
    Ok(created_response(ReviewMessage {
        message: "Review created successfully!".to_string(),
        review,
    }))
}

#[utoipa::path(
    put,
    path = "/reviews/{id}",
    request_body = UpdateReviewRequest,
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review updated", body = ReviewMessage),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Response, ServiceError> {
    let review = state.services.reviews.update(&id, payload).await?;
    Ok(success_response(ReviewMessage {
        message: format!("Review with ID {} successfully updated", id),
        review,
    }))
}

#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted", body = ReviewMessage),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let review = state.services.reviews.delete(&id).await?;
    Ok(success_response(ReviewMessage {
        message: format!("Review with ID {} successfully deleted", id),
        review,
    }))
}

pub fn review_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_reviews))
        .route("/:id", get(get_review));
    let protected = Router::new()
        .route("/", post(create_review))
        .route("/:id", put(update_review).delete(delete_review))
        .with_auth();
    public.merge(protected)
}
