use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::booking,
    errors::{ErrorResponse, ServiceError},
    handlers::common::{created_response, success_response, Json, Query},
    services::bookings::{
        BookingFilter, BookingWithRelations, CreateBookingRequest, UpdateBookingRequest,
    },
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingMessage {
    pub message: String,
    pub booking: booking::Model,
}

#[utoipa::path(
    get,
    path = "/bookings",
    params(BookingFilter),
    responses(
        (status = 200, description = "Bookings with guest and property", body = [BookingWithRelations]),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.bookings.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking found", body = BookingWithRelations),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.bookings.get(&id).await?))
}

/// Dates accept RFC 3339 timestamps or plain `YYYY-MM-DD`; status defaults
/// to `pending`.
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingMessage),
        (status = 400, description = "Invalid dates, counts, status or unknown user/property", body = ErrorResponse),
        (status = 401, description = "Missing token", body = ErrorResponse),
        (status = 403, description = "Invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    axum::Extension(caller): axum::Extension<AuthUser>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Response, ServiceError> {
    let booking = state.services.bookings.create(payload).await?;
    tracing::debug!(booking_id = %booking.id, caller = %caller.id, "booking placed");
    Ok(created_response(BookingMessage {
        message: "Booking created successfully!".to_string(),
        booking,
    }))
}

#[utoipa::path(
    put,
    path = "/bookings/{id}",
    request_body = UpdateBookingRequest,
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking updated", body = BookingMessage),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<Response, ServiceError> {
    let booking = state.services.bookings.update(&id, payload).await?;
    Ok(success_response(BookingMessage {
        message: format!("Booking with ID {} successfully updated", id),
        booking,
    }))
}

#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking deleted", body = BookingMessage),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let booking = state.services.bookings.delete(&id).await?;
    Ok(success_response(BookingMessage {
        message: format!("Booking with ID {} successfully deleted", id),
        booking,
    }))
}

pub fn booking_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_bookings))
        .route("/:id", get(get_booking));
    let protected = Router::new()
        .route("/", post(create_booking))
        .route("/:id", put(update_booking).delete(delete_booking))
        .with_auth();
    public.merge(protected)
}
