use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StayHub API",
        version = "1.0.0",
        description = r#"
# StayHub Short-Term Rental API

CRUD endpoints for users, hosts, properties, amenities, reviews and bookings.

## Authentication

Reads and `POST /users` are public. Every other write needs the token returned by `POST /login`:

```
Authorization: Bearer <your-jwt-token>
```

A missing token is answered with 401, an invalid or expired one with 403.

## Error Handling

Every failure carries a `message`; `stack` is added outside production:

```json
{
  "message": "Property with id 123 was not found!"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login"),
        (name = "users", description = "Guest accounts"),
        (name = "hosts", description = "Property owners"),
        (name = "properties", description = "Listings"),
        (name = "amenities", description = "Amenity catalogue"),
        (name = "reviews", description = "Property reviews"),
        (name = "bookings", description = "Stays"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::auth::login,
        crate::handlers::health::health_check,

        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,

        crate::handlers::hosts::list_hosts,
        crate::handlers::hosts::get_host,
        crate::handlers::hosts::create_host,
        crate::handlers::hosts::update_host,
        crate::handlers::hosts::delete_host,

        crate::handlers::properties::list_properties,
        crate::handlers::properties::get_property,
        crate::handlers::properties::create_property,
        crate::handlers::properties::update_property,
        crate::handlers::properties::delete_property,

        crate::handlers::amenities::list_amenities,
        crate::handlers::amenities::get_amenity,
        crate::handlers::amenities::create_amenity,
        crate::handlers::amenities::update_amenity,
        crate::handlers::amenities::delete_amenity,

        crate::handlers::reviews::list_reviews,
        crate::handlers::reviews::get_review,
        crate::handlers::reviews::create_review,
        crate::handlers::reviews::update_review,
        crate::handlers::reviews::delete_review,

        crate::handlers::bookings::list_bookings,
        crate::handlers::bookings::get_booking,
        crate::handlers::bookings::create_booking,
        crate::handlers::bookings::update_booking,
        crate::handlers::bookings::delete_booking,
    ),
    components(
        schemas(
            // Entities
            crate::entities::user::Model,
            crate::entities::host::Model,
            crate::entities::property::Model,
            crate::entities::amenity::Model,
            crate::entities::review::Model,
            crate::entities::booking::Model,
            crate::entities::UserRole,
            crate::entities::BookingStatus,

            // Request bodies
            crate::handlers::auth::LoginRequest,
            crate::services::users::CreateUserRequest,
            crate::services::users::UpdateUserRequest,
            crate::services::hosts::CreateHostRequest,
            crate::services::hosts::UpdateHostRequest,
            crate::services::properties::CreatePropertyRequest,
            crate::services::properties::UpdatePropertyRequest,
            crate::services::amenities::AmenityRequest,
            crate::services::reviews::CreateReviewRequest,
            crate::services::reviews::UpdateReviewRequest,
            crate::services::bookings::CreateBookingRequest,
            crate::services::bookings::UpdateBookingRequest,

            // Responses
            crate::handlers::auth::LoginResponse,
            crate::handlers::health::HealthResponse,
            crate::handlers::users::UserMessage,
            crate::handlers::hosts::HostMessage,
            crate::handlers::properties::PropertyMessage,
            crate::handlers::properties::DeletedPropertyMessage,
            crate::handlers::amenities::AmenityMessage,
            crate::handlers::reviews::ReviewMessage,
            crate::handlers::bookings::BookingMessage,
            crate::services::users::UserWithRelations,
            crate::services::hosts::HostWithListings,
            crate::services::properties::PropertyWithRelations,
            crate::services::reviews::ReviewWithRelations,
            crate::services::bookings::BookingWithRelations,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("StayHub API"));
        assert!(json.contains("/bookings/{id}"));
        assert!(json.contains("bearer_auth"));
    }
}
