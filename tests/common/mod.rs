#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal_macros::dec;
use serde_json::Value;
use stayhub_api::{
    auth::AuthUser,
    config::AppConfig,
    db::{self, DbConfig},
    entities::{BookingStatus, UserRole},
    services::seed::{
        AmenityFixture, BookingFixture, Fixtures, HostFixture, PropertyFixture, ReviewFixture,
        SeedOrchestrator, UserFixture,
    },
    AppState,
};
use tower::ServiceExt;

pub const USER_ID: &str = "u1";
pub const USER_NAME: &str = "guest";
pub const USER_PASSWORD: &str = "Password123!";
pub const HOST_ID: &str = "h1";
pub const HOST_NAME: &str = "hoster";
pub const HOST_PASSWORD: &str = "HostPass123!";
pub const AMENITY_ID: &str = "a1";
pub const PROPERTY_ID: &str = "p1";
pub const REVIEW_ID: &str = "r1";
pub const BOOKING_ID: &str = "b1";
pub const JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness for spinning up an application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
}

impl TestApp {
    /// Fresh schema seeded with one user, host, amenity, property, review and booking.
    pub async fn new() -> Self {
        let app = Self::empty().await;
        SeedOrchestrator::new(app.state.db.as_ref())
            .run(&base_fixtures(), false)
            .await
            .expect("failed to seed base fixtures");
        app
    }

    /// Fresh schema with no rows.
    pub async fn empty() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let pool = db::establish_connection_with_config(&DbConfig::in_memory())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let token = state
            .auth
            .generate_token(&AuthUser {
                id: USER_ID.to_string(),
                username: USER_NAME.to_string(),
                role: "user".to_string(),
            })
            .expect("encode access token");
        let router = stayhub_api::build_router(state.clone());

        Self {
            router,
            state,
            token,
        }
    }

    /// Bearer token for the seeded user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Sends a raw body, bypassing JSON serialisation.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: &'static str,
    ) -> axum::response::Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.token()))
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

/// Splits a response into its status and JSON body.
pub async fn response_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    };
    (status, value)
}

pub fn base_fixtures() -> Fixtures {
    Fixtures {
        users: vec![UserFixture {
            id: USER_ID.to_string(),
            username: USER_NAME.to_string(),
            password: USER_PASSWORD.to_string(),
            name: "Guest User".to_string(),
            email: "guest@example.com".to_string(),
            phone_number: "+12025550101".to_string(),
            profile_picture: None,
            role: UserRole::User,
        }],
        hosts: vec![HostFixture {
            id: HOST_ID.to_string(),
            username: HOST_NAME.to_string(),
            password: HOST_PASSWORD.to_string(),
            name: "Hannah Host".to_string(),
            email: "hannah@example.com".to_string(),
            phone_number: "+12025550202".to_string(),
            profile_picture: None,
            about_me: Some("Beach house owner".to_string()),
        }],
        amenities: vec![AmenityFixture {
            id: AMENITY_ID.to_string(),
            name: "Wifi".to_string(),
        }],
        properties: vec![PropertyFixture {
            id: PROPERTY_ID.to_string(),
            host_id: HOST_ID.to_string(),
            title: "Beach House".to_string(),
            description: "Steps from the sand".to_string(),
            location: "Malibu, California".to_string(),
            price_per_night: dec!(150.00),
            bedroom_count: 3,
            bathroom_count: 2,
            max_guest_count: 6,
            rating: Some(5),
            amenities: vec![AMENITY_ID.to_string()],
        }],
        reviews: vec![ReviewFixture {
            id: REVIEW_ID.to_string(),
            user_id: USER_ID.to_string(),
            property_id: PROPERTY_ID.to_string(),
            rating: 4,
            comment: Some("Lovely stay".to_string()),
        }],
        bookings: vec![BookingFixture {
            id: BOOKING_ID.to_string(),
            user_id: USER_ID.to_string(),
            property_id: PROPERTY_ID.to_string(),
            checkin_date: "2024-03-01".to_string(),
            checkout_date: "2024-03-04".to_string(),
            number_of_guests: 2,
            total_price: dec!(450.00),
            booking_status: BookingStatus::Confirmed,
        }],
    }
}
