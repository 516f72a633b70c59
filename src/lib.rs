//! StayHub API Library
//!
//! Short-term rental REST API: users, hosts, properties, amenities, reviews
//! and bookings over a relational store, with bearer-token protected writes.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;
pub mod validation;

use axum::{http::HeaderValue, Extension, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AuthConfig, AuthService};
use crate::db::DbPool;
use crate::validation::ValidationPolicy;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<config::AppConfig>,
    pub auth: Arc<AuthService>,
    pub policy: ValidationPolicy,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires services, token issuing and validation rules from one config.
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> Self {
        let policy = ValidationPolicy::from_config(&config);
        let auth = Arc::new(AuthService::new(AuthConfig::from_app_config(&config)));
        let services = handlers::AppServices::new(db.clone(), policy);
        Self {
            db,
            config: Arc::new(config),
            auth,
            policy,
            services,
        }
    }
}

/// Resource routes, each mounted at the root of the service.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/health", handlers::health::health_routes())
        .merge(handlers::auth::auth_router())
        .nest("/users", handlers::users::user_routes())
        .nest("/hosts", handlers::hosts::host_routes())
        .nest("/properties", handlers::properties::property_routes())
        .nest("/amenities", handlers::amenities::amenity_routes())
        .nest("/reviews", handlers::reviews::review_routes())
        .nest("/bookings", handlers::bookings::booking_routes())
}

/// Full application router with CORS, tracing, request context and the
/// swagger UI.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(api_routes())
        .merge(openapi::swagger_ui())
        .layer(Extension(state.auth.clone()))
        .layer(axum::middleware::from_fn(
            crate::tracing::request_logging_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::tracing::request_context_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(crate::tracing::RequestSpanMaker))
        .layer(cors)
        .with_state(state)
}

/// Explicit origins win; otherwise permissive outside production and
/// same-origin only in production.
fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.is_production() {
        ::tracing::warn!("no CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    } else {
        CorsLayer::permissive()
    }
}
