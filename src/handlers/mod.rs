pub mod amenities;
pub mod auth;
pub mod bookings;
pub mod common;
pub mod health;
pub mod hosts;
pub mod properties;
pub mod reviews;
pub mod users;

use crate::{
    db::DbPool,
    services::{
        amenities::AmenityService, bookings::BookingService, hosts::HostService,
        properties::PropertyService, reviews::ReviewService, users::UserService,
    },
    validation::ValidationPolicy,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub hosts: Arc<HostService>,
    pub amenities: Arc<AmenityService>,
    pub properties: Arc<PropertyService>,
    pub reviews: Arc<ReviewService>,
    pub bookings: Arc<BookingService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, policy: ValidationPolicy) -> Self {
        Self {
            users: Arc::new(UserService::new(db_pool.clone(), policy)),
            hosts: Arc::new(HostService::new(db_pool.clone(), policy)),
            amenities: Arc::new(AmenityService::new(db_pool.clone())),
            properties: Arc::new(PropertyService::new(db_pool.clone())),
            reviews: Arc::new(ReviewService::new(db_pool.clone())),
            bookings: Arc::new(BookingService::new(db_pool)),
        }
    }
}
