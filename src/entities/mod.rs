//! sea-orm entities for the rental domain.
//!
//! Every table uses a string primary key: API-created rows receive a UUID v4,
//! while fixture rows keep whatever stable id the fixture file declares.

pub mod amenity;
pub mod booking;
pub mod host;
pub mod property;
pub mod property_amenity;
pub mod review;
pub mod user;

pub use booking::BookingStatus;
pub use user::UserRole;
