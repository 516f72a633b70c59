//! Bulk fixture loading.
//!
//! Steps run in dependency order (users, hosts and amenities, then
//! properties, then reviews and bookings) and each row is upserted by id, so
//! running the whole sequence again leaves the same rows behind. The steps
//! are not wrapped in one transaction: when a step fails the earlier ones
//! stay applied and the error names the failing step.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ConnectionTrait, DbErr, EntityTrait, Set,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt, fs, path::Path, path::PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::bookings::{
    parse_booking_date, validate_guests, validate_stay, validate_total_price, INVALID_DATE_MESSAGE,
};
use super::properties::{ensure_positive_price, CreatePropertyRequest};
use super::references::{
    ensure_amenities_exist, ensure_host_exists, ensure_property_exists, ensure_user_exists,
};
use super::reviews::validate_rating;
use crate::entities::{
    amenity, booking, host, property, property_amenity, review, user, BookingStatus, UserRole,
};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFixture {
    pub id: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostFixture {
    pub id: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub profile_picture: Option<String>,
    pub about_me: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmenityFixture {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFixture {
    pub id: String,
    pub host_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price_per_night: Decimal,
    pub bedroom_count: i32,
    #[serde(rename = "bathRoomCount")]
    pub bathroom_count: i32,
    pub max_guest_count: i32,
    pub rating: Option<i32>,
    /// Amenity ids to link
    #[serde(default)]
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFixture {
    pub id: String,
    pub user_id: String,
    pub property_id: String,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFixture {
    pub id: String,
    pub user_id: String,
    pub property_id: String,
    pub checkin_date: String,
    pub checkout_date: String,
    pub number_of_guests: i32,
    pub total_price: Decimal,
    #[serde(default)]
    pub booking_status: BookingStatus,
}

#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub users: Vec<UserFixture>,
    pub hosts: Vec<HostFixture>,
    pub amenities: Vec<AmenityFixture>,
    pub properties: Vec<PropertyFixture>,
    pub reviews: Vec<ReviewFixture>,
    pub bookings: Vec<BookingFixture>,
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} has no \"{key}\" array", .path.display())]
    MissingKey { path: PathBuf, key: &'static str },
}

impl PropertyFixture {
    /// The create payload this fixture stands for, so both paths share the
    /// same field rules.
    fn as_request(&self) -> CreatePropertyRequest {
        CreatePropertyRequest {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            location: Some(self.location.clone()),
            price_per_night: Some(self.price_per_night),
            bedroom_count: Some(self.bedroom_count),
            bathroom_count: Some(self.bathroom_count),
            max_guest_count: Some(self.max_guest_count),
            rating: self.rating,
            host_id: Some(self.host_id.clone()),
            amenity_ids: Some(self.amenities.clone()),
        }
    }
}

impl Fixtures {
    /// Reads `users.json`, `hosts.json`, `amenities.json`, `properties.json`,
    /// `reviews.json` and `bookings.json` from `dir`. Each file holds an
    /// object with one array named like the file. Absent files load as empty.
    pub fn load_dir(dir: &Path) -> Result<Self, FixtureError> {
        Ok(Self {
            users: load_collection(dir, "users")?,
            hosts: load_collection(dir, "hosts")?,
            amenities: load_collection(dir, "amenities")?,
            properties: load_collection(dir, "properties")?,
            reviews: load_collection(dir, "reviews")?,
            bookings: load_collection(dir, "bookings")?,
        })
    }
}

fn load_collection<T: DeserializeOwned>(
    dir: &Path,
    key: &'static str,
) -> Result<Vec<T>, FixtureError> {
    let path = dir.join(format!("{}.json", key));
    if !path.exists() {
        warn!(path = %path.display(), "fixture file not found, skipping");
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(&path).map_err(|source| FixtureError::Io {
        path: path.clone(),
        source,
    })?;
    let mut document: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
        .map_err(|source| FixtureError::Parse {
            path: path.clone(),
            source,
        })?;
    let items = document
        .remove(key)
        .ok_or_else(|| FixtureError::MissingKey {
            path: path.clone(),
            key,
        })?;
    serde_json::from_value(items).map_err(|source| FixtureError::Parse { path, source })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStep {
    Reset,
    Users,
    Hosts,
    Amenities,
    Properties,
    Reviews,
    Bookings,
}

impl fmt::Display for SeedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeedStep::Reset => "reset",
            SeedStep::Users => "users",
            SeedStep::Hosts => "hosts",
            SeedStep::Amenities => "amenities",
            SeedStep::Properties => "properties",
            SeedStep::Reviews => "reviews",
            SeedStep::Bookings => "bookings",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("seeding failed at step '{step}': {source}")]
pub struct SeedError {
    pub step: SeedStep,
    #[source]
    pub source: ServiceError,
}

trait StepContext<T> {
    fn at(self, step: SeedStep) -> Result<T, SeedError>;
}

impl<T, E: Into<ServiceError>> StepContext<T> for Result<T, E> {
    fn at(self, step: SeedStep) -> Result<T, SeedError> {
        self.map_err(|err| SeedError {
            step,
            source: err.into(),
        })
    }
}

/// Rows written per step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub reset: bool,
    pub users: usize,
    pub hosts: usize,
    pub amenities: usize,
    pub properties: usize,
    pub property_amenities: usize,
    pub reviews: usize,
    pub bookings: usize,
}

pub struct SeedOrchestrator<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> SeedOrchestrator<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    #[instrument(skip(self, fixtures))]
    pub async fn run(&self, fixtures: &Fixtures, reset: bool) -> Result<SeedReport, SeedError> {
        let mut report = SeedReport::default();

        if reset {
            self.reset().await.at(SeedStep::Reset)?;
            report.reset = true;
            info!("database cleared");
        }

        report.users = self.seed_users(&fixtures.users).await.at(SeedStep::Users)?;
        report.hosts = self.seed_hosts(&fixtures.hosts).await.at(SeedStep::Hosts)?;
        report.amenities = self
            .seed_amenities(&fixtures.amenities)
            .await
            .at(SeedStep::Amenities)?;
        (report.properties, report.property_amenities) = self
            .seed_properties(&fixtures.properties)
            .await
            .at(SeedStep::Properties)?;
        report.reviews = self
            .seed_reviews(&fixtures.reviews)
            .await
            .at(SeedStep::Reviews)?;
        report.bookings = self
            .seed_bookings(&fixtures.bookings)
            .await
            .at(SeedStep::Bookings)?;

        info!(?report, "database seeded");
        Ok(report)
    }

    /// Children before parents.
    async fn reset(&self) -> Result<(), DbErr> {
        booking::Entity::delete_many().exec(self.db).await?;
        review::Entity::delete_many().exec(self.db).await?;
        property_amenity::Entity::delete_many().exec(self.db).await?;
        property::Entity::delete_many().exec(self.db).await?;
        amenity::Entity::delete_many().exec(self.db).await?;
        host::Entity::delete_many().exec(self.db).await?;
        user::Entity::delete_many().exec(self.db).await?;
        Ok(())
    }

    async fn seed_users(&self, users: &[UserFixture]) -> Result<usize, ServiceError> {
        let now = Utc::now();
        for fixture in users {
            let row = user::ActiveModel {
                id: Set(fixture.id.clone()),
                username: Set(fixture.username.clone()),
                password: Set(fixture.password.clone()),
                name: Set(fixture.name.clone()),
                email: Set(fixture.email.clone()),
                phone_number: Set(fixture.phone_number.clone()),
                profile_picture: Set(fixture.profile_picture.clone()),
                role: Set(fixture.role),
                created_at: Set(now),
                updated_at: Set(now),
            };
            user::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(user::Column::Id)
                        .update_columns([
                            user::Column::Username,
                            user::Column::Password,
                            user::Column::Name,
                            user::Column::Email,
                            user::Column::PhoneNumber,
                            user::Column::ProfilePicture,
                            user::Column::Role,
                            user::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(self.db)
                .await?;
        }
        Ok(users.len())
    }

    async fn seed_hosts(&self, hosts: &[HostFixture]) -> Result<usize, ServiceError> {
        let now = Utc::now();
        for fixture in hosts {
            let row = host::ActiveModel {
                id: Set(fixture.id.clone()),
                username: Set(fixture.username.clone()),
                password: Set(fixture.password.clone()),
                name: Set(fixture.name.clone()),
                email: Set(fixture.email.clone()),
                phone_number: Set(fixture.phone_number.clone()),
                profile_picture: Set(fixture.profile_picture.clone()),
                about_me: Set(fixture.about_me.clone()),
                created_at: Set(now),
                updated_at: Set(now),
            };
            host::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(host::Column::Id)
                        .update_columns([
                            host::Column::Username,
                            host::Column::Password,
                            host::Column::Name,
                            host::Column::Email,
                            host::Column::PhoneNumber,
                            host::Column::ProfilePicture,
                            host::Column::AboutMe,
                            host::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(self.db)
                .await?;
        }
        Ok(hosts.len())
    }

    async fn seed_amenities(&self, amenities: &[AmenityFixture]) -> Result<usize, ServiceError> {
        let now = Utc::now();
        for fixture in amenities {
            let row = amenity::ActiveModel {
                id: Set(fixture.id.clone()),
                name: Set(fixture.name.clone()),
                created_at: Set(now),
                updated_at: Set(now),
            };
            amenity::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(amenity::Column::Id)
                        .update_columns([amenity::Column::Name, amenity::Column::UpdatedAt])
                        .to_owned(),
                )
                .exec_without_returning(self.db)
                .await?;
        }
        Ok(amenities.len())
    }

    async fn seed_properties(
        &self,
        properties: &[PropertyFixture],
    ) -> Result<(usize, usize), ServiceError> {
        let now = Utc::now();
        let mut links = 0;
        for fixture in properties {
            fixture.as_request().validate()?;
            ensure_positive_price(Some(fixture.price_per_night))?;
            ensure_host_exists(self.db, "hostId", &fixture.host_id).await?;
            ensure_amenities_exist(self.db, "amenities", &fixture.amenities).await?;

            let row = property::ActiveModel {
                id: Set(fixture.id.clone()),
                title: Set(fixture.title.clone()),
                description: Set(fixture.description.clone()),
                location: Set(fixture.location.clone()),
                price_per_night: Set(fixture.price_per_night),
                bedroom_count: Set(fixture.bedroom_count),
                bathroom_count: Set(fixture.bathroom_count),
                max_guest_count: Set(fixture.max_guest_count),
                rating: Set(fixture.rating),
                host_id: Set(fixture.host_id.clone()),
                created_at: Set(now),
                updated_at: Set(now),
            };
            property::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(property::Column::Id)
                        .update_columns([
                            property::Column::Title,
                            property::Column::Description,
                            property::Column::Location,
                            property::Column::PricePerNight,
                            property::Column::BedroomCount,
                            property::Column::BathroomCount,
                            property::Column::MaxGuestCount,
                            property::Column::Rating,
                            property::Column::HostId,
                            property::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(self.db)
                .await?;

            for amenity_id in &fixture.amenities {
                let link = property_amenity::ActiveModel {
                    property_id: Set(fixture.id.clone()),
                    amenity_id: Set(amenity_id.clone()),
                };
                let inserted = property_amenity::Entity::insert(link)
                    .on_conflict(
                        OnConflict::columns([
                            property_amenity::Column::PropertyId,
                            property_amenity::Column::AmenityId,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(self.db)
                    .await;
                match inserted {
                    Ok(_) | Err(DbErr::RecordNotInserted) => links += 1,
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Ok((properties.len(), links))
    }

    async fn seed_reviews(&self, reviews: &[ReviewFixture]) -> Result<usize, ServiceError> {
        let now = Utc::now();
        for fixture in reviews {
            validate_rating(fixture.rating)?;
            ensure_user_exists(self.db, "userId", &fixture.user_id).await?;
            ensure_property_exists(self.db, "propertyId", &fixture.property_id).await?;

            let row = review::ActiveModel {
                id: Set(fixture.id.clone()),
                user_id: Set(fixture.user_id.clone()),
                property_id: Set(fixture.property_id.clone()),
                rating: Set(fixture.rating),
                comment: Set(fixture.comment.clone()),
                created_at: Set(now),
                updated_at: Set(now),
            };
            review::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(review::Column::Id)
                        .update_columns([
                            review::Column::UserId,
                            review::Column::PropertyId,
                            review::Column::Rating,
                            review::Column::Comment,
                            review::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(self.db)
                .await?;
        }
        Ok(reviews.len())
    }

    async fn seed_bookings(&self, bookings: &[BookingFixture]) -> Result<usize, ServiceError> {
        let now = Utc::now();
        for fixture in bookings {
            let checkin = parse_booking_date(&fixture.checkin_date)
                .ok_or_else(|| ServiceError::invalid("checkinDate", INVALID_DATE_MESSAGE))?;
            let checkout = parse_booking_date(&fixture.checkout_date)
                .ok_or_else(|| ServiceError::invalid("checkoutDate", INVALID_DATE_MESSAGE))?;
            validate_stay(checkin, checkout)?;
            validate_guests(fixture.number_of_guests)?;
            validate_total_price(fixture.total_price)?;
            ensure_user_exists(self.db, "userId", &fixture.user_id).await?;
            ensure_property_exists(self.db, "propertyId", &fixture.property_id).await?;

            let row = booking::ActiveModel {
                id: Set(fixture.id.clone()),
                user_id: Set(fixture.user_id.clone()),
                property_id: Set(fixture.property_id.clone()),
                checkin_date: Set(checkin),
                checkout_date: Set(checkout),
                number_of_guests: Set(fixture.number_of_guests),
                total_price: Set(fixture.total_price),
                booking_status: Set(fixture.booking_status),
                created_at: Set(now),
                updated_at: Set(now),
            };
            booking::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(booking::Column::Id)
                        .update_columns([
                            booking::Column::UserId,
                            booking::Column::PropertyId,
                            booking::Column::CheckinDate,
                            booking::Column::CheckoutDate,
                            booking::Column::NumberOfGuests,
                            booking::Column::TotalPrice,
                            booking::Column::BookingStatus,
                            booking::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(self.db)
                .await?;
        }
        Ok(bookings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) {
        let mut file = fs::File::create(dir.path().join(name)).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn loads_keyed_arrays_and_skips_absent_files() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "amenities.json",
            r#"{"amenities": [{"id": "a1", "name": "Wifi"}, {"id": "a2", "name": "Pool"}]}"#,
        );

        let fixtures = Fixtures::load_dir(dir.path()).unwrap();
        assert_eq!(fixtures.amenities.len(), 2);
        assert!(fixtures.users.is_empty());
        assert!(fixtures.bookings.is_empty());
    }

    #[test]
    fn wrong_top_level_key_is_reported() {
        let dir = TempDir::new().unwrap();
        write(&dir, "hosts.json", r#"{"people": []}"#);

        let err = Fixtures::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, FixtureError::MissingKey { key: "hosts", .. }));
    }

    #[test]
    fn booking_fixture_status_defaults_to_pending() {
        let fixture: BookingFixture = serde_json::from_str(
            r#"{"id":"b1","userId":"u1","propertyId":"p1","checkinDate":"2024-03-01",
                "checkoutDate":"2024-03-04","numberOfGuests":2,"totalPrice":300}"#,
        )
        .unwrap();
        assert_eq!(fixture.booking_status, BookingStatus::Pending);
    }

    #[test]
    fn seed_error_names_the_step() {
        let err = SeedError {
            step: SeedStep::Properties,
            source: ServiceError::invalid("hostId", "Host with id h9 does not exist"),
        };
        assert_eq!(
            err.to_string(),
            "seeding failed at step 'properties': Host with id h9 does not exist"
        );
    }
}
