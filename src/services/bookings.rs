//! Booking service and the stay rules every booking must satisfy.
//!
//! Creation runs its checks in a fixed order: required fields, date parsing,
//! date ordering, guest/price positivity, then existence of the referenced
//! user and property. Only after all of them pass is the row inserted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, LoaderTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use super::references::{ensure_property_exists, ensure_user_exists};
use crate::{
    db::DbPool,
    entities::{booking, property, user, BookingStatus},
    errors::ServiceError,
    validation::{ensure_patch_not_empty, has_text, require_fields},
};

pub const INVALID_DATE_MESSAGE: &str =
    "Invalid date format. Check-in and check-out dates must be valid dates.";
pub const DATE_ORDER_MESSAGE: &str = "Check-out date must be after check-in date.";

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub user_id: Option<String>,
    pub property_id: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub checkin_date: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub checkout_date: Option<String>,
    pub number_of_guests: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub total_price: Option<Decimal>,
    /// pending (default), confirmed, cancelled or completed
    pub booking_status: Option<String>,
}

/// Fields a booking update may change. The user and property are fixed.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub checkin_date: Option<String>,
    pub checkout_date: Option<String>,
    pub number_of_guests: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub total_price: Option<Decimal>,
    pub booking_status: Option<String>,
}

impl UpdateBookingRequest {
    fn is_empty(&self) -> bool {
        self.checkin_date.is_none()
            && self.checkout_date.is_none()
            && self.number_of_guests.is_none()
            && self.total_price.is_none()
            && self.booking_status.is_none()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookingFilter {
    pub user_id: Option<String>,
    pub property_id: Option<String>,
    /// pending, confirmed, cancelled or completed
    pub booking_status: Option<String>,
}

/// A booking with the guest and the booked property
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingWithRelations {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub user: Option<user::Model>,
    pub property: Option<property::Model>,
}

/// Accepts an RFC 3339 timestamp, a zone-less `YYYY-MM-DDTHH:MM:SS` (read as
/// UTC) or a plain calendar date (midnight UTC).
pub fn parse_booking_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_dates(
    checkin: &str,
    checkout: &str,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
    match (parse_booking_date(checkin), parse_booking_date(checkout)) {
        (Some(checkin), Some(checkout)) => Ok((checkin, checkout)),
        (checkin_ok, _) => {
            let field = if checkin_ok.is_none() {
                "checkinDate"
            } else {
                "checkoutDate"
            };
            Err(ServiceError::invalid(field, INVALID_DATE_MESSAGE))
        }
    }
}

pub fn validate_stay(checkin: DateTime<Utc>, checkout: DateTime<Utc>) -> Result<(), ServiceError> {
    if checkout > checkin {
        Ok(())
    } else {
        Err(ServiceError::invalid("checkoutDate", DATE_ORDER_MESSAGE))
    }
}

pub(super) fn validate_guests(guests: i32) -> Result<(), ServiceError> {
    if guests > 0 {
        Ok(())
    } else {
        Err(ServiceError::invalid(
            "numberOfGuests",
            "Number of guests must be a positive integer.",
        ))
    }
}

pub(super) fn validate_total_price(price: Decimal) -> Result<(), ServiceError> {
    if price > Decimal::ZERO {
        Ok(())
    } else {
        Err(ServiceError::invalid(
            "totalPrice",
            "Total price must be a positive number.",
        ))
    }
}

fn parse_status(raw: &str) -> Result<BookingStatus, ServiceError> {
    raw.parse::<BookingStatus>()
        .map_err(|message| ServiceError::invalid("bookingStatus", message))
}

#[derive(Clone)]
pub struct BookingService {
    db: Arc<DbPool>,
}

impl BookingService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: BookingFilter,
    ) -> Result<Vec<BookingWithRelations>, ServiceError> {
        let mut query = booking::Entity::find().order_by_asc(booking::Column::CheckinDate);
        if let Some(user_id) = filter.user_id {
            query = query.filter(booking::Column::UserId.eq(user_id));
        }
        if let Some(property_id) = filter.property_id {
            query = query.filter(booking::Column::PropertyId.eq(property_id));
        }
        if let Some(status) = filter.booking_status.as_deref() {
            query = query.filter(booking::Column::BookingStatus.eq(parse_status(status)?));
        }

        let bookings = query.all(&*self.db).await?;
        self.with_relations(bookings).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<BookingWithRelations, ServiceError> {
        let booking = self.find_model(id).await?;
        let mut loaded = self.with_relations(vec![booking]).await?;
        loaded
            .pop()
            .ok_or_else(|| ServiceError::not_found("Booking", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateBookingRequest) -> Result<booking::Model, ServiceError> {
        require_fields(&[
            ("userId", has_text(&input.user_id)),
            ("propertyId", has_text(&input.property_id)),
            ("checkinDate", has_text(&input.checkin_date)),
            ("checkoutDate", has_text(&input.checkout_date)),
            ("numberOfGuests", input.number_of_guests.is_some()),
            ("totalPrice", input.total_price.is_some()),
        ])?;

        let (checkin, checkout) = parse_dates(
            input.checkin_date.as_deref().unwrap_or_default(),
            input.checkout_date.as_deref().unwrap_or_default(),
        )?;
        validate_stay(checkin, checkout).map_err(|err| {
            warn!(%checkin, %checkout, "rejected booking with inverted dates");
            err
        })?;

        let guests = input.number_of_guests.unwrap_or_default();
        let total_price = input.total_price.unwrap_or_default();
        validate_guests(guests)?;
        validate_total_price(total_price)?;
        let status = input
            .booking_status
            .as_deref()
            .map(parse_status)
            .transpose()?
            .unwrap_or_default();

        let user_id = input.user_id.unwrap_or_default();
        let property_id = input.property_id.unwrap_or_default();
        ensure_user_exists(&*self.db, "userId", &user_id).await?;
        ensure_property_exists(&*self.db, "propertyId", &property_id).await?;

        let now = Utc::now();
        let model = booking::ActiveModel {
            id: Set(super::new_id()),
            user_id: Set(user_id),
            property_id: Set(property_id),
            checkin_date: Set(checkin),
            checkout_date: Set(checkout),
            number_of_guests: Set(guests),
            total_price: Set(total_price),
            booking_status: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(booking_id = %model.id, user_id = %model.user_id, property_id = %model.property_id, "booking created");
        Ok(model)
    }

    /// Applies the patch and re-checks the resulting stay against the stored dates.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: &str,
        patch: UpdateBookingRequest,
    ) -> Result<booking::Model, ServiceError> {
        ensure_patch_not_empty(!patch.is_empty())?;

        let checkin = patch
            .checkin_date
            .as_deref()
            .map(|raw| {
                parse_booking_date(raw)
                    .ok_or_else(|| ServiceError::invalid("checkinDate", INVALID_DATE_MESSAGE))
            })
            .transpose()?;
        let checkout = patch
            .checkout_date
            .as_deref()
            .map(|raw| {
                parse_booking_date(raw)
                    .ok_or_else(|| ServiceError::invalid("checkoutDate", INVALID_DATE_MESSAGE))
            })
            .transpose()?;
        if let Some(guests) = patch.number_of_guests {
            validate_guests(guests)?;
        }
        if let Some(price) = patch.total_price {
            validate_total_price(price)?;
        }
        let status = patch.booking_status.as_deref().map(parse_status).transpose()?;

        let existing = self.find_model(id).await?;
        validate_stay(
            checkin.unwrap_or(existing.checkin_date),
            checkout.unwrap_or(existing.checkout_date),
        )?;

        let mut active = existing.into_active_model();
        if let Some(checkin) = checkin {
            active.checkin_date = Set(checkin);
        }
        if let Some(checkout) = checkout {
            active.checkout_date = Set(checkout);
        }
        if let Some(guests) = patch.number_of_guests {
            active.number_of_guests = Set(guests);
        }
        if let Some(price) = patch.total_price {
            active.total_price = Set(price);
        }
        if let Some(status) = status {
            active.booking_status = Set(status);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(booking_id = %updated.id, status = %updated.booking_status, "booking updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<booking::Model, ServiceError> {
        let existing = self.find_model(id).await?;
        let result = booking::Entity::delete_by_id(id.to_owned())
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Booking", id));
        }
        info!(booking_id = %id, "booking deleted");
        Ok(existing)
    }

    async fn find_model(&self, id: &str) -> Result<booking::Model, ServiceError> {
        booking::Entity::find_by_id(id.to_owned())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Booking", id))
    }

    async fn with_relations(
        &self,
        bookings: Vec<booking::Model>,
    ) -> Result<Vec<BookingWithRelations>, ServiceError> {
        let users = bookings.load_one(user::Entity, &*self.db).await?;
        let properties = bookings.load_one(property::Entity, &*self.db).await?;

        Ok(bookings
            .into_iter()
            .zip(users)
            .zip(properties)
            .map(|((booking, user), property)| BookingWithRelations {
                booking,
                user,
                property,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_calendar_dates_as_utc_midnight() {
        let parsed = parse_booking_date("2024-01-10").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = parse_booking_date("2024-01-10T15:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 10, 13, 0, 0).unwrap());
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(parse_booking_date("2024-02-30").is_none());
        assert!(parse_booking_date("next tuesday").is_none());
        assert!(parse_booking_date("").is_none());
    }

    #[test]
    fn invalid_checkout_names_checkout_field() {
        let err = parse_dates("2024-01-10", "soon").unwrap_err();
        assert_eq!(err.to_string(), INVALID_DATE_MESSAGE);
        assert_eq!(err.fields(), ["checkoutDate".to_string()]);
    }

    #[test]
    fn same_day_checkout_is_rejected() {
        let day = parse_booking_date("2024-01-10").unwrap();
        let err = validate_stay(day, day).unwrap_err();
        assert_matches!(err, ServiceError::Validation { .. });
        assert_eq!(err.to_string(), DATE_ORDER_MESSAGE);
    }

    #[test]
    fn guests_and_price_must_be_positive() {
        assert!(validate_guests(0).is_err());
        assert!(validate_guests(3).is_ok());
        assert!(validate_total_price(dec!(0)).is_err());
        assert!(validate_total_price(dec!(-5)).is_err());
        assert!(validate_total_price(dec!(99.99)).is_ok());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = parse_status("archived").unwrap_err();
        assert_eq!(err.fields(), ["bookingStatus".to_string()]);
        assert_eq!(parse_status("Confirmed").unwrap(), BookingStatus::Confirmed);
    }

    proptest! {
        #[test]
        fn stay_is_valid_iff_checkout_after_checkin(
            start in 0i64..10_000_000,
            offset in -1_000_000i64..1_000_000,
        ) {
            let checkin = Utc.timestamp_opt(1_600_000_000 + start, 0).unwrap();
            let checkout = checkin + Duration::seconds(offset);
            prop_assert_eq!(validate_stay(checkin, checkout).is_ok(), offset > 0);
        }
    }
}
