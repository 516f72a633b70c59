use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, LoaderTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::references::{ensure_amenities_exist, ensure_host_exists};
use crate::{
    db::DbPool,
    entities::{amenity, host, property, property_amenity, review},
    errors::ServiceError,
    validation::{ensure_patch_not_empty, has_text, require_fields},
};

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price_per_night: Option<Decimal>,
    #[validate(range(min = 1, message = "Bedroom count must be a positive integer"))]
    pub bedroom_count: Option<i32>,
    #[serde(rename = "bathRoomCount")]
    #[validate(range(min = 1, message = "Bathroom count must be a positive integer"))]
    pub bathroom_count: Option<i32>,
    #[validate(range(min = 1, message = "Max guest count must be a positive integer"))]
    pub max_guest_count: Option<i32>,
    #[validate(range(min = 0, max = 5, message = "Rating must be between 0 and 5"))]
    pub rating: Option<i32>,
    pub host_id: Option<String>,
    pub amenity_ids: Option<Vec<String>>,
}

/// Fields a property update may change. `amenityIds` replaces the whole set.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price_per_night: Option<Decimal>,
    #[validate(range(min = 1, message = "Bedroom count must be a positive integer"))]
    pub bedroom_count: Option<i32>,
    #[serde(rename = "bathRoomCount")]
    #[validate(range(min = 1, message = "Bathroom count must be a positive integer"))]
    pub bathroom_count: Option<i32>,
    #[validate(range(min = 1, message = "Max guest count must be a positive integer"))]
    pub max_guest_count: Option<i32>,
    #[validate(range(min = 0, max = 5, message = "Rating must be between 0 and 5"))]
    pub rating: Option<i32>,
    pub host_id: Option<String>,
    pub amenity_ids: Option<Vec<String>>,
}

impl UpdatePropertyRequest {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.price_per_night.is_none()
            && self.bedroom_count.is_none()
            && self.bathroom_count.is_none()
            && self.max_guest_count.is_none()
            && self.rating.is_none()
            && self.host_id.is_none()
            && self.amenity_ids.is_none()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PropertyFilter {
    /// Exact location
    pub location: Option<String>,
    /// Exact nightly price
    #[param(value_type = Option<f64>)]
    pub price_per_night: Option<Decimal>,
    /// Comma-separated amenity names; matches properties having any of them
    pub amenities: Option<String>,
}

/// A property with its amenities, reviews and host
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyWithRelations {
    #[serde(flatten)]
    pub property: property::Model,
    pub amenities: Vec<amenity::Model>,
    pub reviews: Vec<review::Model>,
    pub host: Option<host::Model>,
}

pub(super) fn ensure_positive_price(price: Option<Decimal>) -> Result<(), ServiceError> {
    match price {
        Some(p) if p <= Decimal::ZERO => Err(ServiceError::invalid(
            "pricePerNight",
            "Price per night must be a positive number",
        )),
        _ => Ok(()),
    }
}

/// Drops duplicate ids while keeping first-seen order.
fn unique_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

async fn link_amenities<C: ConnectionTrait>(
    db: &C,
    property_id: &str,
    amenity_ids: &[String],
) -> Result<(), ServiceError> {
    if amenity_ids.is_empty() {
        return Ok(());
    }
    let rows = amenity_ids.iter().map(|amenity_id| property_amenity::ActiveModel {
        property_id: Set(property_id.to_owned()),
        amenity_id: Set(amenity_id.clone()),
    });
    property_amenity::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

#[derive(Clone)]
pub struct PropertyService {
    db: Arc<DbPool>,
}

impl PropertyService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: PropertyFilter,
    ) -> Result<Vec<PropertyWithRelations>, ServiceError> {
        let mut query = property::Entity::find().order_by_asc(property::Column::CreatedAt);
        if let Some(location) = filter.location.filter(|s| !s.is_empty()) {
            query = query.filter(property::Column::Location.eq(location));
        }
        if let Some(price) = filter.price_per_night {
            query = query.filter(property::Column::PricePerNight.eq(price));
        }
        if let Some(raw) = filter.amenities {
            let names: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if !names.is_empty() {
                let property_ids = self.property_ids_with_any_amenity(names).await?;
                debug!(matches = property_ids.len(), "amenity filter resolved");
                query = query.filter(property::Column::Id.is_in(property_ids));
            }
        }

        let properties = query.all(&*self.db).await?;
        self.with_relations(properties).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<PropertyWithRelations, ServiceError> {
        let property = self.find_model(id).await?;
        let mut loaded = self.with_relations(vec![property]).await?;
        loaded
            .pop()
            .ok_or_else(|| ServiceError::not_found("Property", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreatePropertyRequest,
    ) -> Result<PropertyWithRelations, ServiceError> {
        require_fields(&[
            ("title", has_text(&input.title)),
            ("description", has_text(&input.description)),
            ("location", has_text(&input.location)),
            ("pricePerNight", input.price_per_night.is_some()),
            ("bedroomCount", input.bedroom_count.is_some()),
            ("bathRoomCount", input.bathroom_count.is_some()),
            ("maxGuestCount", input.max_guest_count.is_some()),
            ("hostId", has_text(&input.host_id)),
        ])?;
        input.validate()?;
        ensure_positive_price(input.price_per_night)?;

        let host_id = input.host_id.unwrap_or_default();
        let amenity_ids = unique_ids(input.amenity_ids.unwrap_or_default());
        ensure_host_exists(&*self.db, "hostId", &host_id).await?;
        ensure_amenities_exist(&*self.db, "amenityIds", &amenity_ids).await?;

        let now = Utc::now();
        let id = super::new_id();
        let txn = self.db.begin().await?;
        property::ActiveModel {
            id: Set(id.clone()),
            title: Set(input.title.unwrap_or_default()),
            description: Set(input.description.unwrap_or_default()),
            location: Set(input.location.unwrap_or_default()),
            price_per_night: Set(input.price_per_night.unwrap_or_default()),
            bedroom_count: Set(input.bedroom_count.unwrap_or_default()),
            bathroom_count: Set(input.bathroom_count.unwrap_or_default()),
            max_guest_count: Set(input.max_guest_count.unwrap_or_default()),
            rating: Set(input.rating),
            host_id: Set(host_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        link_amenities(&txn, &id, &amenity_ids).await?;
        txn.commit().await?;

        info!(property_id = %id, amenities = amenity_ids.len(), "property created");
        self.get(&id).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: &str,
        patch: UpdatePropertyRequest,
    ) -> Result<PropertyWithRelations, ServiceError> {
        ensure_patch_not_empty(!patch.is_empty())?;
        patch.validate()?;
        ensure_positive_price(patch.price_per_night)?;

        let existing = self.find_model(id).await?;
        if let Some(host_id) = patch.host_id.as_deref() {
            if host_id != existing.host_id {
                ensure_host_exists(&*self.db, "hostId", host_id).await?;
            }
        }
        let amenity_ids = patch.amenity_ids.map(unique_ids);
        if let Some(ids) = amenity_ids.as_deref() {
            ensure_amenities_exist(&*self.db, "amenityIds", ids).await?;
        }

        let mut active = existing.into_active_model();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(location) = patch.location {
            active.location = Set(location);
        }
        if let Some(price) = patch.price_per_night {
            active.price_per_night = Set(price);
        }
        if let Some(count) = patch.bedroom_count {
            active.bedroom_count = Set(count);
        }
        if let Some(count) = patch.bathroom_count {
            active.bathroom_count = Set(count);
        }
        if let Some(count) = patch.max_guest_count {
            active.max_guest_count = Set(count);
        }
        if let Some(rating) = patch.rating {
            active.rating = Set(Some(rating));
        }
        if let Some(host_id) = patch.host_id {
            active.host_id = Set(host_id);
        }
        active.updated_at = Set(Utc::now());

        let txn = self.db.begin().await?;
        active.update(&txn).await?;
        if let Some(ids) = amenity_ids.as_deref() {
            property_amenity::Entity::delete_many()
                .filter(property_amenity::Column::PropertyId.eq(id))
                .exec(&txn)
                .await?;
            link_amenities(&txn, id, ids).await?;
        }
        txn.commit().await?;

        info!(property_id = %id, "property updated");
        self.get(id).await
    }

    /// Removes the property; its reviews, bookings and amenity links cascade.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<property::Model, ServiceError> {
        let existing = self.find_model(id).await?;
        let result = property::Entity::delete_by_id(id.to_owned())
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Property", id));
        }
        info!(property_id = %id, "property deleted");
        Ok(existing)
    }

    async fn find_model(&self, id: &str) -> Result<property::Model, ServiceError> {
        property::Entity::find_by_id(id.to_owned())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Property", id))
    }

    async fn property_ids_with_any_amenity(
        &self,
        names: Vec<String>,
    ) -> Result<Vec<String>, ServiceError> {
        let amenity_ids: Vec<String> = amenity::Entity::find()
            .select_only()
            .column(amenity::Column::Id)
            .filter(amenity::Column::Name.is_in(names))
            .into_tuple()
            .all(&*self.db)
            .await?;
        if amenity_ids.is_empty() {
            return Ok(Vec::new());
        }

        let property_ids: Vec<String> = property_amenity::Entity::find()
            .select_only()
            .column(property_amenity::Column::PropertyId)
            .distinct()
            .filter(property_amenity::Column::AmenityId.is_in(amenity_ids))
            .into_tuple()
            .all(&*self.db)
            .await?;
        Ok(property_ids)
    }

    async fn with_relations(
        &self,
        properties: Vec<property::Model>,
    ) -> Result<Vec<PropertyWithRelations>, ServiceError> {
        let db = &*self.db;
        let amenities = properties
            .load_many_to_many(amenity::Entity, property_amenity::Entity, db)
            .await?;
        let reviews = properties.load_many(review::Entity, db).await?;
        let hosts = properties.load_one(host::Entity, db).await?;

        Ok(properties
            .into_iter()
            .zip(amenities)
            .zip(reviews)
            .zip(hosts)
            .map(|(((property, amenities), reviews), host)| PropertyWithRelations {
                property,
                amenities,
                reviews,
                host,
            })
            .collect())
    }
}
