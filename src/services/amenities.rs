use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use super::contains_ignore_case;
use crate::{
    db::DbPool,
    entities::amenity,
    errors::ServiceError,
    validation::{has_text, require_fields},
};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AmenityRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AmenityFilter {
    /// Case-insensitive substring of the amenity name
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct AmenityService {
    db: Arc<DbPool>,
}

impl AmenityService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: AmenityFilter) -> Result<Vec<amenity::Model>, ServiceError> {
        let mut query = amenity::Entity::find().order_by_asc(amenity::Column::Name);
        if let Some(name) = filter.name.filter(|s| !s.is_empty()) {
            query = query.filter(contains_ignore_case(
                (amenity::Entity, amenity::Column::Name),
                &name,
            ));
        }
        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<amenity::Model, ServiceError> {
        amenity::Entity::find_by_id(id.to_owned())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Amenity", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: AmenityRequest) -> Result<amenity::Model, ServiceError> {
        require_fields(&[("name", has_text(&input.name))])?;

        let now = Utc::now();
        let model = amenity::ActiveModel {
            id: Set(super::new_id()),
            name: Set(input.name.unwrap_or_default().trim().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(amenity_id = %model.id, "amenity created");
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: &str,
        input: AmenityRequest,
    ) -> Result<amenity::Model, ServiceError> {
        let Some(name) = input.name else {
            return Err(ServiceError::bad_request("No valid fields provided for update."));
        };
        if name.trim().is_empty() {
            return Err(ServiceError::invalid("name", "Amenity name cannot be blank"));
        }

        let mut active = self.get(id).await?.into_active_model();
        active.name = Set(name.trim().to_string());
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(amenity_id = %updated.id, "amenity updated");
        Ok(updated)
    }

    /// Removes the amenity and unlinks it from every property.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<amenity::Model, ServiceError> {
        let existing = self.get(id).await?;
        let result = amenity::Entity::delete_by_id(id.to_owned())
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Amenity", id));
        }
        info!(amenity_id = %id, "amenity deleted");
        Ok(existing)
    }
}
