use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, LoaderTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use super::references::{ensure_property_exists, ensure_user_exists};
use crate::{
    db::DbPool,
    entities::{property, review, user},
    errors::ServiceError,
    validation::{ensure_patch_not_empty, has_text, require_fields},
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub user_id: Option<String>,
    pub property_id: Option<String>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// Only the rating and comment of a review can change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewFilter {
    pub user_id: Option<String>,
    pub property_id: Option<String>,
    pub rating: Option<i32>,
}

/// A review with its author and the reviewed property
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewWithRelations {
    #[serde(flatten)]
    pub review: review::Model,
    pub user: Option<user::Model>,
    pub property: Option<property::Model>,
}

pub fn validate_rating(rating: i32) -> Result<(), ServiceError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ServiceError::invalid(
            "rating",
            format!("Rating must be between {} and {}", MIN_RATING, MAX_RATING),
        ))
    }
}

#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DbPool>,
}

impl ReviewService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: ReviewFilter) -> Result<Vec<ReviewWithRelations>, ServiceError> {
        let mut query = review::Entity::find().order_by_asc(review::Column::CreatedAt);
        if let Some(user_id) = filter.user_id {
            query = query.filter(review::Column::UserId.eq(user_id));
        }
        if let Some(property_id) = filter.property_id {
            query = query.filter(review::Column::PropertyId.eq(property_id));
        }
        if let Some(rating) = filter.rating {
            query = query.filter(review::Column::Rating.eq(rating));
        }

        let reviews = query.all(&*self.db).await?;
        self.with_relations(reviews).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<ReviewWithRelations, ServiceError> {
        let review = self.find_model(id).await?;
        let mut loaded = self.with_relations(vec![review]).await?;
        loaded
            .pop()
            .ok_or_else(|| ServiceError::not_found("Review", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateReviewRequest) -> Result<review::Model, ServiceError> {
        require_fields(&[
            ("userId", has_text(&input.user_id)),
            ("propertyId", has_text(&input.property_id)),
            ("rating", input.rating.is_some()),
        ])?;
        let rating = input.rating.unwrap_or_default();
        validate_rating(rating)?;

        let user_id = input.user_id.unwrap_or_default();
        let property_id = input.property_id.unwrap_or_default();
        ensure_user_exists(&*self.db, "userId", &user_id).await?;
        ensure_property_exists(&*self.db, "propertyId", &property_id).await?;

        let now = Utc::now();
        let model = review::ActiveModel {
            id: Set(super::new_id()),
            user_id: Set(user_id),
            property_id: Set(property_id),
            rating: Set(rating),
            comment: Set(input.comment),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(review_id = %model.id, property_id = %model.property_id, "review created");
        Ok(model)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: &str,
        patch: UpdateReviewRequest,
    ) -> Result<review::Model, ServiceError> {
        ensure_patch_not_empty(patch.rating.is_some() || patch.comment.is_some())?;
        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
        }

        let mut active = self.find_model(id).await?.into_active_model();
        if let Some(rating) = patch.rating {
            active.rating = Set(rating);
        }
        if let Some(comment) = patch.comment {
            active.comment = Set(Some(comment));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(review_id = %updated.id, "review updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<review::Model, ServiceError> {
        let existing = self.find_model(id).await?;
        let result = review::Entity::delete_by_id(id.to_owned())
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Review", id));
        }
        info!(review_id = %id, "review deleted");
        Ok(existing)
    }

    async fn find_model(&self, id: &str) -> Result<review::Model, ServiceError> {
        review::Entity::find_by_id(id.to_owned())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review", id))
    }

    async fn with_relations(
        &self,
        reviews: Vec<review::Model>,
    ) -> Result<Vec<ReviewWithRelations>, ServiceError> {
        let users = reviews.load_one(user::Entity, &*self.db).await?;
        let properties = reviews.load_one(property::Entity, &*self.db).await?;

        Ok(reviews
            .into_iter()
            .zip(users)
            .zip(properties)
            .map(|((review, user), property)| ReviewWithRelations {
                review,
                user,
                property,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn rating_accepted_only_within_bounds(rating in -100i32..100) {
            let accepted = validate_rating(rating).is_ok();
            prop_assert_eq!(accepted, (1..=5).contains(&rating));
        }
    }

    #[test]
    fn rating_error_names_the_field() {
        let err = validate_rating(0).unwrap_err();
        assert_eq!(err.to_string(), "Rating must be between 1 and 5");
        assert_eq!(err.fields(), ["rating".to_string()]);
    }
}
