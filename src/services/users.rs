use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, LoaderTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{booking, review, user, UserRole},
    errors::ServiceError,
    validation::{
        ensure_patch_not_empty, has_text, require_fields, AccountInput, ValidationPolicy,
        PHONE_RE,
    },
};

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
    pub username: Option<String>,
    pub password: Option<String>,
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(regex(path = "PHONE_RE", message = "Phone number must be a valid phone number"))]
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Option<UserRole>,
}

/// Fields a user update may change. Anything else in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
    pub username: Option<String>,
    pub password: Option<String>,
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(regex(path = "PHONE_RE", message = "Phone number must be a valid phone number"))]
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Option<UserRole>,
}

impl AccountInput for CreateUserRequest {
    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
    fn profile_picture(&self) -> Option<&str> {
        self.profile_picture.as_deref()
    }
}

impl AccountInput for UpdateUserRequest {
    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
    fn profile_picture(&self) -> Option<&str> {
        self.profile_picture.as_deref()
    }
}

impl UpdateUserRequest {
    fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.profile_picture.is_none()
            && self.role.is_none()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    /// Exact username
    pub username: Option<String>,
    /// Exact email address
    pub email: Option<String>,
}

/// A user together with their bookings and reviews
#[derive(Debug, Serialize, ToSchema)]
pub struct UserWithRelations {
    #[serde(flatten)]
    pub user: user::Model,
    pub bookings: Vec<booking::Model>,
    pub reviews: Vec<review::Model>,
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    policy: ValidationPolicy,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, policy: ValidationPolicy) -> Self {
        Self { db, policy }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: UserFilter) -> Result<Vec<UserWithRelations>, ServiceError> {
        let mut query = user::Entity::find().order_by_asc(user::Column::CreatedAt);
        if let Some(username) = filter.username {
            query = query.filter(user::Column::Username.eq(username));
        }
        if let Some(email) = filter.email {
            query = query.filter(user::Column::Email.eq(email));
        }

        let users = query.all(&*self.db).await?;
        self.with_relations(users).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<UserWithRelations, ServiceError> {
        let user = self.find_model(id).await?;
        let mut loaded = self.with_relations(vec![user]).await?;
        loaded
            .pop()
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    /// Lookup used by login
    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateUserRequest) -> Result<user::Model, ServiceError> {
        require_fields(&[
            ("username", has_text(&input.username)),
            ("password", has_text(&input.password)),
            ("email", has_text(&input.email)),
            ("name", has_text(&input.name)),
            ("phoneNumber", has_text(&input.phone_number)),
        ])?;
        self.policy.validate_account(&input, true)?;

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(super::new_id()),
            username: Set(input.username.unwrap_or_default()),
            password: Set(input.password.unwrap_or_default()),
            name: Set(input.name.unwrap_or_default()),
            email: Set(input.email.unwrap_or_default()),
            phone_number: Set(input.phone_number.unwrap_or_default()),
            profile_picture: Set(input.profile_picture),
            role: Set(input.role.unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = %model.id, "user created");
        Ok(model)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: &str,
        patch: UpdateUserRequest,
    ) -> Result<user::Model, ServiceError> {
        ensure_patch_not_empty(!patch.is_empty())?;
        self.policy.validate_account(&patch, false)?;

        let mut active = self.find_model(id).await?.into_active_model();
        if let Some(username) = patch.username {
            active.username = Set(username);
        }
        if let Some(password) = patch.password {
            active.password = Set(password);
        }
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(phone_number) = patch.phone_number {
            active.phone_number = Set(phone_number);
        }
        if let Some(profile_picture) = patch.profile_picture {
            active.profile_picture = Set(Some(profile_picture));
        }
        if let Some(role) = patch.role {
            active.role = Set(role);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(user_id = %updated.id, "user updated");
        Ok(updated)
    }

    /// Removes the user and, through the store's cascade, their bookings and reviews.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<user::Model, ServiceError> {
        let existing = self.find_model(id).await?;
        let result = user::Entity::delete_by_id(id.to_owned())
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("User", id));
        }
        info!(user_id = %id, "user deleted");
        Ok(existing)
    }

    async fn find_model(&self, id: &str) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id.to_owned())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    async fn with_relations(
        &self,
        users: Vec<user::Model>,
    ) -> Result<Vec<UserWithRelations>, ServiceError> {
        let bookings = users.load_many(booking::Entity, &*self.db).await?;
        let reviews = users.load_many(review::Entity, &*self.db).await?;

        Ok(users
            .into_iter()
            .zip(bookings)
            .zip(reviews)
            .map(|((user, bookings), reviews)| UserWithRelations {
                user,
                bookings,
                reviews,
            })
            .collect())
    }
}
