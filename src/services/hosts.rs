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

use super::contains_ignore_case;
use crate::{
    db::DbPool,
    entities::{host, property},
    errors::ServiceError,
    validation::{
        ensure_patch_not_empty, has_text, require_fields, AccountInput, ValidationPolicy,
        PHONE_RE,
    },
};

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHostRequest {
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
    pub about_me: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHostRequest {
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
    pub about_me: Option<String>,
}

impl AccountInput for CreateHostRequest {
    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
    fn profile_picture(&self) -> Option<&str> {
        self.profile_picture.as_deref()
    }
}

impl AccountInput for UpdateHostRequest {
    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
    fn profile_picture(&self) -> Option<&str> {
        self.profile_picture.as_deref()
    }
}

impl UpdateHostRequest {
    fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.profile_picture.is_none()
            && self.about_me.is_none()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HostFilter {
    /// Case-insensitive substring of the host's name
    pub name: Option<String>,
    /// Case-insensitive substring of the host's email
    pub email: Option<String>,
}

/// A host and the properties they list
#[derive(Debug, Serialize, ToSchema)]
pub struct HostWithListings {
    #[serde(flatten)]
    pub host: host::Model,
    pub listings: Vec<property::Model>,
}

#[derive(Clone)]
pub struct HostService {
    db: Arc<DbPool>,
    policy: ValidationPolicy,
}

impl HostService {
    pub fn new(db: Arc<DbPool>, policy: ValidationPolicy) -> Self {
        Self { db, policy }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: HostFilter) -> Result<Vec<HostWithListings>, ServiceError> {
        let mut query = host::Entity::find().order_by_asc(host::Column::CreatedAt);
        if let Some(name) = filter.name.filter(|s| !s.is_empty()) {
            query = query.filter(contains_ignore_case((host::Entity, host::Column::Name), &name));
        }
        if let Some(email) = filter.email.filter(|s| !s.is_empty()) {
            query = query.filter(contains_ignore_case((host::Entity, host::Column::Email), &email));
        }

        let hosts = query.all(&*self.db).await?;
        let listings = hosts.load_many(property::Entity, &*self.db).await?;
        Ok(hosts
            .into_iter()
            .zip(listings)
            .map(|(host, listings)| HostWithListings { host, listings })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<HostWithListings, ServiceError> {
        let host = self.find_model(id).await?;
        let listings = property::Entity::find()
            .filter(property::Column::HostId.eq(id))
            .order_by_asc(property::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(HostWithListings { host, listings })
    }

    /// Lookup used by login
    pub async fn find_by_username(&self, username: &str) -> Result<Option<host::Model>, ServiceError> {
        Ok(host::Entity::find()
            .filter(host::Column::Username.eq(username))
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateHostRequest) -> Result<host::Model, ServiceError> {
        require_fields(&[
            ("username", has_text(&input.username)),
            ("password", has_text(&input.password)),
            ("email", has_text(&input.email)),
            ("name", has_text(&input.name)),
            ("phoneNumber", has_text(&input.phone_number)),
        ])?;
        self.policy.validate_account(&input, true)?;

        let now = Utc::now();
        let model = host::ActiveModel {
            id: Set(super::new_id()),
            username: Set(input.username.unwrap_or_default()),
            password: Set(input.password.unwrap_or_default()),
            name: Set(input.name.unwrap_or_default()),
            email: Set(input.email.unwrap_or_default()),
            phone_number: Set(input.phone_number.unwrap_or_default()),
            profile_picture: Set(input.profile_picture),
            about_me: Set(input.about_me),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(host_id = %model.id, "host created");
        Ok(model)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: &str,
        patch: UpdateHostRequest,
    ) -> Result<host::Model, ServiceError> {
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
        if let Some(about_me) = patch.about_me {
            active.about_me = Set(Some(about_me));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(host_id = %updated.id, "host updated");
        Ok(updated)
    }

    /// Removes the host; their properties and everything hanging off them cascade.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<host::Model, ServiceError> {
        let existing = self.find_model(id).await?;
        let result = host::Entity::delete_by_id(id.to_owned())
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Host", id));
        }
        info!(host_id = %id, "host deleted");
        Ok(existing)
    }

    async fn find_model(&self, id: &str) -> Result<host::Model, ServiceError> {
        host::Entity::find_by_id(id.to_owned())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Host", id))
    }
}
