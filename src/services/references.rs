//! Existence checks for foreign keys, run before a dependent row is
//! created or re-linked. A missing *referenced* row is a client error (400);
//! a missing *target* row is reported by the owning service as 404.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use std::collections::HashSet;
use tracing::debug;

use crate::entities::{amenity, host, property, user};
use crate::errors::ServiceError;

pub async fn ensure_user_exists<C: ConnectionTrait>(
    db: &C,
    field: &str,
    id: &str,
) -> Result<(), ServiceError> {
    if user::Entity::find_by_id(id.to_owned()).one(db).await?.is_none() {
        debug!(user_id = id, "referenced user missing");
        return Err(ServiceError::invalid(
            field,
            format!("User with id {} does not exist", id),
        ));
    }
    Ok(())
}

pub async fn ensure_host_exists<C: ConnectionTrait>(
    db: &C,
    field: &str,
    id: &str,
) -> Result<(), ServiceError> {
    if host::Entity::find_by_id(id.to_owned()).one(db).await?.is_none() {
        debug!(host_id = id, "referenced host missing");
        return Err(ServiceError::invalid(
            field,
            format!("Host with id {} does not exist", id),
        ));
    }
    Ok(())
}

pub async fn ensure_property_exists<C: ConnectionTrait>(
    db: &C,
    field: &str,
    id: &str,
) -> Result<(), ServiceError> {
    if property::Entity::find_by_id(id.to_owned())
        .one(db)
        .await?
        .is_none()
    {
        debug!(property_id = id, "referenced property missing");
        return Err(ServiceError::invalid(
            field,
            format!("Property with id {} does not exist", id),
        ));
    }
    Ok(())
}

/// Every id must resolve to an amenity; the error lists all that don't.
pub async fn ensure_amenities_exist<C: ConnectionTrait>(
    db: &C,
    field: &str,
    ids: &[String],
) -> Result<(), ServiceError> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: HashSet<String> = amenity::Entity::find()
        .select_only()
        .column(amenity::Column::Id)
        .filter(amenity::Column::Id.is_in(ids.iter().cloned()))
        .into_tuple::<String>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let mut reported = HashSet::new();
    let missing: Vec<&str> = ids
        .iter()
        .map(String::as_str)
        .filter(|id| !found.contains(*id) && reported.insert(*id))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::invalid(
            field,
            format!("Amenity ids do not exist: {}", missing.join(", ")),
        ))
    }
}
