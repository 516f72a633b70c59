use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rentable listing. Belongs to one host, links to many amenities.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "properties")]
#[serde(rename_all = "camelCase")]
#[schema(as = Property)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub location: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price_per_night: Decimal,
    pub bedroom_count: i32,
    #[serde(rename = "bathRoomCount")]
    pub bathroom_count: i32,
    pub max_guest_count: i32,
    #[sea_orm(nullable)]
    pub rating: Option<i32>,
    pub host_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::host::Entity",
        from = "Column::HostId",
        to = "super::host::Column::Id",
        on_delete = "Cascade"
    )]
    Host,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::property_amenity::Entity")]
    PropertyAmenities,
}

impl Related<super::host::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Host.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::property_amenity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PropertyAmenities.def()
    }
}

impl Related<super::amenity::Entity> for Entity {
    fn to() -> RelationDef {
        super::property_amenity::Relation::Amenity.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::property_amenity::Relation::Property.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
