use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "amenities")]
#[serde(rename_all = "camelCase")]
#[schema(as = Amenity)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::property_amenity::Entity")]
    PropertyAmenities,
}

impl Related<super::property_amenity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PropertyAmenities.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        super::property_amenity::Relation::Property.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::property_amenity::Relation::Amenity.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
