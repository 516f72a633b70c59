use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join table linking properties and amenities.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property_amenities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub property_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub amenity_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
    #[sea_orm(
        belongs_to = "super::amenity::Entity",
        from = "Column::AmenityId",
        to = "super::amenity::Column::Id",
        on_delete = "Cascade"
    )]
    Amenity,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::amenity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Amenity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
