use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link row between a product type and one of its attributes
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_type_attributes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_type_id: i32,
    pub product_attribute_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_type::Entity",
        from = "Column::ProductTypeId",
        to = "super::product_type::Column::Id"
    )]
    ProductType,
    #[sea_orm(
        belongs_to = "super::product_attribute::Entity",
        from = "Column::ProductAttributeId",
        to = "super::product_attribute::Column::Id"
    )]
    ProductAttribute,
}

impl Related<super::product_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductType.def()
    }
}

impl Related<super::product_attribute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductAttribute.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
