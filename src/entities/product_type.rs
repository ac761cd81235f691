use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub has_variants: bool,
    pub is_shipping_required: bool,

    /// Attribute that distinguishes the variants of products of this type
    pub variant_attr_id: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::product_type_attribute::Entity")]
    ProductTypeAttributes,
    #[sea_orm(
        belongs_to = "super::product_attribute::Entity",
        from = "Column::VariantAttrId",
        to = "super::product_attribute::Column::Id"
    )]
    VariantAttribute,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::product_type_attribute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductTypeAttributes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
