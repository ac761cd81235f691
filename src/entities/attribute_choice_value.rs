use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One allowed value of a product attribute (e.g. "Red" for "Color")
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attribute_choice_values")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub attribute_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_attribute::Entity",
        from = "Column::AttributeId",
        to = "super::product_attribute::Column::Id"
    )]
    Attribute,
}

impl Related<super::product_attribute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attribute.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
