use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_attributes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attribute_choice_value::Entity")]
    Values,
    #[sea_orm(has_many = "super::product_type_attribute::Entity")]
    ProductTypeAttributes,
}

impl Related<super::attribute_choice_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Values.def()
    }
}

impl Related<super::product_type_attribute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductTypeAttributes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
