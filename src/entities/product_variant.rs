use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchasable variation of a product
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// `{product_id}-{suffix}`, unique across variants
    #[sea_orm(unique)]
    pub sku: String,
    pub title: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub price_override: Decimal,
    pub quantity: i32,
    pub quantity_allocated: i32,
    pub product_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Builds the SKU stored for a variant.
pub fn derive_sku(product_id: i32, suffix: i32) -> String {
    format!("{product_id}-{suffix}")
}

impl Model {
    /// Suffix part of the SKU, if the SKU follows the `{product_id}-{suffix}` layout.
    pub fn sku_suffix(&self) -> Option<i32> {
        self.sku
            .rsplit_once('-')
            .and_then(|(_, suffix)| suffix.parse().ok())
    }

    pub fn quantity_available(&self) -> i32 {
        (self.quantity - self.quantity_allocated).max(0)
    }
}
