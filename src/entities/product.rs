use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog product as edited from the dashboard
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Base price before any variant override
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub basic_price: Decimal,

    pub on_sale: bool,

    pub is_featured: bool,

    /// Average review rating, 0 to 5
    pub rating: f64,

    pub sold_count: i32,

    pub review_count: i32,

    pub category_id: Option<i32>,

    pub product_type_id: i32,

    /// Attribute id -> chosen value id, both as strings
    #[sea_orm(column_type = "Json")]
    pub attributes: Json,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::product_type::Entity",
        from = "Column::ProductTypeId",
        to = "super::product_type::Column::Id"
    )]
    ProductType,
    #[sea_orm(has_many = "super::product_image::Entity")]
    ProductImages,
    #[sea_orm(has_many = "super::product_variant::Entity")]
    ProductVariants,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductType.def()
    }
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductImages.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Display form of the on-sale flag used by list pages.
    pub fn on_sale_human(&self) -> &'static str {
        if self.on_sale {
            "Y"
        } else {
            "N"
        }
    }

    pub fn price_human(&self) -> String {
        format!("$ {}", self.basic_price.round_dp(2))
    }

    /// Decodes the stored attribute map. Entries that are not integer pairs are skipped.
    pub fn attribute_map(&self) -> BTreeMap<i32, i32> {
        decode_attribute_map(&self.attributes)
    }
}

/// Encodes attribute id -> value id pairs the way they are stored on a product.
pub fn encode_attribute_map(map: &BTreeMap<i32, i32>) -> Json {
    let object: serde_json::Map<String, Json> = map
        .iter()
        .map(|(attr, value)| (attr.to_string(), Json::String(value.to_string())))
        .collect();
    Json::Object(object)
}

pub fn decode_attribute_map(value: &Json) -> BTreeMap<i32, i32> {
    let Some(object) = value.as_object() else {
        return BTreeMap::new();
    };
    object
        .iter()
        .filter_map(|(attr, value)| {
            let attr = attr.parse::<i32>().ok()?;
            let value = match value {
                Json::String(s) => s.parse::<i32>().ok()?,
                Json::Number(n) => i32::try_from(n.as_i64()?).ok()?,
                _ => return None,
            };
            Some((attr, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_map_survives_storage_encoding() {
        let mut map = BTreeMap::new();
        map.insert(3, 12);
        map.insert(1, 7);
        let stored = encode_attribute_map(&map);
        assert_eq!(stored, serde_json::json!({"1": "7", "3": "12"}));
        assert_eq!(decode_attribute_map(&stored), map);
    }

    #[test]
    fn malformed_attribute_entries_are_ignored() {
        let stored = serde_json::json!({"1": "x", "two": "3", "4": 5, "6": null});
        let decoded = decode_attribute_map(&stored);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get(&4), Some(&5));
        assert!(decode_attribute_map(&serde_json::json!([])).is_empty());
    }
}
