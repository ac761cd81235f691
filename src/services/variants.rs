use crate::{
    entities::{product_variant, Product, ProductVariant, ProductVariantModel},
    errors::ServiceError,
    events::{CatalogEntity, CatalogEvent, EventSender},
    forms::VariantForm,
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct VariantService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl VariantService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<ProductVariantModel, ServiceError> {
        ProductVariant::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Variant", id))
    }

    /// Creates or updates a variant of `product_id` with SKU `{product_id}-{sku_id}`.
    ///
    /// A SKU already held by another variant is a `Conflict`.
    #[instrument(skip(self, form))]
    pub async fn save(
        &self,
        id: Option<i32>,
        product_id: i32,
        form: &VariantForm,
    ) -> Result<ProductVariantModel, ServiceError> {
        let db = &*self.db;
        Product::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let sku = form
            .sku_for(product_id)
            .ok_or_else(|| ServiceError::ValidationError("SKU number is required".into()))?;

        let mut duplicate = ProductVariant::find().filter(product_variant::Column::Sku.eq(sku.as_str()));
        if let Some(id) = id {
            duplicate = duplicate.filter(product_variant::Column::Id.ne(id));
        }
        if duplicate.one(db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("SKU {sku} is already in use")));
        }

        let now = Utc::now();
        let mut active: product_variant::ActiveModel = match id {
            Some(id) => self.get(id).await?.into(),
            None => product_variant::ActiveModel {
                created_at: Set(now),
                ..Default::default()
            },
        };
        active.sku = Set(sku);
        active.title = Set(form.title.clone());
        active.price_override = Set(form.price_override);
        active.quantity = Set(form.quantity);
        active.quantity_allocated = Set(form.quantity_allocated);
        active.product_id = Set(product_id);
        active.updated_at = Set(now);

        let variant = match id {
            Some(_) => active.update(db).await?,
            None => active.insert(db).await?,
        };

        counter!("catalog_records.saved", 1, "entity" => "variant");
        self.event_sender
            .send_or_log(CatalogEvent::saved(
                CatalogEntity::Variant,
                variant.id,
                id.is_none(),
            ))
            .await;
        info!("Saved variant {} ({})", variant.id, variant.sku);
        Ok(variant)
    }

    /// Deletes a variant and returns the product it belonged to.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<i32, ServiceError> {
        let variant = self.get(id).await?;
        ProductVariant::delete_by_id(id).exec(&*self.db).await?;

        counter!("catalog_records.deleted", 1, "entity" => "variant");
        self.event_sender
            .send_or_log(CatalogEvent::deleted(CatalogEntity::Variant, id))
            .await;
        info!("Deleted variant: {}", id);
        Ok(variant.product_id)
    }
}
