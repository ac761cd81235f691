use crate::{
    entities::{
        attribute_choice_value, product, product_attribute, product_type, product_type_attribute,
        AttributeChoiceValue, Product, ProductAttribute, ProductType, ProductTypeAttribute,
        ProductTypeModel,
    },
    errors::ServiceError,
    events::{CatalogEntity, CatalogEvent, EventSender},
    forms::{AttributeField, ProductTypeForm, SelectOption},
    pagination::{paginate, Page},
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct ProductTypeService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductTypeService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: i64, per_page: u64) -> Result<Page<ProductTypeModel>, ServiceError> {
        paginate(
            &*self.db,
            ProductType::find().order_by_asc(product_type::Column::Id),
            page,
            per_page,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<ProductTypeModel, ServiceError> {
        find_product_type(&*self.db, id).await
    }

    pub async fn attribute_ids(&self, id: i32) -> Result<Vec<i32>, ServiceError> {
        Ok(ProductTypeAttribute::find()
            .filter(product_type_attribute::Column::ProductTypeId.eq(id))
            .order_by_asc(product_type_attribute::Column::ProductAttributeId)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|link| link.product_attribute_id)
            .collect())
    }

    pub async fn choices(&self) -> Result<Vec<SelectOption>, ServiceError> {
        Ok(ProductType::find()
            .order_by_asc(product_type::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|t| SelectOption::new(t.id, t.title))
            .collect())
    }

    /// One select per attribute of the type, offering that attribute's values.
    #[instrument(skip(self))]
    pub async fn attribute_fields(&self, id: i32) -> Result<Vec<AttributeField>, ServiceError> {
        let db = &*self.db;
        let attribute_ids = self.attribute_ids(id).await?;
        if attribute_ids.is_empty() {
            return Ok(Vec::new());
        }

        let attributes = ProductAttribute::find()
            .filter(product_attribute::Column::Id.is_in(attribute_ids.clone()))
            .order_by_asc(product_attribute::Column::Id)
            .all(db)
            .await?;
        let values = AttributeChoiceValue::find()
            .filter(attribute_choice_value::Column::AttributeId.is_in(attribute_ids))
            .order_by_asc(attribute_choice_value::Column::Id)
            .all(db)
            .await?;

        Ok(attributes
            .into_iter()
            .map(|attribute| AttributeField {
                attribute_id: attribute.id,
                label: attribute.title,
                options: values
                    .iter()
                    .filter(|v| v.attribute_id == attribute.id)
                    .map(|v| SelectOption::new(v.id, v.title.clone()))
                    .collect(),
            })
            .collect())
    }

    #[instrument(skip(self, form), fields(title = %form.title))]
    pub async fn save(
        &self,
        id: Option<i32>,
        form: &ProductTypeForm,
    ) -> Result<ProductTypeModel, ServiceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let mut active: product_type::ActiveModel = match id {
            Some(id) => find_product_type(&txn, id).await?.into(),
            None => product_type::ActiveModel {
                created_at: Set(now),
                ..Default::default()
            },
        };
        active.title = Set(form.title.clone());
        active.has_variants = Set(form.has_variants);
        active.is_shipping_required = Set(form.is_shipping_required);
        active.variant_attr_id = Set(form.variant_attr());
        active.updated_at = Set(now);

        let product_type = match id {
            Some(_) => active.update(&txn).await?,
            None => active.insert(&txn).await?,
        };

        let existing: Vec<i32> = ProductTypeAttribute::find()
            .filter(product_type_attribute::Column::ProductTypeId.eq(product_type.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|link| link.product_attribute_id)
            .collect();
        ProductTypeAttribute::delete_many()
            .filter(product_type_attribute::Column::ProductTypeId.eq(product_type.id))
            .filter(
                product_type_attribute::Column::ProductAttributeId
                    .is_not_in(form.product_attributes.clone()),
            )
            .exec(&txn)
            .await?;
        let fresh: Vec<product_type_attribute::ActiveModel> = form
            .product_attributes
            .iter()
            .filter(|id| !existing.contains(id))
            .map(|attribute_id| product_type_attribute::ActiveModel {
                product_type_id: Set(product_type.id),
                product_attribute_id: Set(*attribute_id),
                ..Default::default()
            })
            .collect();
        if !fresh.is_empty() {
            ProductTypeAttribute::insert_many(fresh)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        counter!("catalog_records.saved", 1, "entity" => "product_type");
        self.event_sender
            .send_or_log(CatalogEvent::saved(
                CatalogEntity::ProductType,
                product_type.id,
                id.is_none(),
            ))
            .await;
        info!("Saved product type: {}", product_type.id);
        Ok(product_type)
    }

    /// Deletes an unused product type. Types still referenced by products are a `Conflict`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let product_type = find_product_type(&txn, id).await?;

        let in_use = Product::find()
            .filter(product::Column::ProductTypeId.eq(id))
            .count(&txn)
            .await?;
        if in_use > 0 {
            warn!(product_type = id, products = in_use, "refusing to delete product type in use");
            return Err(ServiceError::Conflict(format!(
                "Product type '{}' is used by {} product(s)",
                product_type.title, in_use
            )));
        }

        ProductTypeAttribute::delete_many()
            .filter(product_type_attribute::Column::ProductTypeId.eq(id))
            .exec(&txn)
            .await?;
        ProductType::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        counter!("catalog_records.deleted", 1, "entity" => "product_type");
        self.event_sender
            .send_or_log(CatalogEvent::deleted(CatalogEntity::ProductType, id))
            .await;
        info!("Deleted product type: {}", id);
        Ok(())
    }
}

async fn find_product_type<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<ProductTypeModel, ServiceError> {
    ProductType::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product type", id))
}
