use crate::{
    entities::{
        attribute_choice_value, product_attribute, product_type, product_type_attribute,
        AttributeChoiceValue, AttributeChoiceValueModel, ProductAttribute, ProductAttributeModel,
        ProductType, ProductTypeAttribute,
    },
    errors::ServiceError,
    events::{CatalogEntity, CatalogEvent, EventSender},
    forms::{AttributeForm, SelectOption},
    pagination::{paginate, Page},
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Attribute list row with its value and product type titles joined for display.
#[derive(Debug, Clone)]
pub struct AttributeRow {
    pub attribute: ProductAttributeModel,
    pub values_label: String,
    pub types_label: String,
}

#[derive(Clone)]
pub struct AttributeService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl AttributeService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: i64, per_page: u64) -> Result<Page<AttributeRow>, ServiceError> {
        let db = &*self.db;
        let page = paginate(
            db,
            ProductAttribute::find().order_by_asc(product_attribute::Column::Id),
            page,
            per_page,
        )
        .await?;

        let ids: Vec<i32> = page.items.iter().map(|a| a.id).collect();
        let mut values: HashMap<i32, Vec<String>> = HashMap::new();
        let mut types: HashMap<i32, Vec<String>> = HashMap::new();

        if !ids.is_empty() {
            for value in AttributeChoiceValue::find()
                .filter(attribute_choice_value::Column::AttributeId.is_in(ids.clone()))
                .order_by_asc(attribute_choice_value::Column::Id)
                .all(db)
                .await?
            {
                values.entry(value.attribute_id).or_default().push(value.title);
            }

            let links = ProductTypeAttribute::find()
                .filter(product_type_attribute::Column::ProductAttributeId.is_in(ids))
                .order_by_asc(product_type_attribute::Column::ProductTypeId)
                .all(db)
                .await?;
            let type_titles: HashMap<i32, String> = ProductType::find()
                .filter(
                    product_type::Column::Id
                        .is_in(links.iter().map(|l| l.product_type_id).collect::<Vec<_>>()),
                )
                .all(db)
                .await?
                .into_iter()
                .map(|t| (t.id, t.title))
                .collect();
            for link in links {
                if let Some(title) = type_titles.get(&link.product_type_id) {
                    types
                        .entry(link.product_attribute_id)
                        .or_default()
                        .push(title.clone());
                }
            }
        }

        Ok(page.map(|attribute| AttributeRow {
            values_label: values.remove(&attribute.id).unwrap_or_default().join(", "),
            types_label: types.remove(&attribute.id).unwrap_or_default().join(", "),
            attribute,
        }))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<ProductAttributeModel, ServiceError> {
        find_attribute(&*self.db, id).await
    }

    pub async fn values(&self, id: i32) -> Result<Vec<AttributeChoiceValueModel>, ServiceError> {
        Ok(AttributeChoiceValue::find()
            .filter(attribute_choice_value::Column::AttributeId.eq(id))
            .order_by_asc(attribute_choice_value::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn product_type_ids(&self, id: i32) -> Result<Vec<i32>, ServiceError> {
        Ok(ProductTypeAttribute::find()
            .filter(product_type_attribute::Column::ProductAttributeId.eq(id))
            .order_by_asc(product_type_attribute::Column::ProductTypeId)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|link| link.product_type_id)
            .collect())
    }

    /// Every attribute as a select option.
    pub async fn choices(&self) -> Result<Vec<SelectOption>, ServiceError> {
        Ok(ProductAttribute::find()
            .order_by_asc(product_attribute::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|a| SelectOption::new(a.id, a.title))
            .collect())
    }

    /// Creates (`id == None`) or updates an attribute, syncing its values and type links.
    #[instrument(skip(self, form), fields(title = %form.title))]
    pub async fn save(
        &self,
        id: Option<i32>,
        form: &AttributeForm,
    ) -> Result<ProductAttributeModel, ServiceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let attribute = match id {
            Some(id) => {
                let mut active: product_attribute::ActiveModel =
                    find_attribute(&txn, id).await?.into();
                active.title = Set(form.title.clone());
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                product_attribute::ActiveModel {
                    title: Set(form.title.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        sync_values(&txn, attribute.id, &form.value_titles()).await?;
        sync_product_types(&txn, attribute.id, &form.product_types).await?;
        txn.commit().await?;

        counter!("catalog_records.saved", 1, "entity" => "attribute");
        self.event_sender
            .send_or_log(CatalogEvent::saved(
                CatalogEntity::Attribute,
                attribute.id,
                id.is_none(),
            ))
            .await;
        info!("Saved attribute: {}", attribute.id);
        Ok(attribute)
    }

    /// Deletes an attribute with its values and type links, and unsets it as a variant attribute.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        find_attribute(&txn, id).await?;

        AttributeChoiceValue::delete_many()
            .filter(attribute_choice_value::Column::AttributeId.eq(id))
            .exec(&txn)
            .await?;
        ProductTypeAttribute::delete_many()
            .filter(product_type_attribute::Column::ProductAttributeId.eq(id))
            .exec(&txn)
            .await?;
        ProductType::update_many()
            .col_expr(
                product_type::Column::VariantAttrId,
                Expr::value(Option::<i32>::None),
            )
            .filter(product_type::Column::VariantAttrId.eq(id))
            .exec(&txn)
            .await?;
        ProductAttribute::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        counter!("catalog_records.deleted", 1, "entity" => "attribute");
        self.event_sender
            .send_or_log(CatalogEvent::deleted(CatalogEntity::Attribute, id))
            .await;
        info!("Deleted attribute: {}", id);
        Ok(())
    }
}

async fn find_attribute<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<ProductAttributeModel, ServiceError> {
    ProductAttribute::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Attribute", id))
}

/// Makes the attribute's value set equal `titles`: stale values go, new ones are added.
async fn sync_values<C: ConnectionTrait>(
    db: &C,
    attribute_id: i32,
    titles: &[String],
) -> Result<(), ServiceError> {
    let existing = AttributeChoiceValue::find()
        .filter(attribute_choice_value::Column::AttributeId.eq(attribute_id))
        .all(db)
        .await?;

    let stale: Vec<i32> = existing
        .iter()
        .filter(|v| !titles.contains(&v.title))
        .map(|v| v.id)
        .collect();
    if !stale.is_empty() {
        AttributeChoiceValue::delete_many()
            .filter(attribute_choice_value::Column::Id.is_in(stale))
            .exec(db)
            .await?;
    }

    let fresh: Vec<attribute_choice_value::ActiveModel> = titles
        .iter()
        .filter(|t| !existing.iter().any(|v| &v.title == *t))
        .map(|title| attribute_choice_value::ActiveModel {
            title: Set(title.clone()),
            attribute_id: Set(attribute_id),
            ..Default::default()
        })
        .collect();
    if !fresh.is_empty() {
        AttributeChoiceValue::insert_many(fresh)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

async fn sync_product_types<C: ConnectionTrait>(
    db: &C,
    attribute_id: i32,
    product_type_ids: &[i32],
) -> Result<(), ServiceError> {
    let existing: Vec<i32> = ProductTypeAttribute::find()
        .filter(product_type_attribute::Column::ProductAttributeId.eq(attribute_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.product_type_id)
        .collect();

    ProductTypeAttribute::delete_many()
        .filter(product_type_attribute::Column::ProductAttributeId.eq(attribute_id))
        .filter(product_type_attribute::Column::ProductTypeId.is_not_in(product_type_ids.to_vec()))
        .exec(db)
        .await?;

    let fresh: Vec<product_type_attribute::ActiveModel> = product_type_ids
        .iter()
        .filter(|id| !existing.contains(id))
        .map(|id| product_type_attribute::ActiveModel {
            product_type_id: Set(*id),
            product_attribute_id: Set(attribute_id),
            ..Default::default()
        })
        .collect();
    if !fresh.is_empty() {
        ProductTypeAttribute::insert_many(fresh)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}
