use crate::{
    entities::{
        attribute_choice_value, category, collection, product, product_attribute,
        product_collection, product_image, product_variant, AttributeChoiceValue, Category,
        CategoryModel, Collection, CollectionModel, Product, ProductAttribute, ProductCollection,
        ProductImage, ProductImageModel, ProductModel, ProductType, ProductTypeModel,
        ProductVariant, ProductVariantModel,
    },
    errors::ServiceError,
    events::{CatalogEntity, CatalogEvent, EventSender},
    forms::{ProductForm, SelectOption, UploadedFile},
    pagination::{paginate, Page},
    uploads::ImageStore,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Select, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Filters accepted by the product list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Matches `on_sale` against `sale != 0`
    pub sale: Option<i32>,
    pub category: Option<i32>,
    pub title: Option<String>,
    /// Inclusive lower bound on `created_at`
    pub created_at: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub ended_at: Option<DateTime<Utc>>,
}

impl ProductFilter {
    /// Builds the filter from raw query parameters, ignoring values that do not parse.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let int = |key: &str| params.get(key).and_then(|v| v.trim().parse::<i32>().ok());
        let text = |key: &str| {
            params
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            sale: int("sale"),
            category: int("category").filter(|c| *c != 0),
            title: text("title"),
            created_at: text("created_at").and_then(|v| parse_filter_datetime(&v)),
            ended_at: text("ended_at").and_then(|v| parse_filter_datetime(&v)),
        }
    }

    pub fn apply(&self, mut select: Select<Product>) -> Select<Product> {
        if let Some(sale) = self.sale {
            select = select.filter(product::Column::OnSale.eq(sale != 0));
        }
        if let Some(category) = self.category {
            select = select.filter(product::Column::CategoryId.eq(category));
        }
        if let Some(title) = &self.title {
            select = select.filter(product::Column::Title.contains(title.as_str()));
        }
        if let Some(created_at) = self.created_at {
            select = select.filter(product::Column::CreatedAt.gte(created_at));
        }
        if let Some(ended_at) = self.ended_at {
            select = select.filter(product::Column::CreatedAt.lte(ended_at));
        }
        select
    }
}

/// Parses `YYYY-MM-DD` (midnight), `YYYY-MM-DD HH:MM[:SS]` or RFC 3339, all taken as UTC.
pub fn parse_filter_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone)]
pub struct ProductRow {
    pub product: ProductModel,
    pub category_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLabel {
    pub attribute: String,
    pub value: String,
}

/// Everything the product detail page shows.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub category: Option<CategoryModel>,
    pub product_type: Option<ProductTypeModel>,
    pub images: Vec<ProductImageModel>,
    pub variants: Vec<ProductVariantModel>,
    pub collections: Vec<CollectionModel>,
    pub attributes: Vec<AttributeLabel>,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    images: ImageStore,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>, images: ImageStore) -> Self {
        Self {
            db,
            event_sender,
            images,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: i64,
        per_page: u64,
    ) -> Result<Page<ProductRow>, ServiceError> {
        let db = &*self.db;
        let select = filter.apply(Product::find()).order_by_asc(product::Column::Id);
        let page = paginate(db, select, page, per_page).await?;

        let category_ids: Vec<i32> = page.items.iter().filter_map(|p| p.category_id).collect();
        let categories: HashMap<i32, String> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            Category::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.title))
                .collect()
        };

        Ok(page.map(|product| ProductRow {
            category_title: product
                .category_id
                .and_then(|id| categories.get(&id).cloned())
                .unwrap_or_default(),
            product,
        }))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<ProductModel, ServiceError> {
        find_product(&*self.db, id).await
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: i32) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db;
        let product = find_product(db, id).await?;

        let category = match product.category_id {
            Some(category_id) => Category::find_by_id(category_id).one(db).await?,
            None => None,
        };
        let product_type = ProductType::find_by_id(product.product_type_id)
            .one(db)
            .await?;
        let images = self.images(id).await?;
        let variants = ProductVariant::find()
            .filter(product_variant::Column::ProductId.eq(id))
            .order_by_asc(product_variant::Column::Id)
            .all(db)
            .await?;

        let collection_ids: Vec<i32> = ProductCollection::find()
            .filter(product_collection::Column::ProductId.eq(id))
            .all(db)
            .await?
            .into_iter()
            .map(|link| link.collection_id)
            .collect();
        let collections = if collection_ids.is_empty() {
            Vec::new()
        } else {
            Collection::find()
                .filter(collection::Column::Id.is_in(collection_ids))
                .order_by_asc(collection::Column::Id)
                .all(db)
                .await?
        };

        let attributes = self.attribute_labels(&product).await?;

        Ok(ProductDetail {
            product,
            category,
            product_type,
            images,
            variants,
            collections,
            attributes,
        })
    }

    pub async fn images(&self, product_id: i32) -> Result<Vec<ProductImageModel>, ServiceError> {
        Ok(ProductImage::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Human-readable attribute/value pairs; entries whose rows are gone are skipped.
    async fn attribute_labels(&self, product: &ProductModel) -> Result<Vec<AttributeLabel>, ServiceError> {
        let map = product.attribute_map();
        if map.is_empty() {
            return Ok(Vec::new());
        }
        let db = &*self.db;

        let attributes: HashMap<i32, String> = ProductAttribute::find()
            .filter(product_attribute::Column::Id.is_in(map.keys().copied().collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|a| (a.id, a.title))
            .collect();
        let values: HashMap<i32, String> = AttributeChoiceValue::find()
            .filter(attribute_choice_value::Column::Id.is_in(map.values().copied().collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|v| (v.id, v.title))
            .collect();

        Ok(map
            .iter()
            .filter_map(|(attribute_id, value_id)| {
                Some(AttributeLabel {
                    attribute: attributes.get(attribute_id)?.clone(),
                    value: values.get(value_id)?.clone(),
                })
            })
            .collect())
    }

    /// Every product as a select option.
    pub async fn choices(&self) -> Result<Vec<SelectOption>, ServiceError> {
        Ok(Product::find()
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| SelectOption::new(p.id, p.title))
            .collect())
    }

    /// Creates a product of `product_type_id` from a validated form.
    #[instrument(skip(self, form), fields(title = %form.title))]
    pub async fn create(
        &self,
        product_type_id: i32,
        form: &ProductForm,
    ) -> Result<ProductModel, ServiceError> {
        ProductType::find_by_id(product_type_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product type", product_type_id))?;

        let now = Utc::now();
        let mut active = product::ActiveModel {
            product_type_id: Set(product_type_id),
            created_at: Set(now),
            ..Default::default()
        };
        populate(&mut active, form, now);
        let product = active.insert(&*self.db).await?;

        self.record_saved(product.id, true).await;
        Ok(product)
    }

    #[instrument(skip(self, form), fields(title = %form.title))]
    pub async fn update(&self, id: i32, form: &ProductForm) -> Result<ProductModel, ServiceError> {
        let mut active: product::ActiveModel = find_product(&*self.db, id).await?.into();
        populate(&mut active, form, Utc::now());
        let product = active.update(&*self.db).await?;

        self.record_saved(product.id, false).await;
        Ok(product)
    }

    /// Stores uploaded files as images of `product_id`; empty parts are skipped.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn add_images(
        &self,
        product_id: i32,
        files: &[&UploadedFile],
    ) -> Result<Vec<ProductImageModel>, ServiceError> {
        let mut stored = Vec::new();
        for file in files {
            let Some(path) = self.images.save(file).await? else {
                continue;
            };
            let image = product_image::ActiveModel {
                image: Set(path.clone()),
                product_id: Set(product_id),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&*self.db)
            .await?;
            self.event_sender
                .send_or_log(CatalogEvent::ImageStored { path })
                .await;
            stored.push(image);
        }
        if !stored.is_empty() {
            info!("Stored {} image(s) for product {}", stored.len(), product_id);
        }
        Ok(stored)
    }

    /// Deletes a product with its images, variants and collection links.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        find_product(&txn, id).await?;

        ProductImage::delete_many()
            .filter(product_image::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        ProductVariant::delete_many()
            .filter(product_variant::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        ProductCollection::delete_many()
            .filter(product_collection::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        Product::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        counter!("catalog_records.deleted", 1, "entity" => "product");
        self.event_sender
            .send_or_log(CatalogEvent::deleted(CatalogEntity::Product, id))
            .await;
        info!("Deleted product: {}", id);
        Ok(())
    }

    async fn record_saved(&self, id: i32, created: bool) {
        counter!("catalog_records.saved", 1, "entity" => "product");
        self.event_sender
            .send_or_log(CatalogEvent::saved(CatalogEntity::Product, id, created))
            .await;
        info!("Saved product: {}", id);
    }
}

fn populate(active: &mut product::ActiveModel, form: &ProductForm, now: DateTime<Utc>) {
    active.title = Set(form.title.clone());
    active.description = Set(form.description.clone());
    active.basic_price = Set(form.basic_price.unwrap_or(Decimal::ZERO));
    active.on_sale = Set(form.on_sale);
    active.is_featured = Set(form.is_featured);
    active.rating = Set(form.rating);
    active.sold_count = Set(form.sold_count);
    active.review_count = Set(form.review_count);
    active.category_id = Set(form.category());
    active.attributes = Set(product::encode_attribute_map(&form.attributes));
    active.updated_at = Set(now);
}

async fn find_product<C: ConnectionTrait>(db: &C, id: i32) -> Result<ProductModel, ServiceError> {
    Product::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("2024-03-05", Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())]
    #[case("2024-03-05 14:30", Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap())]
    #[case("2024-03-05T14:30:15", Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 15).unwrap())]
    #[case("2024-03-05T14:30:15+02:00", Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 15).unwrap())]
    fn filter_dates_parse(#[case] raw: &str, #[case] expected: DateTime<Utc>) {
        assert_eq!(parse_filter_datetime(raw), Some(expected));
    }

    #[test]
    fn garbage_dates_are_ignored() {
        assert_eq!(parse_filter_datetime("yesterday"), None);
        assert_eq!(parse_filter_datetime("2024-13-40"), None);
    }

    #[test]
    fn filter_from_query() {
        let params: HashMap<String, String> = [
            ("sale", "0"),
            ("category", "0"),
            ("title", "  shoe "),
            ("created_at", "2024-01-01"),
            ("ended_at", "nope"),
            ("page", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let filter = ProductFilter::from_query(&params);
        assert_eq!(filter.sale, Some(0));
        assert_eq!(filter.category, None);
        assert_eq!(filter.title.as_deref(), Some("shoe"));
        assert_eq!(
            filter.created_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(filter.ended_at, None);
    }

    #[test]
    fn non_numeric_sale_is_ignored() {
        let params: HashMap<String, String> =
            [("sale".to_string(), "yes".to_string())].into_iter().collect();
        assert_eq!(ProductFilter::from_query(&params), ProductFilter::default());
    }
}
