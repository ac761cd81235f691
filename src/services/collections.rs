use crate::{
    entities::{collection, product_collection, Collection, CollectionModel, ProductCollection},
    errors::ServiceError,
    events::{CatalogEntity, CatalogEvent, EventSender},
    forms::{CollectionForm, UploadedFile},
    pagination::{paginate, Page},
    uploads::ImageStore,
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct CollectionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    images: ImageStore,
}

impl CollectionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>, images: ImageStore) -> Self {
        Self {
            db,
            event_sender,
            images,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: i64, per_page: u64) -> Result<Page<CollectionModel>, ServiceError> {
        paginate(
            &*self.db,
            Collection::find().order_by_asc(collection::Column::Id),
            page,
            per_page,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<CollectionModel, ServiceError> {
        find_collection(&*self.db, id).await
    }

    pub async fn product_ids(&self, id: i32) -> Result<Vec<i32>, ServiceError> {
        Ok(ProductCollection::find()
            .filter(product_collection::Column::CollectionId.eq(id))
            .order_by_asc(product_collection::Column::ProductId)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|link| link.product_id)
            .collect())
    }

    /// Creates or updates a collection and makes its product links equal the form's selection.
    #[instrument(skip(self, form, background), fields(title = %form.title))]
    pub async fn save(
        &self,
        id: Option<i32>,
        form: &CollectionForm,
        background: Option<&UploadedFile>,
    ) -> Result<CollectionModel, ServiceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let mut active: collection::ActiveModel = match id {
            Some(id) => find_collection(&txn, id).await?.into(),
            None => collection::ActiveModel {
                created_at: Set(now),
                ..Default::default()
            },
        };
        active.title = Set(form.title.clone());
        active.updated_at = Set(now);

        let collection = match id {
            Some(_) => active.update(&txn).await?,
            None => active.insert(&txn).await?,
        };

        let existing: Vec<i32> = ProductCollection::find()
            .filter(product_collection::Column::CollectionId.eq(collection.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|link| link.product_id)
            .collect();
        ProductCollection::delete_many()
            .filter(product_collection::Column::CollectionId.eq(collection.id))
            .filter(product_collection::Column::ProductId.is_not_in(form.products.clone()))
            .exec(&txn)
            .await?;
        let fresh: Vec<product_collection::ActiveModel> = form
            .products
            .iter()
            .filter(|id| !existing.contains(id))
            .map(|product_id| product_collection::ActiveModel {
                product_id: Set(*product_id),
                collection_id: Set(collection.id),
                ..Default::default()
            })
            .collect();
        if !fresh.is_empty() {
            ProductCollection::insert_many(fresh)
                .exec_without_returning(&txn)
                .await?;
        }

        let collection = super::attach_background(
            &self.images,
            &self.event_sender,
            background,
            |path| async move {
                let collection = match path {
                    Some(path) => {
                        let mut active: collection::ActiveModel = collection.into();
                        active.background_img = Set(Some(path));
                        active.update(&txn).await?
                    }
                    None => collection,
                };
                txn.commit().await?;
                Ok::<_, ServiceError>(collection)
            },
        )
        .await?;

        counter!("catalog_records.saved", 1, "entity" => "collection");
        self.event_sender
            .send_or_log(CatalogEvent::saved(
                CatalogEntity::Collection,
                collection.id,
                id.is_none(),
            ))
            .await;
        info!("Saved collection: {}", collection.id);
        Ok(collection)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        find_collection(&txn, id).await?;

        ProductCollection::delete_many()
            .filter(product_collection::Column::CollectionId.eq(id))
            .exec(&txn)
            .await?;
        Collection::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        counter!("catalog_records.deleted", 1, "entity" => "collection");
        self.event_sender
            .send_or_log(CatalogEvent::deleted(CatalogEntity::Collection, id))
            .await;
        info!("Deleted collection: {}", id);
        Ok(())
    }
}

async fn find_collection<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<CollectionModel, ServiceError> {
    Collection::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Collection", id))
}
