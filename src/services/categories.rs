use crate::{
    entities::{category, product, Category, CategoryModel, Product},
    errors::ServiceError,
    events::{CatalogEntity, CatalogEvent, EventSender},
    forms::{CategoryForm, SelectOption, UploadedFile},
    pagination::{paginate, Page},
    uploads::ImageStore,
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait, TryIntoModel,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub category: CategoryModel,
    pub parent_title: String,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    images: ImageStore,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>, images: ImageStore) -> Self {
        Self {
            db,
            event_sender,
            images,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: i64, per_page: u64) -> Result<Page<CategoryRow>, ServiceError> {
        let db = &*self.db;
        let page = paginate(
            db,
            Category::find().order_by_asc(category::Column::Id),
            page,
            per_page,
        )
        .await?;

        let parent_ids: Vec<i32> = page.items.iter().filter_map(|c| c.parent_id).collect();
        let parents: HashMap<i32, String> = if parent_ids.is_empty() {
            HashMap::new()
        } else {
            Category::find()
                .filter(category::Column::Id.is_in(parent_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.title))
                .collect()
        };

        Ok(page.map(|category| CategoryRow {
            parent_title: category
                .parent_id
                .and_then(|id| parents.get(&id).cloned())
                .unwrap_or_default(),
            category,
        }))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<CategoryModel, ServiceError> {
        find_category(&*self.db, id).await
    }

    pub async fn all(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Parent select: `0 = None` followed by the first-level categories.
    pub async fn parent_choices(&self) -> Result<Vec<SelectOption>, ServiceError> {
        let mut choices = vec![SelectOption::none()];
        choices.extend(
            Category::find()
                .filter(category::Column::ParentId.is_null())
                .order_by_asc(category::Column::Id)
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|c| SelectOption::new(c.id, c.title)),
        );
        Ok(choices)
    }

    /// Category select for products: `0 = None` followed by every category.
    pub async fn choices(&self) -> Result<Vec<SelectOption>, ServiceError> {
        let mut choices = vec![SelectOption::none()];
        choices.extend(
            self.all()
                .await?
                .into_iter()
                .map(|c| SelectOption::new(c.id, c.title)),
        );
        Ok(choices)
    }

    #[instrument(skip(self, form, background), fields(title = %form.title))]
    pub async fn save(
        &self,
        id: Option<i32>,
        form: &CategoryForm,
        background: Option<&UploadedFile>,
    ) -> Result<CategoryModel, ServiceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let mut active: category::ActiveModel = match id {
            Some(id) => find_category(&txn, id).await?.into(),
            None => category::ActiveModel {
                created_at: Set(now),
                ..Default::default()
            },
        };
        active.title = Set(form.title.clone());
        active.parent_id = Set(form.parent());
        active.updated_at = Set(now);
        let category = active.save(&txn).await?.try_into_model()?;

        let category = super::attach_background(
            &self.images,
            &self.event_sender,
            background,
            |path| async move {
                let category = match path {
                    Some(path) => {
                        let mut active: category::ActiveModel = category.into();
                        active.background_img = Set(Some(path));
                        active.update(&txn).await?
                    }
                    None => category,
                };
                txn.commit().await?;
                Ok::<_, ServiceError>(category)
            },
        )
        .await?;

        counter!("catalog_records.saved", 1, "entity" => "category");
        self.event_sender
            .send_or_log(CatalogEvent::saved(
                CatalogEntity::Category,
                category.id,
                id.is_none(),
            ))
            .await;
        info!("Saved category: {}", category.id);
        Ok(category)
    }

    /// Deletes a category; its children and products are detached, not removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        find_category(&txn, id).await?;

        Category::update_many()
            .col_expr(category::Column::ParentId, Expr::value(Option::<i32>::None))
            .filter(category::Column::ParentId.eq(id))
            .exec(&txn)
            .await?;
        Product::update_many()
            .col_expr(product::Column::CategoryId, Expr::value(Option::<i32>::None))
            .filter(product::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        Category::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        counter!("catalog_records.deleted", 1, "entity" => "category");
        self.event_sender
            .send_or_log(CatalogEvent::deleted(CatalogEntity::Category, id))
            .await;
        info!("Deleted category: {}", id);
        Ok(())
    }
}

async fn find_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<CategoryModel, ServiceError> {
    Category::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Category", id))
}
