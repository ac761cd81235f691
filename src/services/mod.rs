//! Catalog services: every query and write the dashboard performs.

pub mod attributes;
pub mod categories;
pub mod collections;
pub mod product_types;
pub mod products;
pub mod variants;

pub use attributes::{AttributeRow, AttributeService};
pub use categories::{CategoryRow, CategoryService};
pub use collections::CollectionService;
pub use product_types::ProductTypeService;
pub use products::{AttributeLabel, ProductDetail, ProductFilter, ProductRow, ProductService};
pub use variants::VariantService;

use std::future::Future;
use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::uploads::ImageStore;

/// All catalog services sharing one pool and event channel.
#[derive(Clone)]
pub struct CatalogServices {
    pub attributes: AttributeService,
    pub categories: CategoryService,
    pub collections: CollectionService,
    pub product_types: ProductTypeService,
    pub products: ProductService,
    pub variants: VariantService,
}

impl CatalogServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, images: ImageStore) -> Self {
        Self {
            attributes: AttributeService::new(db.clone(), event_sender.clone()),
            categories: CategoryService::new(db.clone(), event_sender.clone(), images.clone()),
            collections: CollectionService::new(db.clone(), event_sender.clone(), images.clone()),
            product_types: ProductTypeService::new(db.clone(), event_sender.clone()),
            products: ProductService::new(db.clone(), event_sender.clone(), images),
            variants: VariantService::new(db, event_sender),
        }
    }
}

/// Writes an optional background image for a record already written inside
/// the caller's transaction, then runs `finish` with the stored path.
///
/// `finish` attaches the path and commits. If it fails, the new file is
/// removed again.
pub(crate) async fn attach_background<T, F, Fut>(
    images: &ImageStore,
    event_sender: &EventSender,
    file: Option<&crate::forms::UploadedFile>,
    finish: F,
) -> Result<T, crate::errors::ServiceError>
where
    F: FnOnce(Option<String>) -> Fut,
    Fut: Future<Output = Result<T, crate::errors::ServiceError>>,
{
    let stored = match file {
        Some(file) => images.save(file).await?,
        None => None,
    };

    match finish(stored.clone()).await {
        Ok(value) => {
            if let Some(path) = stored {
                event_sender
                    .send_or_log(crate::events::CatalogEvent::ImageStored { path })
                    .await;
            }
            Ok(value)
        }
        Err(err) => {
            if let Some(path) = &stored {
                images.remove(path).await;
            }
            Err(err)
        }
    }
}
