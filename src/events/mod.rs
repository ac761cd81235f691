use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Catalog record kinds that publish events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogEntity {
    Product,
    Category,
    Collection,
    Attribute,
    ProductType,
    Variant,
}

impl CatalogEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogEntity::Product => "product",
            CatalogEntity::Category => "category",
            CatalogEntity::Collection => "collection",
            CatalogEntity::Attribute => "attribute",
            CatalogEntity::ProductType => "product_type",
            CatalogEntity::Variant => "variant",
        }
    }
}

// Events published by the catalog services after a successful write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CatalogEvent {
    Saved {
        entity: CatalogEntity,
        id: i32,
        created: bool,
        at: DateTime<Utc>,
    },
    Deleted {
        entity: CatalogEntity,
        id: i32,
        at: DateTime<Utc>,
    },
    ImageStored {
        path: String,
    },
}

impl CatalogEvent {
    pub fn saved(entity: CatalogEntity, id: i32, created: bool) -> Self {
        CatalogEvent::Saved {
            entity,
            id,
            created,
            at: Utc::now(),
        }
    }

    pub fn deleted(entity: CatalogEntity, id: i32) -> Self {
        CatalogEvent::Deleted {
            entity,
            id,
            at: Utc::now(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            CatalogEvent::Saved { .. } => "saved",
            CatalogEvent::Deleted { .. } => "deleted",
            CatalogEvent::ImageStored { .. } => "image_stored",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<CatalogEvent>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<CatalogEvent>) -> Self {
        Self { sender }
    }

    /// Creates a bounded channel and its sender handle.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<CatalogEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: CatalogEvent) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    pub async fn send_or_log(&self, event: CatalogEvent) {
        if let Err(err) = self.send(event).await {
            counter!("catalog_events.dropped", 1);
            warn!(error = %err, "catalog event dropped");
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<CatalogEvent>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("catalog_events.processed", 1, "kind" => event.kind());
        match &event {
            CatalogEvent::Saved {
                entity, id, created, ..
            } => {
                info!(entity = entity.as_str(), id, created, "catalog record saved");
            }
            CatalogEvent::Deleted { entity, id, .. } => {
                info!(entity = entity.as_str(), id, "catalog record deleted");
            }
            CatalogEvent::ImageStored { path } => {
                info!(path = %path, "image stored");
            }
        }
    }

    info!("Event processing loop stopped");
}
