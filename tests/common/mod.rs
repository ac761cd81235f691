#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use tempfile::TempDir;
use tower::ServiceExt;

use catalog_dashboard::{
    app_router,
    config::AppConfig,
    db,
    entities::{CategoryModel, ProductModel, ProductTypeModel},
    events::{self, EventSender},
    forms::{AttributeForm, CategoryForm, ProductForm, ProductTypeForm},
    logging::LoggingState,
    AppState,
};

const BOUNDARY: &str = "catalog-test-boundary";

/// The whole application over a throwaway SQLite file and static directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_page_size(10).await
    }

    pub async fn with_page_size(page_size: u64) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("catalog.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.page_size = page_size;
        cfg.static_dir = dir.path().join("static").display().to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(pool, cfg, event_sender);
        let router = app_router(state.clone(), Arc::new(LoggingState::discard()));

        Self {
            router,
            state,
            dir,
            _event_task: event_task,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    /// POSTs an urlencoded form; repeated keys are allowed.
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .expect("request"),
        )
        .await
    }

    /// POSTs a multipart form with text fields and `(field, file name, bytes)` files.
    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
    ) -> Response {
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, file_name, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .expect("request"),
        )
        .await
    }

    pub async fn create_category(&self, title: &str, parent_id: i32) -> CategoryModel {
        self.state
            .services
            .categories
            .save(
                None,
                &CategoryForm {
                    title: title.to_string(),
                    parent_id,
                },
                None,
            )
            .await
            .expect("seed category")
    }

    pub async fn create_attribute(&self, title: &str, values: &str) -> i32 {
        self.state
            .services
            .attributes
            .save(
                None,
                &AttributeForm {
                    title: title.to_string(),
                    values: values.to_string(),
                    product_types: Vec::new(),
                },
            )
            .await
            .expect("seed attribute")
            .id
    }

    pub async fn create_product_type(&self, title: &str, attributes: Vec<i32>) -> ProductTypeModel {
        self.state
            .services
            .product_types
            .save(
                None,
                &ProductTypeForm {
                    title: title.to_string(),
                    product_attributes: attributes,
                    ..ProductTypeForm::default()
                },
            )
            .await
            .expect("seed product type")
    }

    pub async fn create_product(
        &self,
        product_type_id: i32,
        title: &str,
        price: Decimal,
        category_id: i32,
    ) -> ProductModel {
        self.state
            .services
            .products
            .create(
                product_type_id,
                &ProductForm {
                    title: title.to_string(),
                    basic_price: Some(price),
                    category_id,
                    ..ProductForm::default()
                },
            )
            .await
            .expect("seed product")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
