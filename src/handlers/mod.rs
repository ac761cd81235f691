//! Dashboard request handlers, one module per catalog area.
//!
//! Every form page follows the same cycle: a GET renders the form (empty for
//! create, filled from the record for edit); a POST validates the body, saves
//! through the service and answers `303 See Other`, or re-renders the form with
//! its errors.

pub mod attributes;
pub mod categories;
pub mod collections;
pub mod common;
pub mod health;
pub mod product_types;
pub mod products;
pub mod variants;

use axum::{
    routing::{get, post},
    Router,
};

pub use crate::AppState;

/// Routes served under `/dashboard`.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/attributes", get(attributes::attributes))
        .route(
            "/attributes/create",
            get(attributes::create_page).post(attributes::create),
        )
        .route(
            "/attributes/:id/edit",
            get(attributes::edit_page).post(attributes::update),
        )
        .route("/attributes/:id/delete", post(attributes::delete))
        .route("/collections", get(collections::collections))
        .route(
            "/collections/create",
            get(collections::create_page).post(collections::create),
        )
        .route(
            "/collections/:id/edit",
            get(collections::edit_page).post(collections::update),
        )
        .route("/collections/:id/delete", post(collections::delete))
        .route("/categories", get(categories::categories))
        .route(
            "/categories/create",
            get(categories::create_page).post(categories::create),
        )
        .route(
            "/categories/:id/edit",
            get(categories::edit_page).post(categories::update),
        )
        .route("/categories/:id/delete", post(categories::delete))
        .route("/product_types", get(product_types::product_types))
        .route(
            "/product_types/create",
            get(product_types::create_page).post(product_types::create),
        )
        .route(
            "/product_types/:id/edit",
            get(product_types::edit_page).post(product_types::update),
        )
        .route("/product_types/:id/delete", post(product_types::delete))
        .route("/products", get(products::products))
        .route(
            "/products/create/step1",
            get(products::create_step1_page).post(products::create_step1),
        )
        .route(
            "/products/create/step2",
            get(products::create_step2_page).post(products::create_step2),
        )
        .route("/products/:id", get(products::product_detail))
        .route(
            "/products/:id/edit",
            get(products::edit_page).post(products::update),
        )
        .route("/products/:id/delete", post(products::delete))
        .route(
            "/products/variant/create",
            get(variants::create_page).post(variants::create),
        )
        .route(
            "/products/variant/:id/edit",
            get(variants::edit_page).post(variants::update),
        )
        .route("/products/variant/:id/delete", post(variants::delete))
}
