use askama::Template;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;
use tracing::instrument;

use super::common::{
    format_datetime, heading, manage_url, page_param, render, see_other, HtmlResult, ListRow,
    ListTemplate, Pager,
};
use crate::{
    forms::{mark_selected, CollectionForm, FormData, FormErrors, SelectOption},
    AppState,
};

#[derive(Template)]
#[template(path = "product/collection.html")]
pub struct CollectionTemplate {
    pub heading: String,
    pub action: String,
    pub form: CollectionForm,
    pub products: Vec<SelectOption>,
    pub background_img: Option<String>,
    pub errors: FormErrors,
}

#[instrument(skip(state))]
pub async fn collections(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HtmlResult {
    let page = state
        .services
        .collections
        .list(page_param(&params), state.config.page_size)
        .await?;

    render(&ListTemplate {
        title: "Product Collection",
        base: "collections",
        columns: &["ID", "Title", "Created At"],
        pager: Pager::new(&page, "/collections", &params),
        rows: page
            .items
            .into_iter()
            .map(|c| ListRow {
                id: c.id,
                cells: vec![c.id.to_string(), c.title, format_datetime(&c.created_at)],
            })
            .collect(),
    })
}

pub async fn create_page(State(state): State<AppState>) -> HtmlResult {
    collections_manage(&state, None, None).await
}

pub async fn edit_page(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    collections_manage(&state, Some(id), None).await
}

pub async fn create(State(state): State<AppState>, data: FormData) -> HtmlResult {
    collections_manage(&state, None, Some(data)).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    data: FormData,
) -> HtmlResult {
    collections_manage(&state, Some(id), Some(data)).await
}

#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    state.services.collections.delete(id).await?;
    Ok(see_other("/collections"))
}

#[instrument(skip(state, data))]
async fn collections_manage(
    state: &AppState,
    id: Option<i32>,
    data: Option<FormData>,
) -> HtmlResult {
    let service = &state.services.collections;
    let mut products = state.services.products.choices().await?;
    let mut errors = FormErrors::default();

    let existing = match id {
        Some(id) => Some(service.get(id).await?),
        None => None,
    };

    let form = match (&data, &existing) {
        (Some(data), _) => CollectionForm::from_data(data, &mut errors),
        (None, Some(collection)) => {
            CollectionForm::from_model(collection, service.product_ids(collection.id).await?)
        }
        (None, None) => CollectionForm::default(),
    };

    if let Some(data) = &data {
        form.check(&products, &mut errors);
        if errors.is_empty() {
            service.save(id, &form, data.file("background_img")).await?;
            return Ok(see_other("/collections"));
        }
    }

    mark_selected(&mut products, &form.products);
    render(&CollectionTemplate {
        heading: heading(id, "Product Collection"),
        action: manage_url("collections", id),
        form,
        products,
        background_img: existing.and_then(|c| c.background_img),
        errors,
    })
}
