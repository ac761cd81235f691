use askama::Template;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;
use tracing::instrument;

use super::common::{
    format_datetime, heading, manage_url, page_param, render, see_other, HtmlResult, ListRow,
    ListTemplate, Pager,
};
use crate::{
    forms::{mark_selected, CategoryForm, FormData, FormErrors, SelectOption},
    AppState,
};

#[derive(Template)]
#[template(path = "product/category.html")]
pub struct CategoryTemplate {
    pub heading: String,
    pub action: String,
    pub form: CategoryForm,
    pub parents: Vec<SelectOption>,
    pub background_img: Option<String>,
    pub errors: FormErrors,
}

#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HtmlResult {
    let page = state
        .services
        .categories
        .list(page_param(&params), state.config.page_size)
        .await?;

    render(&ListTemplate {
        title: "Product Category",
        base: "categories",
        columns: &["ID", "Title", "Parent", "Created At"],
        pager: Pager::new(&page, "/categories", &params),
        rows: page
            .items
            .into_iter()
            .map(|row| ListRow {
                id: row.category.id,
                cells: vec![
                    row.category.id.to_string(),
                    row.category.title,
                    row.parent_title,
                    format_datetime(&row.category.created_at),
                ],
            })
            .collect(),
    })
}

pub async fn create_page(State(state): State<AppState>) -> HtmlResult {
    categories_manage(&state, None, None).await
}

pub async fn edit_page(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    categories_manage(&state, Some(id), None).await
}

pub async fn create(State(state): State<AppState>, data: FormData) -> HtmlResult {
    categories_manage(&state, None, Some(data)).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    data: FormData,
) -> HtmlResult {
    categories_manage(&state, Some(id), Some(data)).await
}

#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    state.services.categories.delete(id).await?;
    Ok(see_other("/categories"))
}

#[instrument(skip(state, data))]
async fn categories_manage(
    state: &AppState,
    id: Option<i32>,
    data: Option<FormData>,
) -> HtmlResult {
    let service = &state.services.categories;
    let mut parents = service.parent_choices().await?;
    let mut errors = FormErrors::default();

    let existing = match id {
        Some(id) => Some(service.get(id).await?),
        None => None,
    };

    let form = match (&data, &existing) {
        (Some(data), _) => CategoryForm::from_data(data, &mut errors),
        (None, Some(category)) => CategoryForm::from_model(category),
        (None, None) => CategoryForm::default(),
    };

    if let Some(data) = &data {
        form.check(id, &parents, &mut errors);
        if errors.is_empty() {
            service.save(id, &form, data.file("background_img")).await?;
            return Ok(see_other("/categories"));
        }
    }

    mark_selected(&mut parents, &[form.parent_id]);
    render(&CategoryTemplate {
        heading: heading(id, "Product Category"),
        action: manage_url("categories", id),
        form,
        parents,
        background_img: existing.and_then(|c| c.background_img),
        errors,
    })
}
