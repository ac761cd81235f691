use askama::Template;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;
use tracing::instrument;

use super::common::{
    heading, manage_url, page_param, render, see_other, HtmlResult, ListRow, ListTemplate, Pager,
};
use crate::{
    forms::{mark_selected, AttributeForm, FormData, FormErrors, SelectOption},
    AppState,
};

#[derive(Template)]
#[template(path = "product/attribute.html")]
pub struct AttributeTemplate {
    pub heading: String,
    pub action: String,
    pub form: AttributeForm,
    pub product_types: Vec<SelectOption>,
    pub errors: FormErrors,
}

#[instrument(skip(state))]
pub async fn attributes(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HtmlResult {
    let page = state
        .services
        .attributes
        .list(page_param(&params), state.config.page_size)
        .await?;

    render(&ListTemplate {
        title: "Product Attribute",
        base: "attributes",
        columns: &["ID", "Title", "Value", "ProductType"],
        pager: Pager::new(&page, "/attributes", &params),
        rows: page
            .items
            .into_iter()
            .map(|row| ListRow {
                id: row.attribute.id,
                cells: vec![
                    row.attribute.id.to_string(),
                    row.attribute.title,
                    row.values_label,
                    row.types_label,
                ],
            })
            .collect(),
    })
}

pub async fn create_page(State(state): State<AppState>) -> HtmlResult {
    attributes_manage(&state, None, None).await
}

pub async fn edit_page(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    attributes_manage(&state, Some(id), None).await
}

pub async fn create(State(state): State<AppState>, data: FormData) -> HtmlResult {
    attributes_manage(&state, None, Some(data)).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    data: FormData,
) -> HtmlResult {
    attributes_manage(&state, Some(id), Some(data)).await
}

#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    state.services.attributes.delete(id).await?;
    Ok(see_other("/attributes"))
}

/// Shows the attribute form, or saves a submission and redirects to the list.
#[instrument(skip(state, data))]
async fn attributes_manage(
    state: &AppState,
    id: Option<i32>,
    data: Option<FormData>,
) -> HtmlResult {
    let service = &state.services.attributes;
    let mut product_types = state.services.product_types.choices().await?;
    let mut errors = FormErrors::default();

    let existing = match id {
        Some(id) => Some(service.get(id).await?),
        None => None,
    };

    let form = match (&data, &existing) {
        (Some(data), _) => AttributeForm::from_data(data, &mut errors),
        (None, Some(attribute)) => {
            let titles: Vec<String> = service
                .values(attribute.id)
                .await?
                .into_iter()
                .map(|v| v.title)
                .collect();
            let product_type_ids = service.product_type_ids(attribute.id).await?;
            AttributeForm::from_model(attribute, &titles, product_type_ids)
        }
        (None, None) => AttributeForm::default(),
    };

    if data.is_some() {
        form.check(&product_types, &mut errors);
        if errors.is_empty() {
            service.save(id, &form).await?;
            return Ok(see_other("/attributes"));
        }
    }

    mark_selected(&mut product_types, &form.product_types);
    render(&AttributeTemplate {
        heading: heading(id, "Product Attribute"),
        action: manage_url("attributes", id),
        form,
        product_types,
        errors,
    })
}
