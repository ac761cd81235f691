use askama::Template;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;
use tracing::instrument;

use super::common::{
    format_datetime, heading, manage_url, page_param, render, see_other, yes_no, HtmlResult,
    ListRow, ListTemplate, Pager,
};
use crate::{
    forms::{mark_selected, FormData, FormErrors, ProductTypeForm, SelectOption},
    AppState,
};

#[derive(Template)]
#[template(path = "product/product_type.html")]
pub struct ProductTypeTemplate {
    pub heading: String,
    pub action: String,
    pub form: ProductTypeForm,
    pub product_attributes: Vec<SelectOption>,
    /// `0 = None` followed by every attribute
    pub variant_attributes: Vec<SelectOption>,
    pub errors: FormErrors,
}

#[instrument(skip(state))]
pub async fn product_types(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HtmlResult {
    let page = state
        .services
        .product_types
        .list(page_param(&params), state.config.page_size)
        .await?;

    render(&ListTemplate {
        title: "Product Type",
        base: "product_types",
        columns: &["ID", "Title", "Has Variants", "Is Shipping Required", "Created At"],
        pager: Pager::new(&page, "/product_types", &params),
        rows: page
            .items
            .into_iter()
            .map(|t| ListRow {
                id: t.id,
                cells: vec![
                    t.id.to_string(),
                    t.title,
                    yes_no(t.has_variants),
                    yes_no(t.is_shipping_required),
                    format_datetime(&t.created_at),
                ],
            })
            .collect(),
    })
}

pub async fn create_page(State(state): State<AppState>) -> HtmlResult {
    product_types_manage(&state, None, None).await
}

pub async fn edit_page(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    product_types_manage(&state, Some(id), None).await
}

pub async fn create(State(state): State<AppState>, data: FormData) -> HtmlResult {
    product_types_manage(&state, None, Some(data)).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    data: FormData,
) -> HtmlResult {
    product_types_manage(&state, Some(id), Some(data)).await
}

#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    state.services.product_types.delete(id).await?;
    Ok(see_other("/product_types"))
}

#[instrument(skip(state, data))]
async fn product_types_manage(
    state: &AppState,
    id: Option<i32>,
    data: Option<FormData>,
) -> HtmlResult {
    let service = &state.services.product_types;
    let mut attributes = state.services.attributes.choices().await?;
    let mut errors = FormErrors::default();

    let existing = match id {
        Some(id) => Some(service.get(id).await?),
        None => None,
    };

    let form = match (&data, &existing) {
        (Some(data), _) => ProductTypeForm::from_data(data, &mut errors),
        (None, Some(product_type)) => {
            ProductTypeForm::from_model(product_type, service.attribute_ids(product_type.id).await?)
        }
        (None, None) => ProductTypeForm::default(),
    };

    if data.is_some() {
        form.check(&attributes, &mut errors);
        if errors.is_empty() {
            service.save(id, &form).await?;
            return Ok(see_other("/product_types"));
        }
    }

    let mut variant_attributes = vec![SelectOption::none()];
    variant_attributes.extend(attributes.iter().cloned());
    mark_selected(&mut variant_attributes, &[form.variant_attr_id]);
    mark_selected(&mut attributes, &form.product_attributes);

    render(&ProductTypeTemplate {
        heading: heading(id, "Product Type"),
        action: manage_url("product_types", id),
        form,
        product_attributes: attributes,
        variant_attributes,
        errors,
    })
}
