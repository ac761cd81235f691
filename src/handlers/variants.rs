use askama::Template;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;
use tracing::instrument;

use super::common::{heading, int_param, render, see_other, HtmlResult, DASHBOARD};
use crate::{
    errors::ServiceError,
    forms::{FormData, FormErrors, VariantForm},
    AppState,
};

#[derive(Template)]
#[template(path = "product/variant.html")]
pub struct VariantTemplate {
    pub heading: String,
    pub action: String,
    pub product_id: Option<i32>,
    pub sku_id: String,
    pub title: String,
    pub price_override: String,
    pub quantity: String,
    pub quantity_allocated: String,
    pub errors: FormErrors,
}

pub async fn create_page(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HtmlResult {
    variant_manage(&state, None, &params, None).await
}

pub async fn edit_page(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<HashMap<String, String>>,
) -> HtmlResult {
    variant_manage(&state, Some(id), &params, None).await
}

pub async fn create(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    data: FormData,
) -> HtmlResult {
    variant_manage(&state, None, &params, Some(data)).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<HashMap<String, String>>,
    data: FormData,
) -> HtmlResult {
    variant_manage(&state, Some(id), &params, Some(data)).await
}

#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    let product_id = state.services.variants.delete(id).await?;
    Ok(see_other(&format!("/products/{product_id}")))
}

/// Shows or saves a variant. The `product_id` query value picks the owning product
/// and overrides the stored one when editing.
#[instrument(skip(state, data))]
async fn variant_manage(
    state: &AppState,
    id: Option<i32>,
    params: &HashMap<String, String>,
    data: Option<FormData>,
) -> HtmlResult {
    let service = &state.services.variants;
    let mut errors = FormErrors::default();

    let existing = match id {
        Some(id) => Some(service.get(id).await?),
        None => None,
    };
    let product_id = int_param(params, "product_id").or(existing.as_ref().map(|v| v.product_id));

    let form = match (&data, &existing) {
        (Some(data), _) => VariantForm::from_data(data, &mut errors),
        (None, Some(variant)) => VariantForm::from_model(variant),
        (None, None) => VariantForm::default(),
    };

    if data.is_some() {
        form.check(&mut errors);
        if product_id.is_none() {
            errors.add("product_id", "A product is required.");
        }
        if let Some(product_id) = product_id.filter(|_| errors.is_empty()) {
            match service.save(id, product_id, &form).await {
                Ok(variant) => return Ok(see_other(&format!("/products/{}", variant.product_id))),
                Err(ServiceError::Conflict(message)) => errors.add("sku_id", message),
                Err(err) => return Err(err),
            }
        }
    }

    let raw = |name: &str, value: String| {
        data.as_ref()
            .and_then(|d| d.get(name))
            .map(str::to_string)
            .unwrap_or(value)
    };
    render(&VariantTemplate {
        heading: heading(id, "Variant"),
        action: action_url(id, product_id),
        product_id,
        sku_id: raw("sku_id", form.sku_id.map(|s| s.to_string()).unwrap_or_default()),
        title: form.title.clone(),
        price_override: raw("price_override", form.price_override.to_string()),
        quantity: raw("quantity", form.quantity.to_string()),
        quantity_allocated: raw("quantity_allocated", form.quantity_allocated.to_string()),
        errors,
    })
}

fn action_url(id: Option<i32>, product_id: Option<i32>) -> String {
    let path = match id {
        Some(id) => format!("{DASHBOARD}/products/variant/{id}/edit"),
        None => format!("{DASHBOARD}/products/variant/create"),
    };
    match product_id {
        Some(product_id) => format!("{path}?product_id={product_id}"),
        None => path,
    }
}
