use askama::Template;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;
use tracing::instrument;

use super::common::{
    format_datetime, int_param, page_param, render, see_other, HtmlResult, Pager, DASHBOARD,
};
use crate::{
    entities::{ProductImageModel, ProductTypeModel},
    forms::{
        mark_selected, AttributeField, FormData, FormErrors, ProductCreateForm, ProductForm,
        SelectOption,
    },
    services::{ProductDetail, ProductFilter},
    AppState,
};

/// Product type used by step 2 when the query does not name one.
const DEFAULT_PRODUCT_TYPE_ID: i32 = 1;

pub struct ProductListRow {
    pub id: i32,
    pub title: String,
    pub on_sale: &'static str,
    pub sold_count: i32,
    pub price: String,
    pub category: String,
}

#[derive(Template)]
#[template(path = "product/list.html")]
pub struct ProductListTemplate {
    pub rows: Vec<ProductListRow>,
    pub categories: Vec<SelectOption>,
    pub sale: String,
    pub title: String,
    pub created_at: String,
    pub ended_at: String,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "product/detail.html")]
pub struct ProductDetailTemplate {
    pub detail: ProductDetail,
    pub created_at: String,
    pub updated_at: String,
}

/// Inputs shared by the edit and create forms, with selections already marked.
pub struct ProductFields {
    pub title: String,
    pub basic_price: String,
    pub on_sale: bool,
    pub is_featured: bool,
    pub rating: String,
    pub sold_count: String,
    pub review_count: String,
    pub description: String,
    pub categories: Vec<SelectOption>,
    pub attributes: Vec<AttributeField>,
    pub errors: FormErrors,
}

impl ProductFields {
    /// Numeric inputs echo the submitted text so a typo stays visible next to its error.
    fn new(
        form: &ProductForm,
        data: Option<&FormData>,
        mut categories: Vec<SelectOption>,
        mut attributes: Vec<AttributeField>,
        errors: FormErrors,
    ) -> Self {
        let raw = |name: &str, value: String| {
            data.and_then(|d| d.get(name))
                .map(str::to_string)
                .unwrap_or(value)
        };

        mark_selected(&mut categories, &[form.category_id]);
        for field in &mut attributes {
            let chosen = form.attributes.get(&field.attribute_id).copied().unwrap_or(0);
            mark_selected(&mut field.options, &[chosen]);
        }

        Self {
            title: form.title.clone(),
            basic_price: raw(
                "basic_price",
                form.basic_price.map(|p| p.to_string()).unwrap_or_default(),
            ),
            on_sale: form.on_sale,
            is_featured: form.is_featured,
            rating: raw("rating", form.rating.to_string()),
            sold_count: raw("sold_count", form.sold_count.to_string()),
            review_count: raw("review_count", form.review_count.to_string()),
            description: form.description.clone(),
            categories,
            attributes,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "product/product_edit.html")]
pub struct ProductEditTemplate {
    pub product_id: i32,
    pub fields: ProductFields,
    pub images: Vec<ProductImageModel>,
}

#[derive(Template)]
#[template(path = "product/product_create_step1.html")]
pub struct ProductCreateStep1Template {
    pub product_types: Vec<SelectOption>,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "product/product_create_step2.html")]
pub struct ProductCreateStep2Template {
    pub product_type: ProductTypeModel,
    pub action: String,
    pub fields: ProductFields,
}

#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HtmlResult {
    let filter = ProductFilter::from_query(&params);
    let page = state
        .services
        .products
        .list(&filter, page_param(&params), state.config.page_size)
        .await?;

    let mut categories = vec![SelectOption::new(0, "All")];
    categories.extend(
        state
            .services
            .categories
            .all()
            .await?
            .into_iter()
            .map(|c| SelectOption::new(c.id, c.title)),
    );
    mark_selected(&mut categories, &[filter.category.unwrap_or(0)]);

    let raw = |key: &str| params.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
    render(&ProductListTemplate {
        pager: Pager::new(&page, "/products", &params),
        rows: page
            .items
            .into_iter()
            .map(|row| ProductListRow {
                id: row.product.id,
                on_sale: row.product.on_sale_human(),
                sold_count: row.product.sold_count,
                price: row.product.price_human(),
                category: row.category_title,
                title: row.product.title,
            })
            .collect(),
        categories,
        sale: raw("sale"),
        title: raw("title"),
        created_at: raw("created_at"),
        ended_at: raw("ended_at"),
    })
}

#[instrument(skip(state))]
pub async fn product_detail(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    let detail = state.services.products.detail(id).await?;
    render(&ProductDetailTemplate {
        created_at: format_datetime(&detail.product.created_at),
        updated_at: format_datetime(&detail.product.updated_at),
        detail,
    })
}

pub async fn edit_page(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    product_edit(&state, id, None).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    data: FormData,
) -> HtmlResult {
    product_edit(&state, id, Some(data)).await
}

#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult {
    state.services.products.delete(id).await?;
    Ok(see_other("/products"))
}

#[instrument(skip(state, data))]
async fn product_edit(state: &AppState, id: i32, data: Option<FormData>) -> HtmlResult {
    let products = &state.services.products;
    let product = products.get(id).await?;
    let attributes = state
        .services
        .product_types
        .attribute_fields(product.product_type_id)
        .await?;
    let categories = state.services.categories.choices().await?;
    let mut errors = FormErrors::default();

    let form = match &data {
        Some(data) => ProductForm::from_data(data, &attribute_ids(&attributes), &mut errors),
        None => ProductForm::from_model(&product),
    };

    if let Some(data) = &data {
        form.check(&categories, &attributes, &mut errors);
        if errors.is_empty() {
            products.update(id, &form).await?;
            products.add_images(id, &data.files("new_images")).await?;
            return Ok(see_other(&format!("/products/{id}")));
        }
    }

    render(&ProductEditTemplate {
        product_id: id,
        images: products.images(id).await?,
        fields: ProductFields::new(&form, data.as_ref(), categories, attributes, errors),
    })
}

pub async fn create_step1_page(State(state): State<AppState>) -> HtmlResult {
    product_create_step1(&state, None).await
}

pub async fn create_step1(State(state): State<AppState>, data: FormData) -> HtmlResult {
    product_create_step1(&state, Some(data)).await
}

/// Picks the product type; step 2 builds the form for it.
#[instrument(skip(state, data))]
async fn product_create_step1(state: &AppState, data: Option<FormData>) -> HtmlResult {
    let mut product_types = state.services.product_types.choices().await?;
    let mut errors = FormErrors::default();

    let form = match &data {
        Some(data) => ProductCreateForm::from_data(data, &mut errors),
        None => ProductCreateForm::default(),
    };

    if data.is_some() {
        form.check(&product_types, &mut errors);
        if let Some(product_type_id) = form.product_type_id.filter(|_| errors.is_empty()) {
            return Ok(see_other(&format!(
                "/products/create/step2?product_type_id={product_type_id}"
            )));
        }
    }

    let selected: Vec<i32> = form.product_type_id.into_iter().collect();
    mark_selected(&mut product_types, &selected);
    render(&ProductCreateStep1Template {
        product_types,
        errors,
    })
}

pub async fn create_step2_page(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HtmlResult {
    product_create_step2(&state, &params, None).await
}

pub async fn create_step2(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    data: FormData,
) -> HtmlResult {
    product_create_step2(&state, &params, Some(data)).await
}

#[instrument(skip(state, data))]
async fn product_create_step2(
    state: &AppState,
    params: &HashMap<String, String>,
    data: Option<FormData>,
) -> HtmlResult {
    let product_type_id =
        int_param(params, "product_type_id").unwrap_or(DEFAULT_PRODUCT_TYPE_ID);
    let product_type = state.services.product_types.get(product_type_id).await?;
    let attributes = state
        .services
        .product_types
        .attribute_fields(product_type_id)
        .await?;
    let categories = state.services.categories.choices().await?;
    let mut errors = FormErrors::default();

    let form = match &data {
        Some(data) => ProductForm::from_data(data, &attribute_ids(&attributes), &mut errors),
        None => ProductForm::default(),
    };

    if let Some(data) = &data {
        form.check(&categories, &attributes, &mut errors);
        if errors.is_empty() {
            let products = &state.services.products;
            let product = products.create(product_type_id, &form).await?;
            products
                .add_images(product.id, &data.files("new_images"))
                .await?;
            return Ok(see_other(&format!("/products/{}", product.id)));
        }
    }

    render(&ProductCreateStep2Template {
        action: format!("{DASHBOARD}/products/create/step2?product_type_id={product_type_id}"),
        product_type,
        fields: ProductFields::new(&form, data.as_ref(), categories, attributes, errors),
    })
}

fn attribute_ids(fields: &[AttributeField]) -> Vec<i32> {
    fields.iter().map(|f| f.attribute_id).collect()
}
