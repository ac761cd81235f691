mod common;

use axum::http::StatusCode;
use catalog_dashboard::forms::ProductForm;
use common::{body_text, location, TestApp};
use rust_decimal_macros::dec;

/// Footwear type with a Color attribute; returns (type id, attribute id, value ids).
async fn footwear(app: &TestApp) -> (i32, i32, Vec<i32>) {
    let color = app.create_attribute("Color", "Red,Blue").await;
    let product_type = app.create_product_type("Footwear", vec![color]).await;
    let values = app
        .state
        .services
        .attributes
        .values(color)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect();
    (product_type.id, color, values)
}

#[tokio::test]
async fn list_filters_by_sale_category_and_title() {
    let app = TestApp::new().await;
    let (type_id, _, _) = footwear(&app).await;
    let shoes = app.create_category("Shoes", 0).await;
    app.create_product(type_id, "Canvas Runner", dec!(49.90), shoes.id)
        .await;
    app.create_product(type_id, "Trail Hiker", dec!(89), 0).await;
    app.state
        .services
        .products
        .create(
            type_id,
            &ProductForm {
                title: "City Loafer".into(),
                basic_price: Some(dec!(74.5)),
                on_sale: false,
                category_id: shoes.id,
                ..ProductForm::default()
            },
        )
        .await
        .unwrap();

    let page = body_text(app.get("/dashboard/products").await).await;
    assert!(page.contains("Canvas Runner"));
    assert!(page.contains("Trail Hiker"));
    assert!(page.contains("City Loafer"));
    assert!(page.contains("<td>Shoes</td>"));

    let page = body_text(app.get("/dashboard/products?sale=0").await).await;
    assert!(page.contains("City Loafer"));
    assert!(!page.contains("Canvas Runner"));

    let page = body_text(
        app.get(&format!("/dashboard/products?category={}", shoes.id))
            .await,
    )
    .await;
    assert!(page.contains("Canvas Runner"));
    assert!(page.contains("City Loafer"));
    assert!(!page.contains("Trail Hiker"));

    let page = body_text(app.get("/dashboard/products?category=0&title=Hik").await).await;
    assert!(page.contains("Trail Hiker"));
    assert!(!page.contains("Canvas Runner"));
}

#[tokio::test]
async fn list_filters_by_creation_window() {
    let app = TestApp::new().await;
    let (type_id, _, _) = footwear(&app).await;
    app.create_product(type_id, "Canvas Runner", dec!(10), 0).await;

    let page = body_text(app.get("/dashboard/products?created_at=2000-01-01").await).await;
    assert!(page.contains("Canvas Runner"));

    let page = body_text(app.get("/dashboard/products?ended_at=2000-01-01").await).await;
    assert!(!page.contains("Canvas Runner"));
    assert!(page.contains("No products match."));

    let page = body_text(app.get("/dashboard/products?ended_at=not-a-date").await).await;
    assert!(page.contains("Canvas Runner"));
}

#[tokio::test]
async fn list_pagination_keeps_filters() {
    let app = TestApp::with_page_size(2).await;
    let (type_id, _, _) = footwear(&app).await;
    for title in ["Runner One", "Runner Two", "Runner Three"] {
        app.create_product(type_id, title, dec!(10), 0).await;
    }

    let first = body_text(app.get("/dashboard/products?sale=1").await).await;
    assert!(first.contains("Runner One"));
    assert!(!first.contains("Runner Three"));
    assert!(first.contains("sale=1&amp;page=2"));

    let second = body_text(app.get("/dashboard/products?sale=1&page=2").await).await;
    assert!(second.contains("Runner Three"));
    assert!(!second.contains("Runner One"));

    let response = app.get("/dashboard/products?page=3").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let lenient = body_text(app.get("/dashboard/products?page=abc").await).await;
    assert!(lenient.contains("Runner One"));
}

#[tokio::test]
async fn detail_shows_relations() {
    let app = TestApp::new().await;
    let (type_id, color, values) = footwear(&app).await;
    let shoes = app.create_category("Shoes", 0).await;

    let mut form = ProductForm {
        title: "Canvas Runner".into(),
        basic_price: Some(dec!(49.90)),
        category_id: shoes.id,
        description: "Light and breathable.".into(),
        ..ProductForm::default()
    };
    form.attributes.insert(color, values[0]);
    let product = app
        .state
        .services
        .products
        .create(type_id, &form)
        .await
        .unwrap();

    let response = app.get(&format!("/dashboard/products/{}", product.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("<h1>Canvas Runner</h1>"));
    assert!(page.contains("<dd>Shoes</dd>"));
    assert!(page.contains("<dd>Footwear</dd>"));
    assert!(page.contains("Color: Red"));
    assert!(page.contains("Light and breathable."));
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/dashboard/products/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("404"));

    let response = app.get("/dashboard/products/999/edit").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_updates_fields_and_stores_images() {
    let app = TestApp::new().await;
    let (type_id, color, values) = footwear(&app).await;
    let product = app.create_product(type_id, "Canvas Runner", dec!(10), 0).await;

    let edit_page = body_text(
        app.get(&format!("/dashboard/products/{}/edit", product.id))
            .await,
    )
    .await;
    assert!(edit_page.contains("value=\"Canvas Runner\""));
    assert!(edit_page.contains(&format!("name=\"attribute_{color}\"")));

    let attribute_field = format!("attribute_{color}");
    let blue = values[1].to_string();
    let response = app
        .post_multipart(
            &format!("/dashboard/products/{}/edit", product.id),
            &[
                ("title", "Canvas Runner II"),
                ("basic_price", "59.50"),
                ("is_featured", "y"),
                ("rating", "4.5"),
                ("sold_count", "3"),
                ("review_count", "1"),
                ("category_id", "0"),
                (attribute_field.as_str(), blue.as_str()),
                ("description", "Second edition."),
            ],
            &[
                ("new_images", "front.png", b"front".as_slice()),
                ("new_images", "side.png", b"side".as_slice()),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/dashboard/products/{}", product.id)
    );

    let products = &app.state.services.products;
    let updated = products.get(product.id).await.unwrap();
    assert_eq!(updated.title, "Canvas Runner II");
    assert_eq!(updated.basic_price, dec!(59.50));
    assert!(!updated.on_sale);
    assert!(updated.is_featured);
    assert_eq!(updated.attribute_map().get(&color), Some(&values[1]));

    let images: Vec<String> = products
        .images(product.id)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.image)
        .collect();
    assert_eq!(images, vec!["upload/front.png", "upload/side.png"]);
    assert!(app.dir.path().join("static/upload/side.png").exists());
}

#[tokio::test]
async fn invalid_edit_echoes_input() {
    let app = TestApp::new().await;
    let (type_id, _, _) = footwear(&app).await;
    let product = app.create_product(type_id, "Canvas Runner", dec!(10), 0).await;

    let response = app
        .post_form(
            &format!("/dashboard/products/{}/edit", product.id),
            &[("title", "Canvas Runner"), ("basic_price", "ten"), ("rating", "9")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("Not a valid decimal value."));
    assert!(page.contains("value=\"ten\""));
    assert!(page.contains("Number must be between 0 and 5."));

    let unchanged = app.state.services.products.get(product.id).await.unwrap();
    assert_eq!(unchanged.basic_price, dec!(10));
}

#[tokio::test]
async fn create_step1_redirects_to_step2() {
    let app = TestApp::new().await;
    let (type_id, _, _) = footwear(&app).await;

    let page = body_text(app.get("/dashboard/products/create/step1").await).await;
    assert!(page.contains("Footwear"));

    let type_value = type_id.to_string();
    let response = app
        .post_form(
            "/dashboard/products/create/step1",
            &[("product_type_id", type_value.as_str())],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/dashboard/products/create/step2?product_type_id={type_id}")
    );
}

#[tokio::test]
async fn create_step1_rejects_unknown_type() {
    let app = TestApp::new().await;
    footwear(&app).await;

    let response = app
        .post_form("/dashboard/products/create/step1", &[("product_type_id", "99")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Not a valid choice."));

    let response = app.post_form("/dashboard/products/create/step1", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
}

#[tokio::test]
async fn create_step2_creates_product_of_type() {
    let app = TestApp::new().await;
    let (type_id, color, values) = footwear(&app).await;

    let page = body_text(
        app.get(&format!(
            "/dashboard/products/create/step2?product_type_id={type_id}"
        ))
        .await,
    )
    .await;
    assert!(page.contains("Footwear"));
    assert!(page.contains(&format!("name=\"attribute_{color}\"")));

    let attribute_field = format!("attribute_{color}");
    let red = values[0].to_string();
    let response = app
        .post_multipart(
            &format!("/dashboard/products/create/step2?product_type_id={type_id}"),
            &[
                ("title", "Trail Hiker"),
                ("basic_price", "89.00"),
                ("on_sale", "y"),
                ("category_id", "0"),
                (attribute_field.as_str(), red.as_str()),
            ],
            &[("new_images", "hiker.png", b"hiker".as_slice())],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let products = app
        .state
        .services
        .products
        .list(&Default::default(), 1, 10)
        .await
        .unwrap();
    assert_eq!(products.total, 1);
    let created = &products.items[0].product;
    assert_eq!(
        location(&response),
        format!("/dashboard/products/{}", created.id)
    );
    assert_eq!(created.product_type_id, type_id);
    assert!(created.on_sale);
    assert_eq!(created.attribute_map().get(&color), Some(&values[0]));
    assert_eq!(
        app.state.services.products.images(created.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn create_step2_requires_price() {
    let app = TestApp::new().await;
    let (type_id, _, _) = footwear(&app).await;

    let response = app
        .post_form(
            &format!("/dashboard/products/create/step2?product_type_id={type_id}"),
            &[("title", "Trail Hiker"), ("basic_price", "")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
}

#[tokio::test]
async fn create_step2_unknown_type_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/dashboard/products/create/step2").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .get("/dashboard/products/create/step2?product_type_id=5")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_product_removes_variants_and_links() {
    let app = TestApp::new().await;
    let (type_id, _, _) = footwear(&app).await;
    let product = app.create_product(type_id, "Canvas Runner", dec!(10), 0).await;
    let product_id = product.id.to_string();
    app.post_form(
        &format!("/dashboard/products/variant/create?product_id={product_id}"),
        &[("sku_id", "1"), ("title", "Size 40")],
    )
    .await;
    app.post_form(
        "/dashboard/collections/create",
        &[("title", "Summer"), ("products", product_id.as_str())],
    )
    .await;

    let response = app
        .post_form(&format!("/dashboard/products/{}/delete", product.id), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/products");

    assert!(app.state.services.products.get(product.id).await.is_err());
    let collection = &app.state.services.collections.list(1, 10).await.unwrap().items[0];
    assert!(app
        .state
        .services
        .collections
        .product_ids(collection.id)
        .await
        .unwrap()
        .is_empty());
}
