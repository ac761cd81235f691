mod common;

use axum::http::StatusCode;
use common::{body_text, location, TestApp};

#[tokio::test]
async fn create_attribute_redirects_to_list() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/dashboard/attributes/create",
            &[("title", "Size"), ("values", "S, M, ,L,M")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/attributes");

    let page = body_text(app.get("/dashboard/attributes").await).await;
    assert!(page.contains("Product Attribute List"));
    assert!(page.contains("<td>Size</td>"));
    assert!(page.contains("<td>S, M, L</td>"));
}

#[tokio::test]
async fn missing_title_rerenders_form() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/dashboard/attributes/create", &[("title", "  "), ("values", "Red")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("Create Product Attribute"));
    assert!(page.contains("This field is required."));
    assert!(page.contains("value=\"Red\""));

    let attributes = app.state.services.attributes.list(1, 10).await.unwrap();
    assert_eq!(attributes.total, 0);
}

#[tokio::test]
async fn edit_syncs_values_and_product_types() {
    let app = TestApp::new().await;
    let attribute_id = app.create_attribute("Color", "Red,Blue").await;
    let product_type = app.create_product_type("Shirt", Vec::new()).await;

    let edit_page = body_text(
        app.get(&format!("/dashboard/attributes/{attribute_id}/edit"))
            .await,
    )
    .await;
    assert!(edit_page.contains("Edit Product Attribute"));
    assert!(edit_page.contains("value=\"Red,Blue\""));

    let type_value = product_type.id.to_string();
    let response = app
        .post_form(
            &format!("/dashboard/attributes/{attribute_id}/edit"),
            &[
                ("title", "Colour"),
                ("values", "Blue,Green"),
                ("product_types", type_value.as_str()),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let service = &app.state.services.attributes;
    let titles: Vec<String> = service
        .values(attribute_id)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.title)
        .collect();
    assert_eq!(titles, vec!["Blue".to_string(), "Green".to_string()]);
    assert_eq!(
        service.product_type_ids(attribute_id).await.unwrap(),
        vec![product_type.id]
    );

    let page = body_text(app.get("/dashboard/attributes").await).await;
    assert!(page.contains("<td>Colour</td>"));
    assert!(page.contains("<td>Shirt</td>"));
}

#[tokio::test]
async fn unknown_product_type_is_an_invalid_choice() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/dashboard/attributes/create",
            &[("title", "Size"), ("values", "S"), ("product_types", "77")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Not a valid choice."));
}

#[tokio::test]
async fn editing_missing_attribute_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/dashboard/attributes/42/edit").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post_form("/dashboard/attributes/42/edit", &[("title", "")])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_attribute_removes_row() {
    let app = TestApp::new().await;
    let attribute_id = app.create_attribute("Material", "Leather,Canvas").await;

    let response = app
        .post_form(&format!("/dashboard/attributes/{attribute_id}/delete"), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/attributes");

    let page = body_text(app.get("/dashboard/attributes").await).await;
    assert!(!page.contains("Material"));
    assert!(page.contains("Nothing here yet."));
}
