mod common;

use assert_matches::assert_matches;
use catalog_dashboard::{
    errors::ServiceError,
    forms::{AttributeForm, CategoryForm, CollectionForm, ProductTypeForm, UploadedFile, VariantForm},
};
use bytes::Bytes;
use common::TestApp;
use rust_decimal_macros::dec;

#[tokio::test]
async fn missing_records_are_not_found() {
    let app = TestApp::new().await;
    let services = &app.state.services;

    assert_matches!(services.attributes.get(1).await, Err(ServiceError::NotFound(_)));
    assert_matches!(services.categories.delete(1).await, Err(ServiceError::NotFound(_)));
    assert_matches!(services.collections.get(1).await, Err(ServiceError::NotFound(_)));
    assert_matches!(services.product_types.delete(1).await, Err(ServiceError::NotFound(_)));
    assert_matches!(services.products.detail(1).await, Err(ServiceError::NotFound(_)));
    assert_matches!(services.variants.delete(1).await, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn product_type_in_use_is_a_conflict() {
    let app = TestApp::new().await;
    let footwear = app.create_product_type("Footwear", Vec::new()).await;
    app.create_product(footwear.id, "Runner", dec!(10), 0).await;

    assert_matches!(
        app.state.services.product_types.delete(footwear.id).await,
        Err(ServiceError::Conflict(message)) if message.contains("Footwear")
    );
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let app = TestApp::new().await;
    let footwear = app.create_product_type("Footwear", Vec::new()).await;
    let runner = app.create_product(footwear.id, "Runner", dec!(10), 0).await;
    let form = VariantForm {
        sku_id: Some(1),
        title: "Size 40".into(),
        ..VariantForm::default()
    };

    let variants = &app.state.services.variants;
    let first = variants.save(None, runner.id, &form).await.unwrap();
    assert_eq!(first.sku, format!("{}-1", runner.id));
    assert_matches!(
        variants.save(None, runner.id, &form).await,
        Err(ServiceError::Conflict(_))
    );
    assert!(variants.save(Some(first.id), runner.id, &form).await.is_ok());
}

#[tokio::test]
async fn variant_needs_existing_product() {
    let app = TestApp::new().await;
    let form = VariantForm {
        sku_id: Some(1),
        title: "Orphan".into(),
        ..VariantForm::default()
    };

    assert_matches!(
        app.state.services.variants.save(None, 404, &form).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn deleting_attribute_clears_variant_attribute() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let size = app.create_attribute("Size", "S,M").await;
    let shirt = services
        .product_types
        .save(
            None,
            &ProductTypeForm {
                title: "Shirt".into(),
                product_attributes: vec![size],
                variant_attr_id: size,
                ..ProductTypeForm::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(shirt.variant_attr_id, Some(size));

    services.attributes.delete(size).await.unwrap();

    let shirt = services.product_types.get(shirt.id).await.unwrap();
    assert_eq!(shirt.variant_attr_id, None);
    assert!(services.product_types.attribute_ids(shirt.id).await.unwrap().is_empty());
    assert!(services.attributes.values(size).await.unwrap().is_empty());
}

#[tokio::test]
async fn attribute_values_are_synced_not_recreated() {
    let app = TestApp::new().await;
    let attributes = &app.state.services.attributes;
    let color = app.create_attribute("Color", "Red,Blue").await;
    let blue_before = attributes.values(color).await.unwrap()[1].id;

    attributes
        .save(
            Some(color),
            &AttributeForm {
                title: "Color".into(),
                values: "Blue, Green, Blue".into(),
                product_types: Vec::new(),
            },
        )
        .await
        .unwrap();

    let values = attributes.values(color).await.unwrap();
    let titles: Vec<&str> = values.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, vec!["Blue", "Green"]);
    assert_eq!(values[0].id, blue_before);
}

#[tokio::test]
async fn choices_lead_with_none_where_optional() {
    let app = TestApp::new().await;
    let shoes = app.create_category("Shoes", 0).await;
    app.create_category("Sneakers", shoes.id).await;

    let services = &app.state.services;
    let parents = services.categories.parent_choices().await.unwrap();
    assert_eq!(parents.len(), 2);
    assert_eq!(parents[0].value, 0);
    assert_eq!(parents[1].label, "Shoes");

    let all = services.categories.choices().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].value, 0);
}

fn banner() -> UploadedFile {
    UploadedFile {
        field: "background_img".into(),
        file_name: "banner.png".into(),
        content_type: Some("image/png".into()),
        bytes: Bytes::from_static(b"fake-png"),
    }
}

#[tokio::test]
async fn background_is_not_written_for_a_missing_record() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let upload = banner();

    let category = CategoryForm {
        title: "Boots".into(),
        ..CategoryForm::default()
    };
    assert_matches!(
        services.categories.save(Some(42), &category, Some(&upload)).await,
        Err(ServiceError::NotFound(_))
    );
    let collection = CollectionForm {
        title: "Summer".into(),
        products: Vec::new(),
    };
    assert_matches!(
        services.collections.save(Some(42), &collection, Some(&upload)).await,
        Err(ServiceError::NotFound(_))
    );

    assert!(!app.dir.path().join("static/upload/banner.png").exists());
}

#[tokio::test]
async fn failed_collection_save_leaves_no_upload() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let form = CollectionForm {
        title: "Summer".into(),
        products: vec![404],
    };

    assert!(services.collections.save(None, &form, Some(&banner())).await.is_err());
    assert_eq!(services.collections.list(1, 10).await.unwrap().total, 0);
    assert!(!app.dir.path().join("static/upload/banner.png").exists());
}

#[tokio::test]
async fn background_path_is_stored_with_the_record() {
    let app = TestApp::new().await;
    let form = CategoryForm {
        title: "Boots".into(),
        ..CategoryForm::default()
    };

    let category = app
        .state
        .services
        .categories
        .save(None, &form, Some(&banner()))
        .await
        .unwrap();
    assert_eq!(category.background_img.as_deref(), Some("upload/banner.png"));
    assert!(app.dir.path().join("static/upload/banner.png").exists());
}
