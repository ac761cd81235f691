use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_catalog_tables::Migration),
            Box::new(m20240301_000002_create_product_children_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Categories::Title).string_len(255).not_null())
                        .col(ColumnDef::new(Categories::ParentId).integer().null())
                        .col(
                            ColumnDef::new(Categories::BackgroundImg)
                                .string_len(1024)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_categories_parent_id")
                                .from(Categories::Table, Categories::ParentId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductAttributes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductAttributes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductAttributes::Title)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAttributes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAttributes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AttributeChoiceValues::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AttributeChoiceValues::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(AttributeChoiceValues::Title)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AttributeChoiceValues::AttributeId)
                                .integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_attribute_choice_values_attribute_id")
                                .from(
                                    AttributeChoiceValues::Table,
                                    AttributeChoiceValues::AttributeId,
                                )
                                .to(ProductAttributes::Table, ProductAttributes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductTypes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductTypes::Title).string_len(255).not_null())
                        .col(
                            ColumnDef::new(ProductTypes::HasVariants)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ProductTypes::IsShippingRequired)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(ProductTypes::VariantAttrId).integer().null())
                        .col(
                            ColumnDef::new(ProductTypes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductTypes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_types_variant_attr_id")
                                .from(ProductTypes::Table, ProductTypes::VariantAttrId)
                                .to(ProductAttributes::Table, ProductAttributes::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductTypeAttributes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductTypeAttributes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductTypeAttributes::ProductTypeId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductTypeAttributes::ProductAttributeId)
                                .integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_type_attributes_product_type_id")
                                .from(
                                    ProductTypeAttributes::Table,
                                    ProductTypeAttributes::ProductTypeId,
                                )
                                .to(ProductTypes::Table, ProductTypes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_type_attributes_product_attribute_id")
                                .from(
                                    ProductTypeAttributes::Table,
                                    ProductTypeAttributes::ProductAttributeId,
                                )
                                .to(ProductAttributes::Table, ProductAttributes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Title).string_len(255).not_null())
                        .col(ColumnDef::new(Products::Description).text().not_null())
                        .col(
                            ColumnDef::new(Products::BasicPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::OnSale)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::IsFeatured)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::Rating)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(Products::SoldCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::ReviewCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::CategoryId).integer().null())
                        .col(ColumnDef::new(Products::ProductTypeId).integer().not_null())
                        .col(ColumnDef::new(Products::Attributes).json().not_null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_category_id")
                                .from(Products::Table, Products::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_product_type_id")
                                .from(Products::Table, Products::ProductTypeId)
                                .to(ProductTypes::Table, ProductTypes::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_created_at")
                        .table(Products::Table)
                        .col(Products::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Collections::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Collections::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Collections::Title).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Collections::BackgroundImg)
                                .string_len(1024)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Collections::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Collections::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductCollections::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductCollections::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductCollections::ProductId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCollections::CollectionId)
                                .integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_collections_product_id")
                                .from(ProductCollections::Table, ProductCollections::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_collections_collection_id")
                                .from(
                                    ProductCollections::Table,
                                    ProductCollections::CollectionId,
                                )
                                .to(Collections::Table, Collections::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductCollections::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Collections::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductTypeAttributes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductTypes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AttributeChoiceValues::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductAttributes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Categories {
        Table,
        Id,
        Title,
        ParentId,
        BackgroundImg,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum ProductAttributes {
        Table,
        Id,
        Title,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum AttributeChoiceValues {
        Table,
        Id,
        Title,
        AttributeId,
    }

    #[derive(DeriveIden)]
    enum ProductTypes {
        Table,
        Id,
        Title,
        HasVariants,
        IsShippingRequired,
        VariantAttrId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductTypeAttributes {
        Table,
        Id,
        ProductTypeId,
        ProductAttributeId,
    }

    #[derive(DeriveIden)]
    pub enum Products {
        Table,
        Id,
        Title,
        Description,
        BasicPrice,
        OnSale,
        IsFeatured,
        Rating,
        SoldCount,
        ReviewCount,
        CategoryId,
        ProductTypeId,
        Attributes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Collections {
        Table,
        Id,
        Title,
        BackgroundImg,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductCollections {
        Table,
        Id,
        ProductId,
        CollectionId,
    }
}

mod m20240301_000002_create_product_children_tables {

    use super::m20240301_000001_create_catalog_tables::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_product_children_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductImages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductImages::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductImages::Image).string_len(1024).not_null())
                        .col(ColumnDef::new(ProductImages::ProductId).integer().not_null())
                        .col(
                            ColumnDef::new(ProductImages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_images_product_id")
                                .from(ProductImages::Table, ProductImages::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductVariants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductVariants::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::Sku)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(ProductVariants::Title).string_len(255).not_null())
                        .col(
                            ColumnDef::new(ProductVariants::PriceOverride)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::QuantityAllocated)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ProductVariants::ProductId).integer().not_null())
                        .col(
                            ColumnDef::new(ProductVariants::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_variants_product_id")
                                .from(ProductVariants::Table, ProductVariants::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_variants_product_id")
                        .table(ProductVariants::Table)
                        .col(ProductVariants::ProductId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductImages::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductImages {
        Table,
        Id,
        Image,
        ProductId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductVariants {
        Table,
        Id,
        Sku,
        Title,
        PriceOverride,
        Quantity,
        QuantityAllocated,
        ProductId,
        CreatedAt,
        UpdatedAt,
    }
}
