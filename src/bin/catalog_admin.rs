//! Admin tasks for the catalog database.
//!
//! Run with: cargo run --bin catalog-admin -- migrate up
//!           cargo run --bin catalog-admin -- seed

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal_macros::dec;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use catalog_dashboard::{
    config,
    db::{self, DbPool},
    events::EventSender,
    forms::{
        AttributeForm, CategoryForm, CollectionForm, ProductForm, ProductTypeForm, VariantForm,
    },
    migrator::Migrator,
    services::CatalogServices,
    uploads::ImageStore,
};

#[derive(Parser)]
#[command(name = "catalog-admin", about = "Catalog dashboard database administration", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply or inspect schema migrations
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Create a small demo catalog
    Seed,
}

#[derive(Subcommand)]
enum MigrateCommand {
    /// Apply all pending migrations
    Up,
    /// Roll back the last migration
    Down {
        #[arg(long, default_value_t = 1, help = "Number of migrations to roll back")]
        steps: u32,
    },
    /// Drop every table and re-apply all migrations
    Fresh,
    /// Show applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg).await?;

    match cli.command {
        Commands::Migrate(command) => migrate(&pool, command).await?,
        Commands::Seed => {
            db::run_migrations(&pool).await?;
            seed(pool, ImageStore::from_config(&cfg)).await?;
            return Ok(());
        }
    }

    db::close_pool(pool).await?;
    Ok(())
}

async fn migrate(pool: &DbPool, command: MigrateCommand) -> Result<()> {
    match command {
        MigrateCommand::Up => {
            Migrator::up(pool, None).await?;
            info!("Migrations applied");
        }
        MigrateCommand::Down { steps } => {
            Migrator::down(pool, Some(steps)).await?;
            info!("Rolled back {} migration(s)", steps);
        }
        MigrateCommand::Fresh => {
            Migrator::fresh(pool).await?;
            info!("Database recreated");
        }
        MigrateCommand::Status => Migrator::status(pool).await?,
    }
    Ok(())
}

/// Builds the demo catalog through the same services the dashboard uses.
async fn seed(pool: DbPool, images: ImageStore) -> Result<()> {
    let (event_sender, mut event_rx) = EventSender::channel(64);
    let drain = tokio::spawn(async move { while event_rx.recv().await.is_some() {} });
    let services = CatalogServices::new(Arc::new(pool), Arc::new(event_sender), images);

    let shoes = services
        .categories
        .save(None, &category("Shoes", 0), None)
        .await?;
    let sneakers = services
        .categories
        .save(None, &category("Sneakers", shoes.id), None)
        .await?;

    let size = services
        .attributes
        .save(
            None,
            &AttributeForm {
                title: "Size".into(),
                values: "38,39,40,41,42".into(),
                product_types: Vec::new(),
            },
        )
        .await?;
    let color = services
        .attributes
        .save(
            None,
            &AttributeForm {
                title: "Color".into(),
                values: "Black,White,Red".into(),
                product_types: Vec::new(),
            },
        )
        .await?;

    let footwear = services
        .product_types
        .save(
            None,
            &ProductTypeForm {
                title: "Footwear".into(),
                has_variants: true,
                is_shipping_required: true,
                product_attributes: vec![size.id, color.id],
                variant_attr_id: size.id,
            },
        )
        .await?;

    let colors = services.attributes.values(color.id).await?;
    let mut products = Vec::new();
    for (index, (title, price)) in [
        ("Canvas Runner", dec!(49.90)),
        ("Trail Hiker", dec!(89.00)),
        ("City Loafer", dec!(74.50)),
    ]
    .into_iter()
    .enumerate()
    {
        let mut form = ProductForm {
            title: title.into(),
            basic_price: Some(price),
            category_id: sneakers.id,
            description: format!("{title} from the demo catalog."),
            sold_count: (index as i32 + 1) * 12,
            ..ProductForm::default()
        };
        if let Some(value) = colors.get(index) {
            form.attributes.insert(color.id, value.id);
        }
        let product = services.products.create(footwear.id, &form).await?;

        for (suffix, size) in [(1, "40"), (2, "41"), (3, "42")] {
            services
                .variants
                .save(
                    None,
                    product.id,
                    &VariantForm {
                        sku_id: Some(suffix),
                        title: format!("{title} {size}"),
                        price_override: price,
                        quantity: 20,
                        quantity_allocated: 0,
                    },
                )
                .await?;
        }
        products.push(product.id);
    }

    services
        .collections
        .save(
            None,
            &CollectionForm {
                title: "Summer Picks".into(),
                products,
            },
            None,
        )
        .await?;

    drop(services);
    drain.await?;
    info!("Demo catalog created");
    Ok(())
}

fn category(title: &str, parent_id: i32) -> CategoryForm {
    CategoryForm {
        title: title.into(),
        parent_id,
    }
}
