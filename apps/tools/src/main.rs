use anyhow::{anyhow, Result};
use catalog_api::{mutations, ApiContext};
use clap::{Parser, Subcommand};
use shared::{
    domain::{parse_price, BrandId, CategoryId, EntityKind},
    protocol::{BrandInput, CategoryInput, ProductInput},
};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/catalog.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    SeedDemo,
    Stats,
    CreateBrand {
        name: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    CreateCategory {
        name: String,
    },
    CreateProduct {
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        brand_id: i64,
        #[arg(long)]
        category_id: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        kind: String,
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = ApiContext::new(Storage::new(&cli.database_url).await?);

    match cli.command {
        Command::SeedDemo => {
            let inserted = ctx.storage.seed_demo_catalog().await?;
            println!("seeded {inserted} brands");
        }
        Command::Stats => {
            let overview = catalog_api::overview(&ctx).await?;
            println!(
                "brands={} categories={} products={}",
                overview.brands, overview.categories, overview.products
            );
        }
        Command::CreateBrand { name, image_url } => {
            let brand_id = mutations::create_brand(&ctx, &BrandInput { name, image_url }).await?;
            println!("created brand_id={brand_id}");
        }
        Command::CreateCategory { name } => {
            let category_id = mutations::create_category(&ctx, &CategoryInput { name }).await?;
            println!("created category_id={category_id}");
        }
        Command::CreateProduct {
            name,
            price,
            brand_id,
            category_id,
            description,
        } => {
            let price_cents = parse_price(&price)
                .ok_or_else(|| anyhow!("'{price}' is not an amount like 12.99"))?;
            let input = ProductInput {
                name,
                description,
                price_cents,
                brand_id: BrandId(brand_id),
                category_id: category_id.map(CategoryId),
                image_url: None,
            };
            let product_id = mutations::create_product(&ctx, &input).await?;
            println!("created product_id={product_id}");
        }
        Command::Delete { kind, id } => {
            let kind =
                EntityKind::from_slug(&kind).ok_or_else(|| anyhow!("unknown entity '{kind}'"))?;
            let response = mutations::delete(&ctx, kind, id).await?;
            println!("{}", response.success);
        }
    }

    Ok(())
}
