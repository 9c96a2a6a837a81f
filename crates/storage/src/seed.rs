use anyhow::{Context, Result};

use shared::protocol::{BrandInput, CategoryInput, ProductInput};

use crate::Storage;

const DEMO_BRANDS: &[&str] = &[
    "Acme", "Adidas", "Apple", "Bata", "Canon", "Dell", "Gucci", "Lenovo", "Nike", "Puma",
    "Samsung", "Sony",
];

const DEMO_CATEGORIES: &[&str] = &["Electronics", "Footwear", "Fashion", "Cameras"];

const DEMO_PRODUCTS: &[(&str, &str, Option<&str>, i64)] = &[
    ("Air Zoom Pegasus", "Nike", Some("Footwear"), 12_000),
    ("Ultraboost Light", "Adidas", Some("Footwear"), 18_000),
    ("Suede Classic", "Puma", Some("Footwear"), 7_500),
    ("iPhone 15", "Apple", Some("Electronics"), 99_900),
    ("Galaxy S24", "Samsung", Some("Electronics"), 89_900),
    ("ThinkPad X1 Carbon", "Lenovo", Some("Electronics"), 149_900),
    ("XPS 13", "Dell", Some("Electronics"), 119_900),
    ("EOS R6", "Canon", Some("Cameras"), 249_900),
    ("Alpha 7 IV", "Sony", Some("Cameras"), 249_800),
    ("Horsebit Loafer", "Gucci", Some("Fashion"), 95_000),
    ("Power Sandal", "Bata", None, 2_500),
];

impl Storage {
    /// Fills an empty catalog with demo rows. Returns how many brands were
    /// inserted; zero when the catalog already had data.
    pub async fn seed_demo_catalog(&self) -> Result<usize> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brands")
            .fetch_one(self.pool())
            .await?;
        if existing > 0 {
            return Ok(0);
        }

        let mut brand_ids = Vec::with_capacity(DEMO_BRANDS.len());
        for name in DEMO_BRANDS {
            let slug = name.to_ascii_lowercase();
            let id = self
                .create_brand(&BrandInput {
                    name: (*name).to_string(),
                    image_url: Some(format!("/static/brands/{slug}.png")),
                })
                .await?;
            brand_ids.push((*name, id));
        }

        let mut category_ids = Vec::with_capacity(DEMO_CATEGORIES.len());
        for name in DEMO_CATEGORIES {
            let id = self
                .create_category(&CategoryInput {
                    name: (*name).to_string(),
                })
                .await?;
            category_ids.push((*name, id));
        }

        for (name, brand, category, price_cents) in DEMO_PRODUCTS {
            let brand_id = brand_ids
                .iter()
                .find(|(n, _)| n == brand)
                .map(|(_, id)| *id)
                .with_context(|| format!("demo brand '{brand}' missing"))?;
            let category_id = category.and_then(|category| {
                category_ids
                    .iter()
                    .find(|(n, _)| *n == category)
                    .map(|(_, id)| *id)
            });
            self.create_product(&ProductInput {
                name: (*name).to_string(),
                description: None,
                price_cents: *price_cents,
                brand_id,
                category_id,
                image_url: None,
            })
            .await?;
        }

        Ok(brand_ids.len())
    }
}
