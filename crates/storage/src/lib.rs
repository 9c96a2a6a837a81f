use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{BrandId, BrandSummary, CategoryId, CategorySummary, ProductId, ProductSummary},
    protocol::{BrandInput, CatalogOverview, CategoryInput, ProductInput},
};

mod listing;
mod seed;

pub use listing::{fold_name, CatalogEntity, EntityStore, ListFilter};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Integrity rule rejected by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    ForeignKey,
    Unique,
    Check,
}

/// Finds the constraint violation behind a storage error, if any.
pub fn constraint_violation(err: &anyhow::Error) -> Option<ConstraintViolation> {
    err.chain().find_map(|cause| {
        let sqlx::Error::Database(db) = cause.downcast_ref::<sqlx::Error>()? else {
            return None;
        };
        if db.is_foreign_key_violation() || db.message().contains("FOREIGN KEY constraint") {
            Some(ConstraintViolation::ForeignKey)
        } else if db.is_unique_violation() {
            Some(ConstraintViolation::Unique)
        } else if db.is_check_violation() {
            Some(ConstraintViolation::Check)
        } else {
            None
        }
    })
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every connection to `sqlite::memory:` opens its own empty database.
        let pool_options = if database_url.starts_with("sqlite::memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn overview(&self) -> Result<CatalogOverview> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM brands),
                (SELECT COUNT(*) FROM categories),
                (SELECT COUNT(*) FROM products)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(CatalogOverview {
            brands: non_negative(row.try_get::<i64, _>(0)?),
            categories: non_negative(row.try_get::<i64, _>(1)?),
            products: non_negative(row.try_get::<i64, _>(2)?),
        })
    }

    pub async fn create_brand(&self, input: &BrandInput) -> Result<BrandId> {
        let rec = sqlx::query(
            "INSERT INTO brands (name, name_folded, image_url) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&input.name)
        .bind(fold_name(&input.name))
        .bind(input.image_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert brand '{}'", input.name))?;
        Ok(BrandId(rec.get::<i64, _>(0)))
    }

    /// Returns `false` when no brand has the given id.
    pub async fn update_brand(&self, brand_id: BrandId, input: &BrandInput) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE brands
             SET name = ?, name_folded = ?, image_url = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(&input.name)
        .bind(fold_name(&input.name))
        .bind(input.image_url.as_deref())
        .bind(brand_id.0)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update brand {brand_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_brand(&self, brand_id: BrandId) -> Result<Option<BrandSummary>> {
        EntityStore::<BrandSummary>::find_by_id(self, brand_id.0).await
    }

    pub async fn brand_exists(&self, brand_id: BrandId) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM brands WHERE id = ?)")
            .bind(brand_id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists != 0)
    }

    pub async fn create_category(&self, input: &CategoryInput) -> Result<CategoryId> {
        let rec =
            sqlx::query("INSERT INTO categories (name, name_folded) VALUES (?, ?) RETURNING id")
                .bind(&input.name)
                .bind(fold_name(&input.name))
                .fetch_one(&self.pool)
                .await
                .with_context(|| format!("failed to insert category '{}'", input.name))?;
        Ok(CategoryId(rec.get::<i64, _>(0)))
    }

    pub async fn update_category(
        &self,
        category_id: CategoryId,
        input: &CategoryInput,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE categories
             SET name = ?, name_folded = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(&input.name)
        .bind(fold_name(&input.name))
        .bind(category_id.0)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update category {category_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_category(&self, category_id: CategoryId) -> Result<Option<CategorySummary>> {
        EntityStore::<CategorySummary>::find_by_id(self, category_id.0).await
    }

    pub async fn category_exists(&self, category_id: CategoryId) -> Result<bool> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?)")
                .bind(category_id.0)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists != 0)
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<ProductId> {
        let rec = sqlx::query(
            "INSERT INTO products
                 (name, name_folded, description, price_cents, brand_id, category_id, image_url)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&input.name)
        .bind(fold_name(&input.name))
        .bind(input.description.as_deref())
        .bind(input.price_cents)
        .bind(input.brand_id.0)
        .bind(input.category_id.map(|c| c.0))
        .bind(input.image_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert product '{}'", input.name))?;
        Ok(ProductId(rec.get::<i64, _>(0)))
    }

    pub async fn update_product(
        &self,
        product_id: ProductId,
        input: &ProductInput,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE products
             SET name = ?, name_folded = ?, description = ?, price_cents = ?, brand_id = ?,
                 category_id = ?, image_url = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(&input.name)
        .bind(fold_name(&input.name))
        .bind(input.description.as_deref())
        .bind(input.price_cents)
        .bind(input.brand_id.0)
        .bind(input.category_id.map(|c| c.0))
        .bind(input.image_url.as_deref())
        .bind(product_id.0)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update product {product_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductSummary>> {
        EntityStore::<ProductSummary>::find_by_id(self, product_id.0).await
    }
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
