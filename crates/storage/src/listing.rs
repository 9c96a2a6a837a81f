//! Filtered, sorted, windowed reads shared by every catalog list.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqliteConnection};

use shared::{
    domain::{
        BrandId, BrandSummary, CategoryId, CategorySummary, EntityKind, ProductId, ProductSummary,
    },
    pagination::Window,
    query::{ListQuery, SortOrder},
};

use crate::Storage;

/// Predicate applied identically to the count and the row reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Case-insensitive substring of the entity name.
    pub search: Option<String>,
    /// Restricts products to one brand. Ignored by entities without a brand column.
    pub brand_id: Option<BrandId>,
}

impl ListFilter {
    pub fn from_query(query: &ListQuery) -> Self {
        Self {
            search: query.search.clone().filter(|s| !s.is_empty()),
            brand_id: None,
        }
    }

    pub fn with_brand(mut self, brand_id: BrandId) -> Self {
        self.brand_id = Some(brand_id);
        self
    }
}

/// Read/delete capability over one kind of catalog row.
#[async_trait]
pub trait EntityStore<T>: Send + Sync
where
    T: Send + 'static,
{
    async fn find_many(&self, filter: &ListFilter, order: SortOrder, window: Window)
        -> Result<Vec<T>>;

    async fn count(&self, filter: &ListFilter) -> Result<u64>;

    /// Rows for `window` plus the total matching `filter`. Implementations may
    /// read both from one snapshot; the default issues two independent reads.
    async fn find_page(
        &self,
        filter: &ListFilter,
        order: SortOrder,
        window: Window,
    ) -> Result<(Vec<T>, u64)> {
        let total = self.count(filter).await?;
        let rows = self.find_many(filter, order, window).await?;
        Ok((rows, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<T>>;

    /// Returns `false` when nothing matched `id`.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQL shape of a catalog table.
pub trait CatalogEntity: Sized + Send + Unpin + 'static {
    const KIND: EntityKind;
    const TABLE: &'static str;
    const COLUMNS: &'static str;
    const FROM: &'static str;
    const ID_COLUMN: &'static str;
    /// Unicode-lowercased copy of the name, see [`fold_name`].
    const FOLDED_NAME_COLUMN: &'static str;
    const BRAND_COLUMN: Option<&'static str> = None;

    fn from_row(row: &SqliteRow) -> Result<Self>;
}

impl CatalogEntity for BrandSummary {
    const KIND: EntityKind = EntityKind::Brand;
    const TABLE: &'static str = "brands";
    const COLUMNS: &'static str = "b.id, b.name, b.image_url, b.created_at, b.updated_at,
        (SELECT COUNT(*) FROM products p WHERE p.brand_id = b.id) AS product_count";
    const FROM: &'static str = "brands b";
    const ID_COLUMN: &'static str = "b.id";
    const FOLDED_NAME_COLUMN: &'static str = "b.name_folded";

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: BrandId(row.try_get("id")?),
            name: row.try_get("name")?,
            image_url: row.try_get("image_url")?,
            product_count: row.try_get("product_count")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

impl CatalogEntity for CategorySummary {
    const KIND: EntityKind = EntityKind::Category;
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static str = "c.id, c.name, c.created_at, c.updated_at,
        (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count";
    const FROM: &'static str = "categories c";
    const ID_COLUMN: &'static str = "c.id";
    const FOLDED_NAME_COLUMN: &'static str = "c.name_folded";

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: CategoryId(row.try_get("id")?),
            name: row.try_get("name")?,
            product_count: row.try_get("product_count")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

impl CatalogEntity for ProductSummary {
    const KIND: EntityKind = EntityKind::Product;
    const TABLE: &'static str = "products";
    const COLUMNS: &'static str = "p.id, p.name, p.description, p.price_cents, p.brand_id,
        b.name AS brand_name, p.category_id, c.name AS category_name, p.image_url,
        p.created_at, p.updated_at";
    const FROM: &'static str = "products p
        INNER JOIN brands b ON b.id = p.brand_id
        LEFT JOIN categories c ON c.id = p.category_id";
    const ID_COLUMN: &'static str = "p.id";
    const FOLDED_NAME_COLUMN: &'static str = "p.name_folded";
    const BRAND_COLUMN: Option<&'static str> = Some("p.brand_id");

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: ProductId(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price_cents: row.try_get("price_cents")?,
            brand_id: BrandId(row.try_get("brand_id")?),
            brand_name: row.try_get("brand_name")?,
            category_id: row.try_get::<Option<i64>, _>("category_id")?.map(CategoryId),
            category_name: row.try_get("category_name")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

/// Case folding used for stored names and search text alike. SQLite's own
/// `lower()` and `NOCASE` only fold ASCII.
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

fn push_filter<T: CatalogEntity>(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ListFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        // instr keeps `%` and `_` in the search text literal.
        builder
            .push(" AND instr(")
            .push(T::FOLDED_NAME_COLUMN)
            .push(", ")
            .push_bind(fold_name(search))
            .push(") > 0");
    }
    if let (Some(column), Some(brand_id)) = (T::BRAND_COLUMN, filter.brand_id) {
        builder
            .push(" AND ")
            .push(column)
            .push(" = ")
            .push_bind(brand_id.0);
    }
}

fn push_order<T: CatalogEntity>(builder: &mut QueryBuilder<'_, Sqlite>, order: SortOrder) {
    let direction = match order {
        SortOrder::None => {
            builder.push(" ORDER BY ").push(T::ID_COLUMN).push(" ASC");
            return;
        }
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    builder
        .push(" ORDER BY ")
        .push(T::FOLDED_NAME_COLUMN)
        .push(" ")
        .push(direction)
        .push(", ")
        .push(T::ID_COLUMN)
        .push(" ASC");
}

async fn fetch_rows<T: CatalogEntity>(
    conn: &mut SqliteConnection,
    filter: &ListFilter,
    order: SortOrder,
    window: Window,
) -> Result<Vec<T>> {
    let mut builder =
        QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM {}", T::COLUMNS, T::FROM));
    push_filter::<T>(&mut builder, filter);
    push_order::<T>(&mut builder, order);
    builder
        .push(" LIMIT ")
        .push_bind(i64::from(window.take))
        .push(" OFFSET ")
        .push_bind(i64::try_from(window.skip).unwrap_or(i64::MAX));

    let rows = builder
        .build()
        .fetch_all(&mut *conn)
        .await
        .with_context(|| format!("failed to list {}", T::TABLE))?;
    rows.iter().map(T::from_row).collect()
}

async fn count_rows<T: CatalogEntity>(
    conn: &mut SqliteConnection,
    filter: &ListFilter,
) -> Result<u64> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", T::FROM));
    push_filter::<T>(&mut builder, filter);
    let total: i64 = builder
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to count {}", T::TABLE))?;
    Ok(u64::try_from(total).unwrap_or(0))
}

#[async_trait]
impl<T: CatalogEntity> EntityStore<T> for Storage {
    async fn find_many(
        &self,
        filter: &ListFilter,
        order: SortOrder,
        window: Window,
    ) -> Result<Vec<T>> {
        let mut conn = self.pool().acquire().await?;
        fetch_rows::<T>(&mut conn, filter, order, window).await
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64> {
        let mut conn = self.pool().acquire().await?;
        count_rows::<T>(&mut conn, filter).await
    }

    /// Both reads run inside one transaction so the total and the rows come
    /// from the same snapshot.
    async fn find_page(
        &self,
        filter: &ListFilter,
        order: SortOrder,
        window: Window,
    ) -> Result<(Vec<T>, u64)> {
        let mut tx = self.pool().begin().await?;
        let total = count_rows::<T>(&mut tx, filter).await?;
        let rows = fetch_rows::<T>(&mut tx, filter, order, window).await?;
        tx.commit().await?;
        Ok((rows, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<T>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM {} WHERE {} = ",
            T::COLUMNS,
            T::FROM,
            T::ID_COLUMN
        ));
        builder.push_bind(id);
        let row = builder
            .build()
            .fetch_optional(self.pool())
            .await
            .with_context(|| format!("failed to load {} {id}", T::KIND))?;
        row.as_ref().map(T::from_row).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", T::TABLE))
            .bind(id)
            .execute(self.pool())
            .await
            .with_context(|| format!("failed to delete {} {id}", T::KIND))?;
        Ok(result.rows_affected() > 0)
    }
}
