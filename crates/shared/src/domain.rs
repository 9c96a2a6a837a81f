use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(BrandId);
id_newtype!(CategoryId);
id_newtype!(ProductId);

/// Catalog entity managed by one list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Brand,
    Category,
    Product,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Brand, EntityKind::Category, EntityKind::Product];

    /// Path segment used by dashboard routes (`/dashboard/brand`).
    pub fn slug(self) -> &'static str {
        match self {
            EntityKind::Brand => "brand",
            EntityKind::Category => "category",
            EntityKind::Product => "product",
        }
    }

    /// Path segment used by the JSON API (`/api/brands`).
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Brand => "brands",
            EntityKind::Category => "categories",
            EntityKind::Product => "products",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Brand => "Brand",
            EntityKind::Category => "Category",
            EntityKind::Product => "Product",
        }
    }

    /// Query parameter carrying the row selected for a destructive action.
    pub fn selection_param(self) -> &'static str {
        match self {
            EntityKind::Brand => "brandId",
            EntityKind::Category => "categoryId",
            EntityKind::Product => "productId",
        }
    }

    pub fn dashboard_path(self) -> String {
        format!("/dashboard/{}", self.slug())
    }

    /// Lists whose rows go stale when an entity of this kind changes.
    /// Product changes move the counts shown on brand and category rows.
    pub fn affected_lists(self) -> &'static [EntityKind] {
        match self {
            EntityKind::Brand => &[EntityKind::Brand, EntityKind::Product],
            EntityKind::Category => &[EntityKind::Category, EntityKind::Product],
            EntityKind::Product => &[EntityKind::Product, EntityKind::Brand, EntityKind::Category],
        }
    }

    pub fn from_slug(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == raw || kind.collection() == raw)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrandSummary {
    pub id: BrandId,
    pub name: String,
    pub image_url: Option<String>,
    pub product_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub product_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub brand_id: BrandId,
    pub brand_name: String,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub image_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Formats an integer amount of cents as `12.34`.
pub fn format_price(price_cents: i64) -> String {
    let sign = if price_cents < 0 { "-" } else { "" };
    let abs = price_cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Parses `12`, `12.3` or `12.34` into cents. Negative amounts and more
/// than two decimals are rejected.
pub fn parse_price(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let cents = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse::<i64>().ok()?,
    };
    whole.parse::<i64>().ok()?.checked_mul(100)?.checked_add(cents)
}
