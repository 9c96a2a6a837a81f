use serde::Deserialize;
use shared::{
    domain::{
        format_price, parse_price, BrandId, BrandSummary, CategoryId, CategorySummary,
        ProductSummary,
    },
    error::ApiError,
    protocol::{BrandInput, CategoryInput, ProductInput},
};

/// Raw create/edit form fields. Every kind posts the same shape and ignores
/// the fields it does not use.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct EntityForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub brand_id: String,
    #[serde(default)]
    pub category_id: String,
}

impl EntityForm {
    pub(crate) fn from_brand(brand: &BrandSummary) -> Self {
        Self {
            name: brand.name.clone(),
            image_url: brand.image_url.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    pub(crate) fn from_category(category: &CategorySummary) -> Self {
        Self {
            name: category.name.clone(),
            ..Self::default()
        }
    }

    pub(crate) fn from_product(product: &ProductSummary) -> Self {
        Self {
            name: product.name.clone(),
            image_url: product.image_url.clone().unwrap_or_default(),
            description: product.description.clone().unwrap_or_default(),
            price: format_price(product.price_cents),
            brand_id: product.brand_id.to_string(),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }

    pub(crate) fn brand_input(&self) -> BrandInput {
        BrandInput {
            name: self.name.clone(),
            image_url: non_empty(&self.image_url),
        }
    }

    pub(crate) fn category_input(&self) -> CategoryInput {
        CategoryInput {
            name: self.name.clone(),
        }
    }

    pub(crate) fn product_input(&self) -> Result<ProductInput, ApiError> {
        let price_cents = parse_price(&self.price)
            .ok_or_else(|| ApiError::validation("Price must be an amount like 12.99"))?;
        let brand_id = self
            .brand_id
            .trim()
            .parse::<i64>()
            .map(BrandId)
            .map_err(|_| ApiError::validation("Choose a brand"))?;
        let category_id = match non_empty(&self.category_id) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map(CategoryId)
                    .map_err(|_| ApiError::validation("Choose a valid category"))?,
            ),
            None => None,
        };
        Ok(ProductInput {
            name: self.name.clone(),
            description: non_empty(&self.description),
            price_cents,
            brand_id,
            category_id,
            image_url: non_empty(&self.image_url),
        })
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_form_parses_price_and_optional_category() {
        let form = EntityForm {
            name: "Pegasus".into(),
            price: "129.5".into(),
            brand_id: "3".into(),
            ..EntityForm::default()
        };
        let input = form.product_input().expect("valid");
        assert_eq!(input.price_cents, 12950);
        assert_eq!(input.brand_id, BrandId(3));
        assert_eq!(input.category_id, None);
        assert_eq!(input.description, None);
    }

    #[test]
    fn product_form_rejects_bad_price_and_missing_brand() {
        let form = EntityForm {
            name: "Pegasus".into(),
            price: "cheap".into(),
            brand_id: "3".into(),
            ..EntityForm::default()
        };
        assert_eq!(
            form.product_input().expect_err("price").message,
            "Price must be an amount like 12.99"
        );

        let form = EntityForm {
            price: "10".into(),
            brand_id: String::new(),
            ..form
        };
        assert_eq!(form.product_input().expect_err("brand").message, "Choose a brand");
    }
}
