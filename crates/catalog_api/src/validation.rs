//! Input checks run before anything reaches the store.

use shared::{
    domain::EntityKind,
    error::ApiError,
    protocol::{BrandInput, CategoryInput, ProductInput},
};

pub const MAX_NAME_CHARS: usize = 80;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

pub fn validate_name(kind: EntityKind, raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::validation(format!("{} name is required", kind.label())));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::validation(format!(
            "{} name must be at most {MAX_NAME_CHARS} characters",
            kind.label()
        )));
    }
    Ok(name.to_string())
}

/// Blank becomes `None`; otherwise an absolute http(s) URL or a site path.
pub fn validate_image_url(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.starts_with('/') && !value.starts_with("//") {
        return Ok(Some(value.to_string()));
    }
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(Some(value.to_string())),
        _ => Err(ApiError::validation(
            "Image URL must be an http(s) URL or a path starting with /",
        )),
    }
}

pub fn validate_brand(input: &BrandInput) -> Result<BrandInput, ApiError> {
    Ok(BrandInput {
        name: validate_name(EntityKind::Brand, &input.name)?,
        image_url: validate_image_url(input.image_url.as_deref())?,
    })
}

pub fn validate_category(input: &CategoryInput) -> Result<CategoryInput, ApiError> {
    Ok(CategoryInput {
        name: validate_name(EntityKind::Category, &input.name)?,
    })
}

/// Shape checks only; brand/category existence is checked against the store.
pub fn validate_product(input: &ProductInput) -> Result<ProductInput, ApiError> {
    if input.price_cents < 0 {
        return Err(ApiError::validation("Price cannot be negative"));
    }
    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS) {
        return Err(ApiError::validation(format!(
            "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(ProductInput {
        name: validate_name(EntityKind::Product, &input.name)?,
        description: description.map(str::to_string),
        price_cents: input.price_cents,
        brand_id: input.brand_id,
        category_id: input.category_id,
        image_url: validate_image_url(input.image_url.as_deref())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn trims_and_requires_names() {
        assert_eq!(validate_name(EntityKind::Brand, "  Nike ").expect("valid"), "Nike");
        let err = validate_name(EntityKind::Brand, "   ").expect_err("invalid");
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "Brand name is required");
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "x".repeat(MAX_NAME_CHARS + 1);
        assert!(validate_name(EntityKind::Category, &long).is_err());
        assert!(validate_name(EntityKind::Category, &long[1..]).is_ok());
    }

    #[test]
    fn image_urls_must_be_http_or_site_paths() {
        assert_eq!(validate_image_url(None).expect("valid"), None);
        assert_eq!(validate_image_url(Some("  ")).expect("valid"), None);
        assert_eq!(
            validate_image_url(Some("/static/a.png")).expect("valid").as_deref(),
            Some("/static/a.png")
        );
        assert!(validate_image_url(Some("https://cdn.example.com/a.png")).is_ok());
        assert!(validate_image_url(Some("javascript:alert(1)")).is_err());
        assert!(validate_image_url(Some("//evil.example.com/a.png")).is_err());
        assert!(validate_image_url(Some("not a url")).is_err());
    }

    #[test]
    fn negative_prices_are_rejected() {
        let input = ProductInput {
            name: "Sock".into(),
            description: Some("  ".into()),
            price_cents: -1,
            brand_id: shared::domain::BrandId(1),
            category_id: None,
            image_url: None,
        };
        assert!(validate_product(&input).is_err());

        let ok = validate_product(&ProductInput {
            price_cents: 0,
            ..input
        })
        .expect("valid");
        assert_eq!(ok.description, None);
    }
}
