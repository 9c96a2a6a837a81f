use shared::{
    domain::{
        BrandId, BrandSummary, CategoryId, CategorySummary, EntityKind, ProductId, ProductSummary,
    },
    error::{ApiError, ErrorCode},
    protocol::{BrandInput, CategoryInput, MutationResponse, ProductInput},
};
use storage::{constraint_violation, ConstraintViolation, EntityStore};
use tracing::{info, warn};

use crate::{
    internal,
    validation::{validate_brand, validate_category, validate_product},
    ApiContext,
};

pub async fn create_brand(ctx: &ApiContext, input: &BrandInput) -> Result<BrandId, ApiError> {
    let input = validate_brand(input)?;
    let brand_id = ctx
        .storage
        .create_brand(&input)
        .await
        .map_err(|e| store_error(EntityKind::Brand, &input.name, e))?;
    info!(entity = %EntityKind::Brand, id = brand_id.0, "created");
    Ok(brand_id)
}

pub async fn update_brand(
    ctx: &ApiContext,
    brand_id: BrandId,
    input: &BrandInput,
) -> Result<MutationResponse, ApiError> {
    let input = validate_brand(input)?;
    let updated = ctx
        .storage
        .update_brand(brand_id, &input)
        .await
        .map_err(|e| store_error(EntityKind::Brand, &input.name, e))?;
    if !updated {
        return Err(not_found(EntityKind::Brand));
    }
    info!(entity = %EntityKind::Brand, id = brand_id.0, "updated");
    Ok(MutationResponse::new("Brand updated"))
}

pub async fn delete_brand(
    ctx: &ApiContext,
    brand_id: BrandId,
) -> Result<MutationResponse, ApiError> {
    delete_entity::<BrandSummary>(ctx, brand_id.0).await
}

pub async fn get_brand(ctx: &ApiContext, brand_id: BrandId) -> Result<BrandSummary, ApiError> {
    ctx.storage
        .get_brand(brand_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(EntityKind::Brand))
}

pub async fn create_category(
    ctx: &ApiContext,
    input: &CategoryInput,
) -> Result<CategoryId, ApiError> {
    let input = validate_category(input)?;
    let category_id = ctx
        .storage
        .create_category(&input)
        .await
        .map_err(|e| store_error(EntityKind::Category, &input.name, e))?;
    info!(entity = %EntityKind::Category, id = category_id.0, "created");
    Ok(category_id)
}

pub async fn update_category(
    ctx: &ApiContext,
    category_id: CategoryId,
    input: &CategoryInput,
) -> Result<MutationResponse, ApiError> {
    let input = validate_category(input)?;
    let updated = ctx
        .storage
        .update_category(category_id, &input)
        .await
        .map_err(|e| store_error(EntityKind::Category, &input.name, e))?;
    if !updated {
        return Err(not_found(EntityKind::Category));
    }
    info!(entity = %EntityKind::Category, id = category_id.0, "updated");
    Ok(MutationResponse::new("Category updated"))
}

pub async fn delete_category(
    ctx: &ApiContext,
    category_id: CategoryId,
) -> Result<MutationResponse, ApiError> {
    delete_entity::<CategorySummary>(ctx, category_id.0).await
}

pub async fn get_category(
    ctx: &ApiContext,
    category_id: CategoryId,
) -> Result<CategorySummary, ApiError> {
    ctx.storage
        .get_category(category_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(EntityKind::Category))
}

pub async fn create_product(ctx: &ApiContext, input: &ProductInput) -> Result<ProductId, ApiError> {
    let input = validate_product(input)?;
    ensure_product_references(ctx, &input).await?;
    let product_id = ctx
        .storage
        .create_product(&input)
        .await
        .map_err(|e| store_error(EntityKind::Product, &input.name, e))?;
    info!(entity = %EntityKind::Product, id = product_id.0, "created");
    Ok(product_id)
}

pub async fn update_product(
    ctx: &ApiContext,
    product_id: ProductId,
    input: &ProductInput,
) -> Result<MutationResponse, ApiError> {
    let input = validate_product(input)?;
    ensure_product_references(ctx, &input).await?;
    let updated = ctx
        .storage
        .update_product(product_id, &input)
        .await
        .map_err(|e| store_error(EntityKind::Product, &input.name, e))?;
    if !updated {
        return Err(not_found(EntityKind::Product));
    }
    info!(entity = %EntityKind::Product, id = product_id.0, "updated");
    Ok(MutationResponse::new("Product updated"))
}

pub async fn delete_product(
    ctx: &ApiContext,
    product_id: ProductId,
) -> Result<MutationResponse, ApiError> {
    delete_entity::<ProductSummary>(ctx, product_id.0).await
}

pub async fn get_product(
    ctx: &ApiContext,
    product_id: ProductId,
) -> Result<ProductSummary, ApiError> {
    ctx.storage
        .get_product(product_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(EntityKind::Product))
}

/// Deletes by kind, for callers that only hold the raw selection id.
pub async fn delete(
    ctx: &ApiContext,
    kind: EntityKind,
    id: i64,
) -> Result<MutationResponse, ApiError> {
    match kind {
        EntityKind::Brand => delete_brand(ctx, BrandId(id)).await,
        EntityKind::Category => delete_category(ctx, CategoryId(id)).await,
        EntityKind::Product => delete_product(ctx, ProductId(id)).await,
    }
}

async fn delete_entity<T>(ctx: &ApiContext, id: i64) -> Result<MutationResponse, ApiError>
where
    T: storage::CatalogEntity,
{
    let kind = T::KIND;
    let deleted = EntityStore::<T>::delete(&ctx.storage, id)
        .await
        .map_err(|err| match constraint_violation(&err) {
            Some(ConstraintViolation::ForeignKey) => {
                warn!(entity = %kind, id, "delete blocked by dependent products");
                ApiError::new(
                    ErrorCode::Conflict,
                    format!("{} still has products and cannot be deleted", kind.label()),
                )
            }
            _ => internal(err),
        })?;
    if !deleted {
        return Err(not_found(kind));
    }
    info!(entity = %kind, id, "deleted");
    Ok(MutationResponse::new(format!("{} deleted", kind.label())))
}

async fn ensure_product_references(ctx: &ApiContext, input: &ProductInput) -> Result<(), ApiError> {
    if !ctx
        .storage
        .brand_exists(input.brand_id)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::validation(format!(
            "Brand {} does not exist",
            input.brand_id
        )));
    }
    if let Some(category_id) = input.category_id {
        if !ctx
            .storage
            .category_exists(category_id)
            .await
            .map_err(internal)?
        {
            return Err(ApiError::validation(format!(
                "Category {category_id} does not exist"
            )));
        }
    }
    Ok(())
}

fn store_error(kind: EntityKind, name: &str, err: anyhow::Error) -> ApiError {
    match constraint_violation(&err) {
        Some(ConstraintViolation::Unique) => ApiError::new(
            ErrorCode::Conflict,
            format!(
                "A {} named '{name}' already exists",
                kind.label().to_ascii_lowercase()
            ),
        ),
        Some(ConstraintViolation::ForeignKey) => ApiError::validation(format!(
            "{} references a missing record",
            kind.label()
        )),
        Some(ConstraintViolation::Check) => {
            ApiError::validation(format!("{} violates a catalog rule", kind.label()))
        }
        None => internal(err),
    }
}

fn not_found(kind: EntityKind) -> ApiError {
    ApiError::not_found(format!("{} not found", kind.label()))
}

#[cfg(test)]
#[path = "tests/mutations_tests.rs"]
mod tests;
