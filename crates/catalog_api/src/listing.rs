use shared::{
    domain::{BrandId, BrandSummary, ProductSummary},
    error::ApiError,
    pagination::{Page, Window},
    query::ListQuery,
};
use storage::{EntityStore, ListFilter};

use crate::{internal, ApiContext};

/// Reads one page of `T` for the decoded list state.
pub async fn fetch_page<T, S>(store: &S, query: &ListQuery) -> Result<Page<T>, ApiError>
where
    T: Send + 'static,
    S: EntityStore<T> + ?Sized,
{
    fetch_page_filtered(store, ListFilter::from_query(query), query).await
}

/// Like [`fetch_page`] with an extra scope on top of the search predicate.
/// The same `filter` drives both the count and the row read.
pub async fn fetch_page_filtered<T, S>(
    store: &S,
    filter: ListFilter,
    query: &ListQuery,
) -> Result<Page<T>, ApiError>
where
    T: Send + 'static,
    S: EntityStore<T> + ?Sized,
{
    let window = Window::for_query(query);
    let (rows, total_count) = store
        .find_page(&filter, query.sort, window)
        .await
        .map_err(internal)?;
    Ok(Page::new(rows, total_count, query))
}

/// Products of one brand, with the brand itself for page headings.
pub async fn fetch_brand_products(
    ctx: &ApiContext,
    brand_id: BrandId,
    query: &ListQuery,
) -> Result<(BrandSummary, Page<ProductSummary>), ApiError> {
    let brand = ctx
        .storage
        .get_brand(brand_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("Brand not found"))?;
    let filter = ListFilter::from_query(query).with_brand(brand_id);
    let page = fetch_page_filtered(&ctx.storage, filter, query).await?;
    Ok((brand, page))
}

#[cfg(test)]
#[path = "tests/listing_tests.rs"]
mod tests;
