use shared::{
    error::{ApiError, ErrorCode},
    protocol::CatalogOverview,
};
use storage::Storage;
use tracing::error;

pub mod listing;
pub mod mutations;
pub mod validation;

pub use listing::{fetch_brand_products, fetch_page, fetch_page_filtered};

/// Mutations here never signal invalidation themselves; callers decide which
/// cached lists to drop once an operation succeeds.
#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

impl ApiContext {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

pub async fn overview(ctx: &ApiContext) -> Result<CatalogOverview, ApiError> {
    ctx.storage.overview().await.map_err(internal)
}

pub async fn health(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.storage.health_check().await.map_err(internal)
}

pub(crate) fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "catalog store operation failed");
    ApiError::new(ErrorCode::Internal, err.to_string())
}
