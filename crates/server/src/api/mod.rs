//! JSON surface under `/api`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, RawQuery, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use catalog_api::{fetch_brand_products, fetch_page, mutations};
use dashboard_core::Invalidate;
use shared::{
    domain::{
        BrandId, BrandSummary, CategoryId, CategorySummary, EntityKind, ProductId, ProductSummary,
    },
    error::{ApiError, ErrorCode},
    pagination::Page,
    protocol::{
        BrandInput, BrandProducts, CatalogOverview, CategoryInput, CreatedResponse,
        MutationResponse, ProductInput,
    },
    query::ListQuery,
};

use crate::app_state::AppState;

pub(crate) type ApiRejection = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<Json<T>, ApiRejection>;
type Created = Result<(StatusCode, Json<CreatedResponse>), ApiRejection>;

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> ApiRejection {
    (status_for(err.code), Json(err))
}

/// Request body extractor whose rejection is an [`ApiError`] body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ExtractRejection))]
struct ApiJson<T>(T);

/// Path extractor whose rejection is an [`ApiError`] body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ExtractRejection))]
struct ApiPath<T>(T);

/// Malformed body or path, keeping axum's status and message.
#[derive(Debug)]
struct ExtractRejection {
    status: StatusCode,
    error: ApiError,
}

impl From<JsonRejection> for ExtractRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            error: ApiError::validation(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for ExtractRejection {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: rejection.status(),
            error: ApiError::validation(rejection.body_text()),
        }
    }
}

impl IntoResponse for ExtractRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

pub(crate) fn list_query(raw: Option<&str>) -> ListQuery {
    ListQuery::from_query_str(raw.unwrap_or_default())
}

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/overview", get(overview))
        .route("/api/brands", get(list_brands).post(create_brand))
        .route(
            "/api/brands/:id",
            get(get_brand).put(update_brand).delete(delete_brand),
        )
        .route("/api/brands/:id/products", get(brand_products))
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn overview(State(state): State<Arc<AppState>>) -> ApiResult<CatalogOverview> {
    let overview = catalog_api::overview(&state.api).await.map_err(reject)?;
    Ok(Json(overview))
}

async fn list_brands(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Page<BrandSummary>> {
    let page = fetch_page(&state.api.storage, &list_query(raw.as_deref()))
        .await
        .map_err(reject)?;
    Ok(Json(page))
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Page<CategorySummary>> {
    let page = fetch_page(&state.api.storage, &list_query(raw.as_deref()))
        .await
        .map_err(reject)?;
    Ok(Json(page))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Page<ProductSummary>> {
    let page = fetch_page(&state.api.storage, &list_query(raw.as_deref()))
        .await
        .map_err(reject)?;
    Ok(Json(page))
}

async fn brand_products(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    RawQuery(raw): RawQuery,
) -> ApiResult<BrandProducts> {
    let query = list_query(raw.as_deref());
    let (brand, products) = fetch_brand_products(&state.api, BrandId(id), &query)
        .await
        .map_err(reject)?;
    Ok(Json(BrandProducts { brand, products }))
}

async fn get_brand(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<BrandSummary> {
    let brand = mutations::get_brand(&state.api, BrandId(id))
        .await
        .map_err(reject)?;
    Ok(Json(brand))
}

async fn get_category(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<CategorySummary> {
    let category = mutations::get_category(&state.api, CategoryId(id))
        .await
        .map_err(reject)?;
    Ok(Json(category))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<ProductSummary> {
    let product = mutations::get_product(&state.api, ProductId(id))
        .await
        .map_err(reject)?;
    Ok(Json(product))
}

async fn create_brand(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<BrandInput>,
) -> Created {
    let id = mutations::create_brand(&state.api, &input)
        .await
        .map_err(reject)?;
    Ok(created(&state, EntityKind::Brand, id.0))
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Created {
    let id = mutations::create_category(&state.api, &input)
        .await
        .map_err(reject)?;
    Ok(created(&state, EntityKind::Category, id.0))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Created {
    let id = mutations::create_product(&state.api, &input)
        .await
        .map_err(reject)?;
    Ok(created(&state, EntityKind::Product, id.0))
}

async fn update_brand(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<BrandInput>,
) -> ApiResult<MutationResponse> {
    let response = mutations::update_brand(&state.api, BrandId(id), &input)
        .await
        .map_err(reject)?;
    Ok(changed(&state, EntityKind::Brand, response))
}

async fn update_category(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<MutationResponse> {
    let response = mutations::update_category(&state.api, CategoryId(id), &input)
        .await
        .map_err(reject)?;
    Ok(changed(&state, EntityKind::Category, response))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<MutationResponse> {
    let response = mutations::update_product(&state.api, ProductId(id), &input)
        .await
        .map_err(reject)?;
    Ok(changed(&state, EntityKind::Product, response))
}

async fn delete_brand(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<MutationResponse> {
    remove(&state, EntityKind::Brand, id).await
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<MutationResponse> {
    remove(&state, EntityKind::Category, id).await
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<MutationResponse> {
    remove(&state, EntityKind::Product, id).await
}

async fn remove(state: &AppState, kind: EntityKind, id: i64) -> ApiResult<MutationResponse> {
    let response = mutations::delete(&state.api, kind, id)
        .await
        .map_err(reject)?;
    Ok(changed(state, kind, response))
}

fn created(state: &AppState, kind: EntityKind, id: i64) -> (StatusCode, Json<CreatedResponse>) {
    state.events.invalidate_after_change(kind);
    (
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            success: format!("{} created", kind.label()),
        }),
    )
}

fn changed(
    state: &AppState,
    kind: EntityKind,
    response: MutationResponse,
) -> Json<MutationResponse> {
    state.events.invalidate_after_change(kind);
    Json(response)
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
