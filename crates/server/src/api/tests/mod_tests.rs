use super::*;
use axum::{
    body::{self, Body},
    http::{header, Method, Request},
    response::Response,
};
use catalog_api::ApiContext;
use serde::de::DeserializeOwned;
use shared::protocol::CatalogEvent;
use storage::Storage;
use tower::ServiceExt;

use crate::build_router;

async fn test_app() -> (Router, Arc<AppState>) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let state = Arc::new(AppState::new(ApiContext::new(storage)));
    (build_router(Arc::clone(&state), 64 * 1024), state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: &str,
    body: &str,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

async fn create(app: &Router, collection: &str, body: serde_json::Value) -> i64 {
    let response = send(app, Method::POST, &format!("/api/{collection}"), Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json::<CreatedResponse>(response).await.id
}

#[test]
fn error_codes_map_to_statuses() {
    assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_for(ErrorCode::Validation), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(status_for(ErrorCode::Conflict), StatusCode::CONFLICT);
    assert_eq!(status_for(ErrorCode::Internal), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn list_honours_search_sort_and_paging() {
    let (app, _state) = test_app().await;
    for name in ["Puma", "Nike", "New Balance", "Asics"] {
        create(&app, "brands", serde_json::json!({ "name": name })).await;
    }

    let response = send(&app, Method::GET, "/api/brands?search=N&sort=desc&perPage=2", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Page<BrandSummary> = json(response).await;
    assert_eq!(page.total_count, 2);
    assert_eq!(page.total_pages, 1);
    let names: Vec<_> = page.rows.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["Nike", "New Balance"]);

    // Malformed params fall back to defaults.
    let page: Page<BrandSummary> =
        json(send(&app, Method::GET, "/api/brands?page=abc&perPage=-3", None).await).await;
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 5);
    assert_eq!(page.rows.len(), 4);
}

#[tokio::test]
async fn create_returns_created_and_announces_invalidation() {
    let (app, state) = test_app().await;
    let mut events = state.events.subscribe();

    let response = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(serde_json::json!({ "name": "Running" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: CreatedResponse = json(response).await;
    assert_eq!(created.success, "Category created");

    let mut invalidated = Vec::new();
    while let Ok(CatalogEvent::ListInvalidated { entity }) = events.try_recv() {
        invalidated.push(entity);
    }
    assert_eq!(invalidated, EntityKind::Category.affected_lists());
}

#[tokio::test]
async fn validation_and_duplicates_are_rejected_with_codes() {
    let (app, _state) = test_app().await;
    create(&app, "brands", serde_json::json!({ "name": "Nike" })).await;

    let response = send(
        &app,
        Method::POST,
        "/api/brands",
        Some(serde_json::json!({ "name": "  " })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: ApiError = json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);

    let response = send(
        &app,
        Method::POST,
        "/api/brands",
        Some(serde_json::json!({ "name": "Nike" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let err: ApiError = json(response).await;
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn referenced_brand_cannot_be_deleted_until_products_go() {
    let (app, state) = test_app().await;
    let brand = create(&app, "brands", serde_json::json!({ "name": "Nike" })).await;
    let product = create(
        &app,
        "products",
        serde_json::json!({ "name": "Pegasus", "price_cents": 12999, "brand_id": brand }),
    )
    .await;

    let mut events = state.events.subscribe();
    let response = send(&app, Method::DELETE, &format!("/api/brands/{brand}"), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let err: ApiError = json(response).await;
    assert_eq!(err.message, "Brand still has products and cannot be deleted");
    assert!(events.try_recv().is_err());

    let response = send(&app, Method::DELETE, &format!("/api/products/{product}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: MutationResponse = json(response).await;
    assert_eq!(body.success, "Product deleted");

    let response = send(&app, Method::DELETE, &format!("/api/brands/{brand}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, Method::DELETE, &format!("/api/brands/{brand}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_changes_the_row() {
    let (app, _state) = test_app().await;
    let brand = create(&app, "brands", serde_json::json!({ "name": "Nike" })).await;

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/brands/{brand}"),
        Some(serde_json::json!({
            "name": "Nike Inc",
            "image_url": "https://img.example/nike.png",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched: BrandSummary =
        json(send(&app, Method::GET, &format!("/api/brands/{brand}"), None).await).await;
    assert_eq!(fetched.name, "Nike Inc");
    assert_eq!(fetched.image_url.as_deref(), Some("https://img.example/nike.png"));

    let missing = send(&app, Method::GET, "/api/categories/42", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn brand_products_are_paged_per_brand() {
    let (app, _state) = test_app().await;
    let nike = create(&app, "brands", serde_json::json!({ "name": "Nike" })).await;
    let puma = create(&app, "brands", serde_json::json!({ "name": "Puma" })).await;
    for (name, brand) in [("Pegasus", nike), ("Vomero", nike), ("Suede", puma)] {
        create(
            &app,
            "products",
            serde_json::json!({ "name": name, "price_cents": 100, "brand_id": brand }),
        )
        .await;
    }

    let response = send(
        &app,
        Method::GET,
        &format!("/api/brands/{nike}/products?sort=asc&perPage=1&page=2"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: BrandProducts = json(response).await;
    assert_eq!(body.brand.name, "Nike");
    assert_eq!(body.products.total_count, 2);
    assert_eq!(body.products.rows[0].name, "Vomero");

    let missing = send(&app, Method::GET, "/api/brands/999/products", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_get_json_error_bodies() {
    let (app, state) = test_app().await;
    let mut events = state.events.subscribe();

    let truncated = r#"{"name":"#;
    let response = send_raw(&app, Method::POST, "/api/brands", "application/json", truncated).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(!err.message.is_empty());

    let response = send_raw(&app, Method::POST, "/api/brands", "text/plain", "name=Nike").await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let err: ApiError = json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);

    let response = send(
        &app,
        Method::PUT,
        "/api/brands/nike",
        Some(serde_json::json!({ "name": "Nike" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);

    let response = send(&app, Method::GET, "/api/products/1.5", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);

    assert!(events.try_recv().is_err());
}
