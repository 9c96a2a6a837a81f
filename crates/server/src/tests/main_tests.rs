use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request, Response},
};
use shared::{
    domain::{BrandId, EntityKind},
    protocol::{BrandInput, CatalogEvent, ProductInput},
};
use tower::ServiceExt;

async fn test_app() -> (Router, Arc<AppState>) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let state = Arc::new(AppState::new(ApiContext::new(storage)));
    (build_router(Arc::clone(&state), 64 * 1024), state)
}

async fn add_brand(state: &AppState, name: &str) -> BrandId {
    state
        .api
        .storage
        .create_brand(&BrandInput {
            name: name.into(),
            image_url: None,
        })
        .await
        .expect("brand")
}

async fn add_product(state: &AppState, name: &str, brand_id: BrandId) {
    state
        .api
        .storage
        .create_product(&ProductInput {
            name: name.into(),
            description: None,
            price_cents: 9900,
            brand_id,
            category_id: None,
            image_url: None,
        })
        .await
        .expect("product");
}

async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn post_form(app: &Router, uri: &str, form: &str) -> Response<Body> {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn text(response: Response<Body>) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _state) = test_app().await;
    let response = get(&app, "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "ok");
}

#[tokio::test]
async fn list_page_renders_requested_window() {
    let (app, state) = test_app().await;
    for i in 1..=12 {
        add_brand(&state, &format!("Shoe Co {i:02}")).await;
    }
    add_brand(&state, "Hat Works").await;

    let html = text(get(&app, "/dashboard/brand?search=shoe&sort=asc&page=3").await).await;
    assert!(html.contains("Shoe Co 11"));
    assert!(html.contains("Shoe Co 12"));
    assert!(!html.contains("Shoe Co 10"));
    assert!(!html.contains("Hat Works"));
    assert!(html.contains("12 result(s), page 3 of 3"));
    assert!(!html.contains("<dialog"));

    let past_end = text(get(&app, "/dashboard/brand?search=shoe&page=4").await).await;
    assert!(past_end.contains("No results on this page."));
}

#[tokio::test]
async fn names_are_escaped() {
    let (app, state) = test_app().await;
    add_brand(&state, "<script>alert(1)</script>").await;
    let html = text(get(&app, "/dashboard/brand").await).await;
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!html.contains("<script>alert"));
}

#[tokio::test]
async fn selection_param_opens_the_confirmation_dialog() {
    let (app, state) = test_app().await;
    let brand_id = add_brand(&state, "Nike").await;
    let html = text(get(&app, &format!("/dashboard/brand?page=1&brandId={brand_id}")).await).await;
    assert!(html.contains("<dialog open"));
    assert!(html.contains(&format!("Delete Brand #{brand_id}?")));
}

#[tokio::test]
async fn confirmed_delete_redirects_to_bare_list_with_toast() {
    let (app, state) = test_app().await;
    let brand_id = add_brand(&state, "Nike").await;
    let mut events = state.events.subscribe();

    let response = post_form(
        &app,
        &format!("/dashboard/brand/delete?search=nik&brandId={brand_id}"),
        "",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/brand");
    assert_eq!(
        events.try_recv().expect("invalidation"),
        CatalogEvent::ListInvalidated {
            entity: EntityKind::Brand
        }
    );

    let html = text(get(&app, "/dashboard/brand").await).await;
    assert!(html.contains(r#"data-key="delete-brand">Brand deleted</li>"#));
    assert!(!html.contains("Nike"));
    // Settled toasts are shown once.
    let again = text(get(&app, "/dashboard/brand").await).await;
    assert!(!again.contains("Brand deleted"));
}

#[tokio::test]
async fn failed_delete_returns_to_open_dialog_with_error() {
    let (app, state) = test_app().await;
    let brand_id = add_brand(&state, "Nike").await;
    add_product(&state, "Pegasus", brand_id).await;
    let mut events = state.events.subscribe();

    let url = format!("/dashboard/brand?search=nike&brandId={brand_id}");
    let response = post_form(
        &app,
        &format!("/dashboard/brand/delete?search=nike&brandId={brand_id}"),
        "",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), url);
    assert!(events.try_recv().is_err());

    let html = text(get(&app, &url).await).await;
    assert!(html.contains("Brand still has products and cannot be deleted"));
    assert!(html.contains("<dialog open"));
}

#[tokio::test]
async fn delete_without_selection_reports_missing_id() {
    let (app, _state) = test_app().await;
    let response = post_form(&app, "/dashboard/category/delete", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/category");

    let html = text(get(&app, "/dashboard/category").await).await;
    assert!(html.contains("Category ID is missing"));
}

#[tokio::test]
async fn create_form_success_and_validation_failure() {
    let (app, state) = test_app().await;
    let mut events = state.events.subscribe();

    let response = post_form(&app, "/dashboard/category/create", "name=Running+Shoes").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/category");
    assert_eq!(
        events.try_recv().expect("category list"),
        CatalogEvent::ListInvalidated {
            entity: EntityKind::Category
        }
    );
    let html = text(get(&app, "/dashboard/category").await).await;
    assert!(html.contains("Running Shoes"));
    assert!(html.contains("Category created"));

    let response = post_form(&app, "/dashboard/category/create", "name=+++").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(text(response).await.contains("Category name is required"));
}

#[tokio::test]
async fn product_form_lists_brands_and_edit_updates() {
    let (app, state) = test_app().await;
    let brand_id = add_brand(&state, "Nike").await;
    add_product(&state, "Pegasus", brand_id).await;

    let html = text(get(&app, "/dashboard/product/edit/1").await).await;
    assert!(html.contains(r#"value="Pegasus""#));
    assert!(html.contains(&format!(r#"<option value="{brand_id}" selected>Nike</option>"#)));

    let response = post_form(
        &app,
        "/dashboard/product/edit/1",
        &format!("name=Pegasus+41&price=139.99&brand_id={brand_id}&category_id="),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = text(get(&app, "/dashboard/product").await).await;
    assert!(html.contains("Pegasus 41"));
    assert!(html.contains("139.99"));
}

#[tokio::test]
async fn brand_products_page_is_scoped() {
    let (app, state) = test_app().await;
    let nike = add_brand(&state, "Nike").await;
    let puma = add_brand(&state, "Puma").await;
    add_product(&state, "Pegasus", nike).await;
    add_product(&state, "Suede", puma).await;

    let html = text(get(&app, &format!("/dashboard/brand/products/{nike}")).await).await;
    assert!(html.contains("Products of Nike"));
    assert!(html.contains("Pegasus"));
    assert!(!html.contains("Suede"));

    let missing = get(&app, "/dashboard/brand/products/99").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let wrong_kind = get(&app, "/dashboard/category/products/1").await;
    assert_eq!(wrong_kind.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_section_is_not_found() {
    let (app, _state) = test_app().await;
    let response = get(&app, "/dashboard/orders").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let state = Arc::new(AppState::new(ApiContext::new(storage)));
    let app = build_router(state, 16);
    let response = post_form(&app, "/dashboard/category/create", &"name=".repeat(10)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn overview_counts_every_kind() {
    let (app, state) = test_app().await;
    let brand_id = add_brand(&state, "Nike").await;
    add_product(&state, "Pegasus", brand_id).await;
    let html = text(get(&app, "/dashboard").await).await;
    assert!(html.contains(r#"<a href="/dashboard/brand">Brands</a></dt><dd>1</dd>"#));
    assert!(html.contains(r#"<a href="/dashboard/product">Products</a></dt><dd>1</dd>"#));
}
