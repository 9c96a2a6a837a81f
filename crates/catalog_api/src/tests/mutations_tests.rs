use super::*;
use storage::Storage;

async fn setup() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext::new(storage)
}

fn brand(name: &str) -> BrandInput {
    BrandInput {
        name: name.into(),
        image_url: None,
    }
}

fn product(name: &str, brand_id: BrandId) -> ProductInput {
    ProductInput {
        name: name.into(),
        description: None,
        price_cents: 4999,
        brand_id,
        category_id: None,
        image_url: None,
    }
}

#[tokio::test]
async fn delete_brand_reports_server_message() {
    let ctx = setup().await;
    let brand_id = create_brand(&ctx, &brand("Nike")).await.expect("brand");

    let response = delete_brand(&ctx, brand_id).await.expect("delete");
    assert_eq!(response.success, "Brand deleted");
    assert_eq!(
        get_brand(&ctx, brand_id).await.expect_err("gone").code,
        ErrorCode::NotFound
    );
}

#[tokio::test]
async fn deleting_missing_brand_is_not_found() {
    let ctx = setup().await;
    let err = delete_brand(&ctx, BrandId(42)).await.expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(err.message, "Brand not found");
}

#[tokio::test]
async fn deleting_referenced_brand_is_a_conflict() {
    let ctx = setup().await;
    let brand_id = create_brand(&ctx, &brand("Nike")).await.expect("brand");
    create_product(&ctx, &product("Pegasus", brand_id))
        .await
        .expect("product");

    let err = delete_brand(&ctx, brand_id).await.expect_err("referenced");
    assert_eq!(err.code, ErrorCode::Conflict);
    assert_eq!(err.message, "Brand still has products and cannot be deleted");
    assert!(get_brand(&ctx, brand_id).await.is_ok());
}

#[tokio::test]
async fn validation_errors_never_reach_the_store() {
    let ctx = setup().await;
    let err = create_brand(&ctx, &brand("   ")).await.expect_err("blank");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(ctx.storage.overview().await.expect("overview").brands, 0);
}

#[tokio::test]
async fn duplicate_brand_name_is_a_conflict() {
    let ctx = setup().await;
    create_brand(&ctx, &brand("Nike")).await.expect("brand");
    let err = create_brand(&ctx, &brand(" nike ")).await.expect_err("dup");
    assert_eq!(err.code, ErrorCode::Conflict);
    assert_eq!(err.message, "A brand named 'nike' already exists");
}

#[tokio::test]
async fn product_requires_existing_brand() {
    let ctx = setup().await;
    let err = create_product(&ctx, &product("Ghost", BrandId(7)))
        .await
        .expect_err("no brand");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "Brand 7 does not exist");
}

#[tokio::test]
async fn deleting_a_product_frees_its_brand() {
    let ctx = setup().await;
    let brand_id = create_brand(&ctx, &brand("Nike")).await.expect("brand");
    let product_id = create_product(&ctx, &product("Pegasus", brand_id))
        .await
        .expect("product");
    assert_eq!(get_brand(&ctx, brand_id).await.expect("brand").product_count, 1);

    let response = delete(&ctx, EntityKind::Product, product_id.0)
        .await
        .expect("delete");
    assert_eq!(response.success, "Product deleted");
    delete_brand(&ctx, brand_id).await.expect("brand now deletable");
}

#[tokio::test]
async fn update_renames_and_reports() {
    let ctx = setup().await;
    let category_id = create_category(&ctx, &CategoryInput { name: "Shoes".into() })
        .await
        .expect("category");
    let response = update_category(
        &ctx,
        category_id,
        &CategoryInput {
            name: "Footwear".into(),
        },
    )
    .await
    .expect("update");
    assert_eq!(response.success, "Category updated");
    assert_eq!(
        get_category(&ctx, category_id).await.expect("category").name,
        "Footwear"
    );

    let err = update_category(&ctx, CategoryId(99), &CategoryInput { name: "X".into() })
        .await
        .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn update_product_moves_it_between_brands() {
    let ctx = setup().await;
    let nike = create_brand(&ctx, &brand("Nike")).await.expect("nike");
    let puma = create_brand(&ctx, &brand("Puma")).await.expect("puma");
    let product_id = create_product(&ctx, &product("Runner", nike))
        .await
        .expect("product");

    update_product(&ctx, product_id, &product("Runner", puma))
        .await
        .expect("update");
    let stored = get_product(&ctx, product_id).await.expect("product");
    assert_eq!(stored.brand_id, puma);
    assert_eq!(stored.brand_name, "Puma");
}
