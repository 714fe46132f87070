use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::{CategoryList, ProductDetail, ProductList, Storefront},
    error::AppResult,
    response::ApiResponse,
    routes::params::ProductQuery,
    services::product_service,
    state::AppState,
};

pub fn products_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product))
}

pub fn categories_router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Latest active products and the category menu", body = ApiResponse<Storefront>)
    ),
    tag = "Products"
)]
pub async fn storefront(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Storefront>>> {
    let resp = product_service::storefront(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category_id" = Option<Uuid>, Query, description = "Only products in this category"),
        ("search" = Option<String>, Query, description = "Case-insensitive name match"),
        ("min_price" = Option<i64>, Query, description = "Minimum price in minor units"),
        ("max_price" = Option<i64>, Query, description = "Maximum price in minor units"),
        ("sort_by" = Option<String>, Query, description = "created_at | price | name"),
        ("sort_order" = Option<String>, Query, description = "asc | desc, default desc"),
    ),
    responses(
        (status = 200, description = "List active products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product with category and images", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Products"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = product_service::list_categories(&state).await?;
    Ok(Json(resp))
}
