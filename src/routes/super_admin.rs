use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderList, UpdateOrderStatusRequest, VendorDashboard},
        products::{AddProductImageRequest, CreateProductRequest, ProductList, UpdateProductRequest},
    },
    error::AppResult,
    middleware::auth::SuperAdminUser,
    models::{Order, Product, ProductImage},
    response::{ApiResponse, Removed},
    routes::params::{LowStockQuery, OrderListQuery, Pagination},
    services::{product_service, vendor_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route("/products/{id}/images", post(add_product_image))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", patch(update_order_status))
}

#[utoipa::path(
    get,
    path = "/api/super-admin/dashboard",
    responses(
        (status = 200, description = "Product, order and revenue totals for the caller's catalog", body = ApiResponse<VendorDashboard>),
        (status = 303, description = "Not a super admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Super Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    vendor: SuperAdminUser,
) -> AppResult<Json<ApiResponse<VendorDashboard>>> {
    let resp = vendor_service::dashboard(&state, &vendor).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/super-admin/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Own catalog, including inactive products", body = ApiResponse<ProductList>),
        (status = 303, description = "Not a super admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Super Admin"
)]
pub async fn list_products(
    State(state): State<AppState>,
    vendor: SuperAdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_own_products(&state, &vendor, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/super-admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Validation failed or unknown category"),
        (status = 303, description = "Not a super admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Super Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    vendor: SuperAdminUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let resp = product_service::create_product(&state, &vendor, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/super-admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 404, description = "Not one of your products"),
        (status = 303, description = "Not a super admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Super Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    vendor: SuperAdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &vendor, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/super-admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product and its images deleted", body = ApiResponse<Removed>),
        (status = 404, description = "Not one of your products"),
        (status = 303, description = "Not a super admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Super Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    vendor: SuperAdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    let resp = product_service::delete_product(&state, &vendor, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/super-admin/products/{id}/images",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = AddProductImageRequest,
    responses(
        (status = 200, description = "Image attached", body = ApiResponse<ProductImage>),
        (status = 404, description = "Not one of your products"),
        (status = 303, description = "Not a super admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Super Admin"
)]
pub async fn add_product_image(
    State(state): State<AppState>,
    vendor: SuperAdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddProductImageRequest>,
) -> AppResult<Json<ApiResponse<ProductImage>>> {
    let resp = product_service::add_product_image(&state, &vendor, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/super-admin/inventory/low-stock",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("threshold" = Option<i32>, Query, description = "Stock strictly below this value, default 10"),
    ),
    responses(
        (status = 200, description = "Own products running low", body = ApiResponse<ProductList>),
        (status = 303, description = "Not a super admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Super Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    vendor: SuperAdminUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_low_stock(&state, &vendor, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/super-admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("sort_order" = Option<String>, Query, description = "asc | desc, default desc"),
    ),
    responses(
        (status = 200, description = "Orders containing your products", body = ApiResponse<OrderList>),
        (status = 303, description = "Not a super admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Super Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    vendor: SuperAdminUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = vendor_service::list_vendor_orders(&state, &vendor, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/super-admin/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Order>),
        (status = 400, description = "Status not allowed or order cancelled"),
        (status = 404, description = "Order has none of your products"),
        (status = 303, description = "Not a super admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Super Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    vendor: SuperAdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = vendor_service::update_order_status(&state, &vendor, id, payload).await?;
    Ok(Json(resp))
}
