use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartList, UpdateCartQuery},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list))
        .route("/{id}", post(add_to_cart).patch(update_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with product data and total", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::list_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Add one unit to the cart", body = ApiResponse<CartItem>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::add_to_cart(&state, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{cart_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart row ID"),
        ("action" = String, Query, description = "increase | decrease | remove")
    ),
    responses(
        (status = 200, description = "Updated cart", body = ApiResponse<CartList>),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(cart_id): Path<Uuid>,
    Query(query): Query<UpdateCartQuery>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::update_cart(&state, &user, cart_id, query.action).await?;
    Ok(Json(resp))
}
