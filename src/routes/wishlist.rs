use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::wishlist::WishlistList,
    error::AppResult,
    middleware::auth::AuthUser,
    models::WishlistItem,
    response::{ApiResponse, Removed},
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist))
        .route("/{id}", post(add_to_wishlist).delete(remove_from_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses(
        (status = 200, description = "Wishlist entries with products", body = ApiResponse<WishlistList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistList>>> {
    let resp = wishlist_service::list_wishlist(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlist/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Added, or already present", body = ApiResponse<WishlistItem>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistItem>>> {
    let resp = wishlist_service::add_to_wishlist(&state, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/{wishlist_id}",
    params(
        ("wishlist_id" = Uuid, Path, description = "Wishlist row ID")
    ),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<Removed>),
        (status = 404, description = "Wishlist item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    let resp = wishlist_service::remove_from_wishlist(&state, &user, id).await?;
    Ok(Json(resp))
}
