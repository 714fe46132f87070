use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod super_admin;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", catalog::products_router())
        .nest("/categories", catalog::categories_router())
        .nest("/auth", auth::router())
        .nest("/profile", auth::profile_router())
        .nest("/cart", cart::router())
        .nest("/wishlist", wishlist::router())
        .nest("/orders", orders::route())
        .nest("/super-admin", super_admin::router())
        .nest("/admin", admin::router())
}
