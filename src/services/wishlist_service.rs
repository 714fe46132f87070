use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::wishlist::{WishlistEntry, WishlistList},
    entity::{
        products::{Column as ProdCol, Entity as Products},
        wishlist_items::{ActiveModel as WishlistActive, Column, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Product, WishlistItem},
    response::{ApiResponse, Meta, Removed},
    state::AppState,
};

#[derive(FromRow)]
struct WishlistRow {
    wishlist_id: Uuid,
    product_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    category_id: Uuid,
    super_admin_id: Uuid,
    image_url: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<WishlistRow> for WishlistEntry {
    fn from(row: WishlistRow) -> Self {
        WishlistEntry {
            id: row.wishlist_id,
            product: Product {
                id: row.product_id,
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                category_id: row.category_id,
                super_admin_id: row.super_admin_id,
                image_url: row.image_url,
                is_active: row.is_active,
                created_at: row.created_at,
            },
        }
    }
}

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistList>> {
    let rows = sqlx::query_as::<_, WishlistRow>(
        r#"
        SELECT w.id AS wishlist_id,
               p.id AS product_id, p.name, p.description, p.price, p.stock,
               p.category_id, p.super_admin_id, p.image_url, p.is_active, p.created_at
        FROM wishlist_items w
        JOIN products p ON p.id = w.product_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let items: Vec<WishlistEntry> = rows.into_iter().map(WishlistEntry::from).collect();
    let count = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        WishlistList { items },
        Some(Meta::new(1, count, count)),
    ))
}

/// Idempotent: a product already on the list keeps its existing row.
pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<WishlistItem>> {
    let product = Products::find()
        .filter(ProdCol::Id.eq(product_id))
        .filter(ProdCol::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    if product.is_none() {
        return Err(AppError::NotFound);
    }

    let existing = WishlistItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::ProductId.eq(product_id))
        .one(&state.orm)
        .await?;

    if let Some(item) = existing {
        return Ok(ApiResponse::success(
            "Product already in wishlist!",
            item.into(),
            None,
        ));
    }

    let item = WishlistActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Product added to wishlist!",
        item.into(),
        None,
    ))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Removed>> {
    let item = WishlistItems::find()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    item.delete(&state.orm).await?;

    Ok(ApiResponse::removed("Removed from wishlist", id))
}
