use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::cart::{CartAction, CartLine, CartList, line_total, sum_totals},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
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

impl TryFrom<CartWithProductRow> for CartLine {
    type Error = AppError;

    fn try_from(row: CartWithProductRow) -> AppResult<Self> {
        Ok(CartLine {
            id: row.cart_id,
            line_total: line_total(row.price, row.quantity)?,
            quantity: row.quantity,
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
        })
    }
}

/// Every cart row of `user_id` with its product and the running total.
pub async fn load_cart(pool: &DbPool, user_id: Uuid) -> AppResult<CartList> {
    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               p.id AS product_id, p.name, p.description, p.price, p.stock,
               p.category_id, p.super_admin_id, p.image_url, p.is_active, p.created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(CartLine::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    let total = sum_totals(items.iter().map(|line| line.line_total))?;
    Ok(CartList { items, total })
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let cart = load_cart(&state.pool, user.user_id).await?;
    let count = cart.items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        cart,
        Some(Meta::new(1, count, count)),
    ))
}

/// Add one unit of an active product, reusing the caller's existing row for it.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartItem>> {
    let product = Products::find()
        .filter(ProdCol::Id.eq(product_id))
        .filter(ProdCol::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    if product.is_none() {
        return Err(AppError::NotFound);
    }

    let existing = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?;

    let cart_item = match existing {
        Some(item) => {
            let quantity = item.quantity.saturating_add(1);
            let mut active: CartActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product_id),
                quantity: Set(1),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        &state.pool,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": cart_item.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product added to cart!",
        cart_item.into(),
        None,
    ))
}

pub async fn update_cart(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
    action: CartAction,
) -> AppResult<ApiResponse<CartList>> {
    let item = CartItems::find()
        .filter(CartCol::Id.eq(cart_id))
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let message = match action.apply(item.quantity) {
        Some(quantity) => {
            let mut active: CartActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?;
            "Cart updated"
        }
        None => {
            item.delete(&state.orm).await?;
            "Item removed from cart"
        }
    };

    audit::record(
        &state.pool,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "cart_id": cart_id, "action": format!("{action:?}") }),
    )
    .await;

    let cart = load_cart(&state.pool, user.user_id).await?;
    Ok(ApiResponse::success(message, cart, Some(Meta::empty())))
}
