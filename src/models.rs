use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    cart_items, categories, order_items, orders, payments, product_images, products,
    sea_orm_active_enums::{OrderStatus, PaymentMethod, PaymentStatus, Role},
    users, wishlist_items,
};

/// Public view of an account. The password hash and invite code stay server-side.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub category_id: Uuid,
    pub super_admin_id: Uuid,
    pub image_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_url: String,
    pub is_primary: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WishlistItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub shipping_address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub expected_delivery_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub amount: i64,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            category_id: model.category_id,
            super_admin_id: model.super_admin_id,
            image_url: model.image_url,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<product_images::Model> for ProductImage {
    fn from(model: product_images::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            image_url: model.image_url,
            is_primary: model.is_primary,
        }
    }
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<wishlist_items::Model> for WishlistItem {
    fn from(model: wishlist_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            total_amount: model.total_amount,
            status: model.status,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            shipping_address: model.shipping_address,
            phone: model.phone,
            created_at: model.created_at.with_timezone(&Utc),
            expected_delivery_date: model.expected_delivery_date.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            price: model.price,
        }
    }
}

impl From<payments::Model> for Payment {
    fn from(model: payments::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            payment_method: model.payment_method,
            transaction_id: model.transaction_id,
            payment_status: model.payment_status,
            amount: model.amount,
        }
    }
}
