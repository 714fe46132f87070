use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Category, Product, ProductImage},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub category_id: Uuid,
    /// Public URL obtained from the image store.
    pub image_url: Option<String>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Please fill in all required fields.".into(),
            ));
        }
        validate_amounts(Some(self.price), Some(self.stock))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.as_ref().is_some_and(|name| name.trim().is_empty()) {
            return Err(AppError::BadRequest("name must not be empty".into()));
        }
        validate_amounts(self.price, self.stock)
    }
}

/// Largest accepted price in minor units (99,999,999.99).
pub const MAX_PRICE: i64 = 9_999_999_999;

fn validate_amounts(price: Option<i64>, stock: Option<i32>) -> Result<(), AppError> {
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if price.is_some_and(|p| p > MAX_PRICE) {
        return Err(AppError::BadRequest(format!(
            "price must not exceed {MAX_PRICE}"
        )));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddProductImageRequest {
    pub image_url: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Option<Category>,
    pub images: Vec<ProductImage>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

/// Storefront landing data: newest products plus the category menu.
#[derive(Serialize, ToSchema)]
pub struct Storefront {
    pub featured: Vec<Product>,
    pub categories: Vec<Category>,
}
