use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub product: Product,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct WishlistList {
    #[schema(value_type = Vec<WishlistEntry>)]
    pub items: Vec<WishlistEntry>,
}
