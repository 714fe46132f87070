use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, models::Product};

/// Price times quantity, refusing amounts that do not fit in minor units.
pub fn line_total(unit_price: i64, quantity: i32) -> Result<i64, AppError> {
    unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(total_too_large)
}

/// Sum of line totals with the same overflow guard.
pub fn sum_totals(totals: impl IntoIterator<Item = i64>) -> Result<i64, AppError> {
    totals
        .into_iter()
        .try_fold(0i64, |acc, total| acc.checked_add(total))
        .ok_or_else(total_too_large)
}

fn total_too_large() -> AppError {
    AppError::BadRequest("Order total is too large.".into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CartAction {
    Increase,
    Decrease,
    Remove,
}

impl CartAction {
    /// Quantity after applying the action, or `None` when the row must be deleted.
    pub fn apply(self, quantity: i32) -> Option<i32> {
        match self {
            CartAction::Increase => Some(quantity.saturating_add(1)),
            CartAction::Decrease if quantity > 1 => Some(quantity - 1),
            CartAction::Decrease | CartAction::Remove => None,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartQuery {
    pub action: CartAction,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartLine>,
    pub total: i64,
}
