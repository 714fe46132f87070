use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::cart::CartLine,
    entity::sea_orm_active_enums::{OrderStatus, PaymentMethod},
    error::AppError,
    models::{Order, OrderItem, Payment, Product},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    /// `cod` or `online`.
    #[serde(default)]
    pub payment_method: String,
}

/// A checked [`PlaceOrderRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    pub address: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
}

impl PlaceOrderRequest {
    pub fn validate(self) -> Result<ShippingDetails, AppError> {
        let address = self.address.trim();
        let phone = self.phone.trim();
        let method = self.payment_method.trim();
        if address.is_empty() || phone.is_empty() || method.is_empty() {
            return Err(AppError::BadRequest(
                "Please fill in all required fields.".into(),
            ));
        }
        let payment_method = method.parse::<PaymentMethod>().map_err(AppError::BadRequest)?;
        Ok(ShippingDetails {
            address: address.to_string(),
            phone: phone.to_string(),
            payment_method,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSummary {
    pub items: Vec<CartLine>,
    pub total: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Vendor overview. Revenue is summed from the prices captured on each order line.
#[derive(Debug, Serialize, ToSchema)]
pub struct VendorDashboard {
    pub product_count: i64,
    pub order_count: i64,
    pub revenue: i64,
    pub low_stock: Vec<Product>,
    pub recent_orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(address: &str, phone: &str, method: &str) -> PlaceOrderRequest {
        PlaceOrderRequest {
            address: address.into(),
            phone: phone.into(),
            payment_method: method.into(),
        }
    }

    #[test]
    fn every_field_is_required() {
        assert!(request("", "555-0100", "cod").validate().is_err());
        assert!(request("1 Main St", " ", "cod").validate().is_err());
        assert!(request("1 Main St", "555-0100", "").validate().is_err());
    }

    #[test]
    fn unknown_payment_method_is_rejected() {
        assert!(request("1 Main St", "555-0100", "bitcoin").validate().is_err());
    }

    #[test]
    fn valid_request_is_trimmed() {
        let details = request(" 1 Main St ", "555-0100", "online").validate().unwrap();
        assert_eq!(details.address, "1 Main St");
        assert_eq!(details.payment_method, PaymentMethod::Online);
    }
}
