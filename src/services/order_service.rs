use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{line_total, sum_totals},
    dto::orders::{CheckoutSummary, OrderDetail, OrderList, PlaceOrderRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems, Model as CartItemModel},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
        products::{Column as ProdCol, Entity as Products},
        sea_orm_active_enums::{OrderStatus, PaymentMethod, PaymentStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service,
    state::AppState,
};

pub const EMPTY_CART: &str = "Your cart is empty!";
pub const DELIVERY_DAYS: i64 = 5;
const TRANSACTION_PREFIX: &str = "TXN";

/// A cart row priced at checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
}

pub fn order_total(lines: &[CheckoutLine]) -> AppResult<i64> {
    let totals = lines
        .iter()
        .map(|line| line_total(line.unit_price, line.quantity))
        .collect::<AppResult<Vec<_>>>()?;
    sum_totals(totals)
}

/// Online payments are treated as captured at checkout; cash on delivery waits.
pub fn initial_payment_status(method: PaymentMethod) -> PaymentStatus {
    match method {
        PaymentMethod::Online => PaymentStatus::Paid,
        PaymentMethod::Cod => PaymentStatus::Pending,
    }
}

pub fn expected_delivery_date(placed_at: DateTime<Utc>) -> DateTime<Utc> {
    placed_at + Duration::days(DELIVERY_DAYS)
}

/// `TXN` + order id + placement time to the second. Only online payments get one.
pub fn build_transaction_id(
    method: PaymentMethod,
    order_id: Uuid,
    placed_at: DateTime<Utc>,
) -> Option<String> {
    match method {
        PaymentMethod::Online => Some(format!(
            "{TRANSACTION_PREFIX}{}{}",
            order_id.simple(),
            placed_at.format("%Y%m%d%H%M%S")
        )),
        PaymentMethod::Cod => None,
    }
}

async fn checkout_lines<C: ConnectionTrait>(
    conn: &C,
    cart: Vec<CartItemModel>,
) -> AppResult<Vec<CheckoutLine>> {
    let ids: Vec<Uuid> = cart.iter().map(|row| row.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    cart.into_iter()
        .map(|row| {
            let product = products.get(&row.product_id).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "cart row {} references missing product {}",
                    row.id,
                    row.product_id
                ))
            })?;
            Ok(CheckoutLine {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: row.quantity,
                unit_price: product.price,
            })
        })
        .collect()
}

pub async fn checkout_summary(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CheckoutSummary>> {
    let cart = cart_service::load_cart(&state.pool, user.user_id).await?;
    if cart.items.is_empty() {
        return Err(AppError::BadRequest(EMPTY_CART.into()));
    }
    Ok(ApiResponse::success(
        "Checkout",
        CheckoutSummary {
            items: cart.items,
            total: cart.total,
        },
        Some(Meta::empty()),
    ))
}

/// Turn the caller's cart into an order. Everything happens in one transaction;
/// returning early drops it, which rolls every statement back.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let txn = state.orm.begin().await?;

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest(EMPTY_CART.into()));
    }
    let details = payload.validate()?;

    let lines = checkout_lines(&txn, cart).await?;
    let total_amount = order_total(&lines)?;
    let placed_at = Utc::now();
    let payment_method = details.payment_method;
    let payment_status = initial_payment_status(payment_method);

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        payment_method: Set(payment_method),
        payment_status: Set(payment_status),
        shipping_address: Set(details.address),
        phone: Set(details.phone),
        created_at: Set(placed_at.into()),
        expected_delivery_date: Set(expected_delivery_date(placed_at).into()),
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
            created_at: Set(placed_at.into()),
        }
        .insert(&txn)
        .await?;
        items.push(item.into());

        // conditional decrement: stock never goes below zero
        let updated = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(ProdCol::Id.eq(line.product_id))
            .filter(ProdCol::Stock.gte(line.quantity))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                line.product_name
            )));
        }
    }

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        payment_method: Set(payment_method),
        transaction_id: Set(build_transaction_id(payment_method, order.id, placed_at)),
        payment_status: Set(payment_status),
        amount: Set(total_amount),
        created_at: Set(placed_at.into()),
    }
    .insert(&txn)
    .await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        customer_id = %user.user_id,
        payment_method = %payment_method,
        total_amount,
        "order placed"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "order_place",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully!",
        OrderDetail {
            order: order.into(),
            items,
            payment: Some(payment.into()),
        },
        Some(Meta::empty()),
    ))
}

/// Cancel an own order that has not shipped yet and put its quantities back on the shelf.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::CustomerId.eq(user.user_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !order.status.is_cancellable() {
        return Err(AppError::BadRequest(
            "Order cannot be cancelled at this stage.".into(),
        ));
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;

    for item in &items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(&txn)
            .await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled);
    let order = active.update(&txn).await?;

    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, restocked = items.len(), "order cancelled");
    audit::record(
        &state.pool,
        user.user_id,
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled successfully.",
        OrderDetail {
            order: order.into(),
            items: items.into_iter().map(OrderItem::from).collect(),
            payment: payment.map(Into::into),
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::CustomerId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::CustomerId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let detail = order_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

pub(crate) async fn order_detail<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderDetail> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(conn)
        .await?
        .map(Into::into);

    Ok(OrderDetail {
        order: order.into(),
        items,
        payment,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn line(quantity: i32, unit_price: i64) -> CheckoutLine {
        CheckoutLine {
            product_id: Uuid::new_v4(),
            product_name: "widget".into(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn total_sums_price_times_quantity() {
        // 2 x 10.00 + 1 x 5.00
        assert_eq!(order_total(&[line(2, 1000), line(1, 500)]).unwrap(), 2500);
        assert_eq!(order_total(&[]).unwrap(), 0);
    }

    #[test]
    fn overflowing_total_is_a_bad_request() {
        let err = order_total(&[line(3, i64::MAX / 2)]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(order_total(&[line(1, i64::MAX), line(1, 1)]).is_err());
    }

    #[test]
    fn online_orders_start_paid() {
        assert_eq!(initial_payment_status(PaymentMethod::Online), PaymentStatus::Paid);
        assert_eq!(initial_payment_status(PaymentMethod::Cod), PaymentStatus::Pending);
    }

    #[test]
    fn delivery_is_five_days_out() {
        let placed = Utc.with_ymd_and_hms(2025, 3, 30, 12, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 4, 4, 12, 0, 0).unwrap();
        assert_eq!(expected_delivery_date(placed), expected);
    }

    #[test]
    fn transaction_id_only_for_online_payments() {
        let order_id = Uuid::new_v4();
        let placed = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        assert_eq!(build_transaction_id(PaymentMethod::Cod, order_id, placed), None);

        let txn = build_transaction_id(PaymentMethod::Online, order_id, placed).unwrap();
        assert_eq!(txn, format!("TXN{}20250102030405", order_id.simple()));
    }
}
