mod common;

use axum_marketplace::{
    dto::{cart::CartAction, orders::PlaceOrderRequest},
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Entity as Orders},
        payments::{Column as PaymentCol, Entity as Payments},
        products::Entity as Products,
        sea_orm_active_enums::{OrderStatus, PaymentStatus, Role},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{admin_service, cart_service, order_service},
    state::AppState,
};
use common::{create_product, create_user, setup_state};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

fn shipping(method: &str) -> PlaceOrderRequest {
    PlaceOrderRequest {
        address: "12 Ferris Lane".into(),
        phone: "0123456789".into(),
        payment_method: method.into(),
    }
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .expect("product exists");
    Ok(product.stock)
}

async fn add_units(
    state: &AppState,
    customer: &AuthUser,
    product_id: Uuid,
    units: usize,
) -> anyhow::Result<()> {
    for _ in 0..units {
        cart_service::add_to_cart(state, customer, product_id).await?;
    }
    Ok(())
}

#[tokio::test]
async fn placing_an_order_snapshots_prices_and_empties_the_cart() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor = create_user(&state, Role::SuperAdmin).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let a = create_product(&state, &vendor, 1000, 5).await?;
    let b = create_product(&state, &vendor, 500, 5).await?;

    add_units(&state, &customer, a.id, 2).await?;
    add_units(&state, &customer, b.id, 1).await?;

    let summary = order_service::checkout_summary(&state, &customer).await?;
    assert_eq!(summary.data.expect("summary").total, 2500);

    let resp = order_service::place_order(&state, &customer, shipping("cod")).await?;
    let detail = resp.data.expect("order detail");

    assert_eq!(detail.order.total_amount, 2500);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.items.len(), 2);
    let line_a = detail
        .items
        .iter()
        .find(|item| item.product_id == a.id)
        .expect("line for product a");
    assert_eq!((line_a.quantity, line_a.price), (2, 1000));

    let payment = detail.payment.expect("payment");
    assert_eq!(payment.amount, 2500);
    assert_eq!(payment.payment_status, PaymentStatus::Pending);
    assert!(payment.transaction_id.is_none());

    assert_eq!(stock_of(&state, a.id).await?, 3);
    assert_eq!(stock_of(&state, b.id).await?, 4);

    let left = CartItems::find()
        .filter(CartCol::UserId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(left, 0);

    let audited = AuditLogs::find()
        .filter(AuditCol::UserId.eq(customer.user_id))
        .filter(AuditCol::Action.eq("order_place"))
        .one(&state.orm)
        .await?
        .expect("audit row");
    let metadata = audited.metadata.expect("audit metadata");
    assert_eq!(metadata["order_id"], detail.order.id.to_string());
    Ok(())
}

#[tokio::test]
async fn online_payment_is_marked_paid_with_a_transaction_id() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor = create_user(&state, Role::SuperAdmin).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, &vendor, 700, 2).await?;

    add_units(&state, &customer, product.id, 1).await?;
    let detail = order_service::place_order(&state, &customer, shipping("online"))
        .await?
        .data
        .expect("order detail");

    let payment = detail.payment.expect("payment");
    assert_eq!(payment.payment_status, PaymentStatus::Paid);
    let txn_id = payment.transaction_id.expect("transaction id");
    assert!(txn_id.starts_with("TXN"));
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_rolls_everything_back() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor = create_user(&state, Role::SuperAdmin).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let plenty = create_product(&state, &vendor, 100, 10).await?;
    let scarce = create_product(&state, &vendor, 100, 1).await?;

    add_units(&state, &customer, plenty.id, 1).await?;
    add_units(&state, &customer, scarce.id, 2).await?;

    let err = order_service::place_order(&state, &customer, shipping("cod"))
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(msg) => assert!(msg.starts_with("Insufficient stock for")),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(stock_of(&state, plenty.id).await?, 10);
    assert_eq!(stock_of(&state, scarce.id).await?, 1);
    let orders = Orders::find()
        .filter(axum_marketplace::entity::orders::Column::CustomerId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 0);
    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(cart, 2);
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_be_ordered() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, Role::Customer).await?;

    let err = order_service::place_order(&state, &customer, shipping("cod"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == order_service::EMPTY_CART));
    Ok(())
}

#[tokio::test]
async fn concurrent_orders_cannot_oversell() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor = create_user(&state, Role::SuperAdmin).await?;
    let first = create_user(&state, Role::Customer).await?;
    let second = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, &vendor, 100, 1).await?;

    add_units(&state, &first, product.id, 1).await?;
    add_units(&state, &second, product.id, 1).await?;

    let (a, b) = tokio::join!(
        order_service::place_order(&state, &first, shipping("cod")),
        order_service::place_order(&state, &second, shipping("cod")),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(stock_of(&state, product.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn cancelling_a_pending_order_restores_stock() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor = create_user(&state, Role::SuperAdmin).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, &vendor, 1000, 4).await?;

    add_units(&state, &customer, product.id, 3).await?;
    let order_id = order_service::place_order(&state, &customer, shipping("cod"))
        .await?
        .data
        .expect("order detail")
        .order
        .id;
    assert_eq!(stock_of(&state, product.id).await?, 1);

    let cancelled = order_service::cancel_order(&state, &customer, order_id)
        .await?
        .data
        .expect("order detail");
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, product.id).await?, 4);

    // a second cancel is rejected and does not restock twice
    assert!(
        order_service::cancel_order(&state, &customer, order_id)
            .await
            .is_err()
    );
    assert_eq!(stock_of(&state, product.id).await?, 4);
    Ok(())
}

#[tokio::test]
async fn shipped_orders_cannot_be_cancelled() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor = create_user(&state, Role::SuperAdmin).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, &vendor, 1000, 4).await?;

    add_units(&state, &customer, product.id, 1).await?;
    let order_id = order_service::place_order(&state, &customer, shipping("cod"))
        .await?
        .data
        .expect("order detail")
        .order
        .id;

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .expect("order");
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Shipped);
    active.update(&state.orm).await?;

    let err = order_service::cancel_order(&state, &customer, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .expect("order");
    assert_eq!(order.status, OrderStatus::Shipped);
    assert_eq!(stock_of(&state, product.id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn other_customers_cannot_see_or_cancel_an_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor = create_user(&state, Role::SuperAdmin).await?;
    let owner = create_user(&state, Role::Customer).await?;
    let stranger = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, &vendor, 1000, 4).await?;

    add_units(&state, &owner, product.id, 1).await?;
    let order_id = order_service::place_order(&state, &owner, shipping("cod"))
        .await?
        .data
        .expect("order detail")
        .order
        .id;

    assert!(matches!(
        order_service::get_order(&state, &stranger, order_id).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        order_service::cancel_order(&state, &stranger, order_id).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn cart_merges_rows_and_drops_them_at_zero() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor = create_user(&state, Role::SuperAdmin).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, &vendor, 250, 10).await?;

    add_units(&state, &customer, product.id, 2).await?;
    let cart = cart_service::list_cart(&state, &customer)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.total, 500);

    let cart_id = cart.items[0].id;
    let cart = cart_service::update_cart(&state, &customer, cart_id, CartAction::Decrease)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items[0].quantity, 1);

    let cart = cart_service::update_cart(&state, &customer, cart_id, CartAction::Decrease)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, 0);
    Ok(())
}

#[tokio::test]
async fn admin_delete_removes_items_and_payment() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor = create_user(&state, Role::SuperAdmin).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let admin = create_user(&state, Role::Admin).await?.admin()?;
    let product = create_product(&state, &vendor, 1000, 4).await?;

    add_units(&state, &customer, product.id, 1).await?;
    let order_id = order_service::place_order(&state, &customer, shipping("online"))
        .await?
        .data
        .expect("order detail")
        .order
        .id;

    admin_service::delete_order(&state, &admin, order_id).await?;

    assert!(Orders::find_by_id(order_id).one(&state.orm).await?.is_none());
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .count(&state.orm)
        .await?;
    let payments = Payments::find()
        .filter(PaymentCol::OrderId.eq(order_id))
        .count(&state.orm)
        .await?;
    assert_eq!((items, payments), (0, 0));

    assert!(matches!(
        admin_service::delete_order(&state, &admin, order_id).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}
