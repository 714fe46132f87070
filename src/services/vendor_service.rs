use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{OrderList, UpdateOrderStatusRequest, VendorDashboard},
    entity::{
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::{self, ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        sea_orm_active_enums::OrderStatus,
    },
    error::{AppError, AppResult},
    middleware::auth::SuperAdminUser,
    models::{Order, Product},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::product_service::DEFAULT_LOW_STOCK_THRESHOLD,
    state::AppState,
};

const RECENT_ORDERS_LIMIT: u64 = 10;

pub async fn dashboard(
    state: &AppState,
    vendor: &SuperAdminUser,
) -> AppResult<ApiResponse<VendorDashboard>> {
    let vendor_id = vendor.user_id();

    let product_count = Products::find()
        .filter(ProdCol::SuperAdminId.eq(vendor_id))
        .count(&state.orm)
        .await? as i64;

    let own_orders = Orders::find()
        .join(JoinType::InnerJoin, orders::Relation::OrderItems.def())
        .join(JoinType::InnerJoin, order_items::Relation::Products.def())
        .filter(ProdCol::SuperAdminId.eq(vendor_id))
        .distinct();

    let order_count = own_orders.clone().count(&state.orm).await? as i64;

    let revenue = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(oi.price * oi.quantity), 0)::BIGINT
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE p.super_admin_id = $1
        "#,
    )
    .bind(vendor_id)
    .fetch_one(&state.pool)
    .await?;

    let low_stock = Products::find()
        .filter(ProdCol::SuperAdminId.eq(vendor_id))
        .filter(ProdCol::Stock.lt(DEFAULT_LOW_STOCK_THRESHOLD))
        .order_by_asc(ProdCol::Stock)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let recent_orders = own_orders
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_ORDERS_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Dashboard",
        VendorDashboard {
            product_count,
            order_count,
            revenue,
            low_stock,
            recent_orders,
        },
        Some(Meta::empty()),
    ))
}

/// Orders containing at least one of the vendor's products.
pub async fn list_vendor_orders(
    state: &AppState,
    vendor: &SuperAdminUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(ProdCol::SuperAdminId.eq(vendor.user_id()));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find()
        .join(JoinType::InnerJoin, orders::Relation::OrderItems.def())
        .join(JoinType::InnerJoin, order_items::Relation::Products.def())
        .filter(condition)
        .distinct();

    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Move an order along processing → shipped → delivered. Vendors only see
/// orders that contain their products; cancelled orders stay cancelled.
pub async fn update_order_status(
    state: &AppState,
    vendor: &SuperAdminUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    if !payload.status.is_fulfilment_step() {
        return Err(AppError::BadRequest("Invalid order status.".into()));
    }

    let txn = state.orm.begin().await?;

    let owned_lines = OrderItems::find()
        .join(JoinType::InnerJoin, order_items::Relation::Products.def())
        .filter(OrderItemCol::OrderId.eq(id))
        .filter(ProdCol::SuperAdminId.eq(vendor.user_id()))
        .count(&txn)
        .await?;
    if owned_lines == 0 {
        return Err(AppError::NotFound);
    }

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.status == OrderStatus::Cancelled {
        return Err(AppError::BadRequest(
            "Cancelled orders cannot be updated.".into(),
        ));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status);
    let order = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        vendor.user_id(),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order status updated successfully!",
        order.into(),
        Some(Meta::empty()),
    ))
}
