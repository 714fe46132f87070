mod common;

use axum_marketplace::{
    dto::{
        admin::CreateSuperAdminRequest,
        auth::{LoginRequest, RegisterRequest},
        orders::{PlaceOrderRequest, UpdateOrderStatusRequest},
        products::{AddProductImageRequest, CreateProductRequest, UpdateProductRequest},
    },
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        products::Entity as Products,
        sea_orm_active_enums::{OrderStatus, Role},
        users::Entity as Users,
    },
    error::AppError,
    middleware::auth::{AuthUser, SuperAdminUser},
    routes::params::{LowStockQuery, OrderListQuery, Pagination, ProductQuery},
    services::{
        admin_service, auth_service, cart_service, order_service, product_service,
        vendor_service, wishlist_service,
    },
    state::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{Request, header},
};
use common::{create_category, create_product, create_user, setup_state, unique_email};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

fn set_jwt_secret() {
    // SAFETY: every test sets the same value before any token work.
    unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };
}

async fn vendor_from_token(state: &AppState, token: &str) -> Result<SuperAdminUser, AppError> {
    let (mut parts, _) = Request::builder()
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(())
        .expect("request")
        .into_parts();
    SuperAdminUser::from_request_parts(&mut parts, state).await
}

fn register_request(email: &str, code: Option<&str>) -> RegisterRequest {
    RegisterRequest {
        name: "Vera Vendor".into(),
        email: email.into(),
        password: "secret123".into(),
        confirm_password: "secret123".into(),
        unique_code: code.map(Into::into),
    }
}

async fn invite(state: &AppState, email: &str) -> anyhow::Result<String> {
    let admin = create_user(state, Role::Admin).await?.admin()?;
    let resp = admin_service::create_super_admin(
        state,
        &admin,
        CreateSuperAdminRequest {
            name: "Vera".into(),
            email: email.into(),
            category: Some(format!("Crafts {}", uuid::Uuid::new_v4().simple())),
        },
    )
    .await?;
    Ok(resp.data.expect("invite").unique_code)
}

#[tokio::test]
async fn invited_vendor_claims_code_and_logs_in() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    set_jwt_secret();
    let email = unique_email("vendor");
    let code = invite(&state, &email).await?;
    assert_eq!(code.len(), admin_service::CODE_LEN);

    // not claimed yet: no password, cannot log in
    let login = LoginRequest {
        email: email.clone(),
        password: "secret123".into(),
    };
    assert!(auth_service::login_user(&state, login).await.is_err());

    let user = auth_service::register_user(&state, register_request(&email, Some(&code)))
        .await?
        .data
        .expect("user");
    assert_eq!(user.role, Role::SuperAdmin);
    assert!(user.is_active);

    let stored = Users::find_by_id(user.id)
        .one(&state.orm)
        .await?
        .expect("stored user");
    assert!(stored.unique_code.is_none());
    assert!(!stored.password_hash.is_empty());

    let resp = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "secret123".into(),
        },
    )
    .await?
    .data
    .expect("login");
    assert!(!resp.token.is_empty());
    assert_eq!(resp.user.id, user.id);

    // the code is single use
    let again = auth_service::register_user(&state, register_request(&email, Some(&code))).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn invite_code_only_works_for_its_email() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let email = unique_email("vendor");
    let code = invite(&state, &email).await?;

    let other = unique_email("intruder");
    let err = auth_service::register_user(&state, register_request(&other, Some(&code)))
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, "Invalid unique code."),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn provisioning_rejects_a_registered_email() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer_email = unique_email("customer");
    auth_service::register_user(&state, register_request(&customer_email, None)).await?;

    let admin = create_user(&state, Role::Admin).await?.admin()?;
    let err = admin_service::create_super_admin(
        &state,
        &admin,
        CreateSuperAdminRequest {
            name: "Dup".into(),
            email: customer_email,
            category: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn deactivated_vendor_cannot_log_in() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    set_jwt_secret();
    let email = unique_email("vendor");
    let code = invite(&state, &email).await?;
    let user = auth_service::register_user(&state, register_request(&email, Some(&code)))
        .await?
        .data
        .expect("user");

    let login = LoginRequest {
        email: email.clone(),
        password: "secret123".into(),
    };
    let token = auth_service::login_user(&state, login)
        .await?
        .data
        .expect("login")
        .token;
    let before = vendor_from_token(&state, &token).await?;
    assert_eq!(before.user_id(), user.id);

    let admin = create_user(&state, Role::Admin).await?.admin()?;
    let toggled = admin_service::toggle_super_admin(&state, &admin, user.id)
        .await?
        .data
        .expect("vendor");
    assert!(!toggled.is_active);

    let login = LoginRequest {
        email,
        password: "secret123".into(),
    };
    assert!(auth_service::login_user(&state, login).await.is_err());

    // the token issued before the toggle no longer opens vendor routes
    assert!(matches!(
        vendor_from_token(&state, &token).await,
        Err(AppError::AccessDenied(_))
    ));

    // toggling a customer is not possible
    let customer = create_user(&state, Role::Customer).await?;
    assert!(matches!(
        admin_service::toggle_super_admin(&state, &admin, customer.user_id).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}

#[test]
fn customers_are_turned_away_from_vendor_routes() {
    let customer = AuthUser {
        user_id: uuid::Uuid::new_v4(),
        role: Role::Customer,
    };
    match customer.super_admin() {
        Err(AppError::AccessDenied(msg)) => {
            assert_eq!(msg, "Access denied. Super Admin privileges required.")
        }
        other => panic!("unexpected: {other:?}"),
    }
    match customer.admin() {
        Err(AppError::AccessDenied(msg)) => {
            assert_eq!(msg, "Access denied. Admin privileges required.")
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn vendor_manages_only_its_own_catalog() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, Role::SuperAdmin).await?.super_admin()?;
    let rival = create_user(&state, Role::SuperAdmin).await?.super_admin()?;
    let category_id = create_category(&state).await?;

    let product = product_service::create_product(
        &state,
        &owner,
        CreateProductRequest {
            name: "Hand-thrown mug".into(),
            description: None,
            price: 1800,
            stock: 3,
            category_id,
            image_url: None,
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.super_admin_id, owner.user_id());
    assert!(product.image_url.contains("placeholder"));

    let update = || UpdateProductRequest {
        name: None,
        description: None,
        price: Some(2000),
        stock: None,
        category_id: None,
        image_url: None,
        is_active: None,
    };
    assert!(matches!(
        product_service::update_product(&state, &rival, product.id, update()).await,
        Err(AppError::NotFound)
    ));
    let updated = product_service::update_product(&state, &owner, product.id, update())
        .await?
        .data
        .expect("product");
    assert_eq!(updated.price, 2000);

    let image = product_service::add_product_image(
        &state,
        &owner,
        product.id,
        AddProductImageRequest {
            image_url: "https://cdn.example.com/mug.jpg".into(),
            is_primary: true,
        },
    )
    .await?
    .data
    .expect("image");
    assert!(image.is_primary);
    let audited = AuditLogs::find()
        .filter(AuditCol::UserId.eq(owner.user_id()))
        .filter(AuditCol::Action.eq("product_image_add"))
        .one(&state.orm)
        .await?
        .expect("audit row");
    let metadata = audited.metadata.expect("audit metadata");
    assert_eq!(metadata["image_id"], image.id.to_string());

    let detail = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("detail");
    assert_eq!(detail.product.image_url, "https://cdn.example.com/mug.jpg");
    assert_eq!(detail.images.len(), 1);

    let low = product_service::list_low_stock(&state, &owner, LowStockQuery::default())
        .await?
        .data
        .expect("low stock");
    assert!(low.items.iter().any(|p| p.id == product.id));
    let rival_low = product_service::list_low_stock(&state, &rival, LowStockQuery::default())
        .await?
        .data
        .expect("low stock");
    assert!(rival_low.items.is_empty());

    let own = product_service::list_own_products(&state, &owner, Pagination::default())
        .await?
        .data
        .expect("own products");
    assert_eq!(own.items.len(), 1);

    assert!(matches!(
        product_service::delete_product(&state, &rival, product.id).await,
        Err(AppError::NotFound)
    ));
    product_service::delete_product(&state, &owner, product.id).await?;
    assert!(Products::find_by_id(product.id).one(&state.orm).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn hidden_products_leave_the_storefront() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor_user = create_user(&state, Role::SuperAdmin).await?;
    let vendor = vendor_user.super_admin()?;
    let customer = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, &vendor_user, 900, 5).await?;

    let query = || ProductQuery {
        category_id: Some(product.category_id),
        ..Default::default()
    };
    let listed = product_service::list_products(&state, query())
        .await?
        .data
        .expect("products");
    assert_eq!(listed.items.len(), 1);

    let added = wishlist_service::add_to_wishlist(&state, &customer, product.id).await?;
    assert_eq!(added.message, "Product added to wishlist!");
    let again = wishlist_service::add_to_wishlist(&state, &customer, product.id).await?;
    assert_eq!(again.message, "Product already in wishlist!");
    let wishlist = wishlist_service::list_wishlist(&state, &customer)
        .await?
        .data
        .expect("wishlist");
    assert_eq!(wishlist.items.len(), 1);

    product_service::update_product(
        &state,
        &vendor,
        product.id,
        UpdateProductRequest {
            name: None,
            description: None,
            price: None,
            stock: None,
            category_id: None,
            image_url: None,
            is_active: Some(false),
        },
    )
    .await?;

    let listed = product_service::list_products(&state, query())
        .await?
        .data
        .expect("products");
    assert!(listed.items.is_empty());
    assert!(matches!(
        product_service::get_product(&state, product.id).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        cart_service::add_to_cart(&state, &customer, product.id).await,
        Err(AppError::NotFound)
    ));

    let entry_id = wishlist.items[0].id;
    wishlist_service::remove_from_wishlist(&state, &customer, entry_id).await?;
    assert!(matches!(
        wishlist_service::remove_from_wishlist(&state, &customer, entry_id).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn vendor_moves_its_orders_through_fulfilment() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor_user = create_user(&state, Role::SuperAdmin).await?;
    let vendor = vendor_user.super_admin()?;
    let rival = create_user(&state, Role::SuperAdmin).await?.super_admin()?;
    let customer = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, &vendor_user, 1200, 5).await?;

    cart_service::add_to_cart(&state, &customer, product.id).await?;
    let order_id = order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            address: "1 Main St".into(),
            phone: "555-0100".into(),
            payment_method: "cod".into(),
        },
    )
    .await?
    .data
    .expect("order")
    .order
    .id;

    let orders = vendor_service::list_vendor_orders(&state, &vendor, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert!(orders.items.iter().any(|o| o.id == order_id));

    let status = |status| UpdateOrderStatusRequest { status };
    assert!(matches!(
        vendor_service::update_order_status(&state, &rival, order_id, status(OrderStatus::Shipped))
            .await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        vendor_service::update_order_status(&state, &vendor, order_id, status(OrderStatus::Pending))
            .await,
        Err(AppError::BadRequest(_))
    ));

    let shipped =
        vendor_service::update_order_status(&state, &vendor, order_id, status(OrderStatus::Shipped))
            .await?
            .data
            .expect("order");
    assert_eq!(shipped.status, OrderStatus::Shipped);

    // shipped orders are past the customer's cancel window
    assert!(
        order_service::cancel_order(&state, &customer, order_id)
            .await
            .is_err()
    );
    Ok(())
}

#[tokio::test]
async fn dashboard_revenue_uses_the_price_paid() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let vendor_user = create_user(&state, Role::SuperAdmin).await?;
    let vendor = vendor_user.super_admin()?;
    let rival = create_user(&state, Role::SuperAdmin).await?.super_admin()?;
    let customer = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, &vendor_user, 1500, 4).await?;

    cart_service::add_to_cart(&state, &customer, product.id).await?;
    cart_service::add_to_cart(&state, &customer, product.id).await?;
    let order_id = order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            address: "1 Main St".into(),
            phone: "555-0100".into(),
            payment_method: "online".into(),
        },
    )
    .await?
    .data
    .expect("order")
    .order
    .id;

    product_service::update_product(
        &state,
        &vendor,
        product.id,
        UpdateProductRequest {
            name: None,
            description: None,
            price: Some(9900),
            stock: None,
            category_id: None,
            image_url: None,
            is_active: None,
        },
    )
    .await?;

    let dashboard = vendor_service::dashboard(&state, &vendor)
        .await?
        .data
        .expect("dashboard");
    assert_eq!(dashboard.product_count, 1);
    assert_eq!(dashboard.order_count, 1);
    // 2 x 15.00 at order time, not the new 99.00
    assert_eq!(dashboard.revenue, 3000);
    assert!(dashboard.low_stock.iter().any(|p| p.id == product.id));
    assert_eq!(dashboard.recent_orders.len(), 1);
    assert_eq!(dashboard.recent_orders[0].id, order_id);

    let empty = vendor_service::dashboard(&state, &rival)
        .await?
        .data
        .expect("dashboard");
    assert_eq!(empty.product_count, 0);
    assert_eq!(empty.order_count, 0);
    assert_eq!(empty.revenue, 0);
    assert!(empty.recent_orders.is_empty());
    Ok(())
}
