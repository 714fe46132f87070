use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{CreateSuperAdminRequest, SuperAdminInvite, SuperAdminList},
        auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
        cart::{CartAction, CartLine, CartList},
        orders::{
            CheckoutSummary, OrderDetail, OrderList, PlaceOrderRequest, UpdateOrderStatusRequest,
            VendorDashboard,
        },
        products::{
            AddProductImageRequest, CategoryList, CreateProductRequest, ProductDetail,
            ProductList, Storefront, UpdateProductRequest,
        },
        wishlist::{WishlistEntry, WishlistList},
    },
    entity::sea_orm_active_enums::{OrderStatus, PaymentMethod, PaymentStatus, Role},
    models::{CartItem, Category, Order, OrderItem, Payment, Product, ProductImage, User, WishlistItem},
    response::{ApiResponse, Meta, Removed},
    routes::{admin, auth, cart, catalog, health, orders, params, super_admin, wishlist},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        catalog::storefront,
        catalog::list_products,
        catalog::get_product,
        catalog::list_categories,
        auth::register,
        auth::login,
        auth::profile,
        auth::edit_profile,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        orders::list_order,
        orders::checkout,
        orders::place_order,
        orders::get_order,
        orders::cancel_order,
        super_admin::dashboard,
        super_admin::list_products,
        super_admin::create_product,
        super_admin::update_product,
        super_admin::delete_product,
        super_admin::add_product_image,
        super_admin::list_low_stock,
        super_admin::list_orders,
        super_admin::update_order_status,
        admin::list_super_admins,
        admin::create_super_admin,
        admin::toggle_super_admin,
        admin::delete_order
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            PaymentMethod,
            PaymentStatus,
            User,
            Category,
            Product,
            ProductImage,
            CartItem,
            WishlistItem,
            Order,
            OrderItem,
            Payment,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            CartAction,
            CartLine,
            CartList,
            WishlistEntry,
            WishlistList,
            PlaceOrderRequest,
            CheckoutSummary,
            OrderDetail,
            OrderList,
            UpdateOrderStatusRequest,
            VendorDashboard,
            CreateProductRequest,
            UpdateProductRequest,
            AddProductImageRequest,
            ProductList,
            ProductDetail,
            CategoryList,
            Storefront,
            CreateSuperAdminRequest,
            SuperAdminInvite,
            SuperAdminList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            Meta,
            Removed,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
            ApiResponse<VendorDashboard>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Storefront and catalog endpoints"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Orders", description = "Checkout and customer orders"),
        (name = "Super Admin", description = "Vendor catalog and fulfilment"),
        (name = "Admin", description = "Vendor provisioning and order removal"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
