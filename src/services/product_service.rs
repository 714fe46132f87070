use uuid::Uuid;

use crate::dto::products::{
    AddProductImageRequest, CategoryList, CreateProductRequest, ProductDetail, ProductList,
    Storefront, UpdateProductRequest,
};
use crate::{
    audit,
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        categories::{Column as CategoryCol, Entity as Categories},
        product_images::{
            ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages,
        },
        products::{ActiveModel, Column, Entity as Products},
        wishlist_items::{Column as WishlistCol, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::SuperAdminUser,
    models::{Category, Product, ProductImage},
    response::{ApiResponse, Meta, Removed},
    routes::params::{LowStockQuery, Pagination, ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

const FEATURED_LIMIT: u64 = 8;
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

pub async fn storefront(state: &AppState) -> AppResult<ApiResponse<Storefront>> {
    let featured = Products::find()
        .filter(Column::IsActive.eq(true))
        .order_by_desc(Column::CreatedAt)
        .limit(FEATURED_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let categories = all_categories(state).await?;
    Ok(ApiResponse::success(
        "Welcome",
        Storefront {
            featured,
            categories,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = all_categories(state).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::new(1, total, total)),
    ))
}

async fn all_categories(state: &AppState) -> AppResult<Vec<Category>> {
    Ok(Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect())
}

/// Public catalog: active products only.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(search) = query.search.as_ref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        condition = condition.add(Expr::col(Column::Name).ilike(pattern));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find()
        .filter(Column::Id.eq(id))
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let category = Categories::find_by_id(product.category_id)
        .one(&state.orm)
        .await?
        .map(Category::from);

    let images = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product.id))
        .order_by_desc(ImageCol::IsPrimary)
        .order_by_asc(ImageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductImage::from)
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product.into(),
            category,
            images,
        },
        None,
    ))
}

pub async fn list_own_products(
    state: &AppState,
    vendor: &SuperAdminUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Products::find()
        .filter(Column::SuperAdminId.eq(vendor.user_id()))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_product(
    state: &AppState,
    vendor: &SuperAdminUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    payload.validate()?;
    ensure_category(&state.orm, payload.category_id).await?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        category_id: Set(payload.category_id),
        super_admin_id: Set(vendor.user_id()),
        image_url: payload.image_url.map_or(NotSet, Set),
        is_active: Set(true),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        vendor.user_id(),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product added successfully!",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    vendor: &SuperAdminUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    payload.validate()?;
    let existing = find_own_product(&state.orm, vendor, id).await?;

    if let Some(category_id) = payload.category_id {
        ensure_category(&state.orm, category_id).await?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        vendor.user_id(),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated successfully!",
        product.into(),
        Some(Meta::empty()),
    ))
}

/// Delete an own product together with its images and any cart/wishlist rows
/// pointing at it. Products already ordered stay referenced by their order
/// items, so the delete fails and nothing is removed.
pub async fn delete_product(
    state: &AppState,
    vendor: &SuperAdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<Removed>> {
    let txn = state.orm.begin().await?;
    let product = find_own_product(&txn, vendor, id).await?;

    ProductImages::delete_many()
        .filter(ImageCol::ProductId.eq(product.id))
        .exec(&txn)
        .await?;
    CartItems::delete_many()
        .filter(CartCol::ProductId.eq(product.id))
        .exec(&txn)
        .await?;
    WishlistItems::delete_many()
        .filter(WishlistCol::ProductId.eq(product.id))
        .exec(&txn)
        .await?;
    Products::delete_by_id(product.id).exec(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        vendor.user_id(),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::removed("Product deleted successfully!", id))
}

/// Attach an image URL. A primary image also becomes the product's cover.
pub async fn add_product_image(
    state: &AppState,
    vendor: &SuperAdminUser,
    id: Uuid,
    payload: AddProductImageRequest,
) -> AppResult<ApiResponse<ProductImage>> {
    let image_url = payload.image_url.trim().to_string();
    if image_url.is_empty() {
        return Err(AppError::BadRequest("image_url must not be empty".into()));
    }

    let txn = state.orm.begin().await?;
    let product = find_own_product(&txn, vendor, id).await?;

    if payload.is_primary {
        ProductImages::update_many()
            .col_expr(ImageCol::IsPrimary, Expr::value(false))
            .filter(ImageCol::ProductId.eq(product.id))
            .exec(&txn)
            .await?;

        let mut cover: ActiveModel = product.clone().into();
        cover.image_url = Set(image_url.clone());
        cover.update(&txn).await?;
    }

    let image = ImageActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        image_url: Set(image_url),
        is_primary: Set(payload.is_primary),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        vendor.user_id(),
        "product_image_add",
        "product_images",
        serde_json::json!({
            "product_id": product.id,
            "image_id": image.id,
            "is_primary": image.is_primary,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Image added",
        image.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    vendor: &SuperAdminUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(Column::SuperAdminId.eq(vendor.user_id()))
        .filter(Column::Stock.lt(threshold))
        .order_by_asc(Column::Stock)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Low stock",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

async fn find_own_product<C: ConnectionTrait>(
    conn: &C,
    vendor: &SuperAdminUser,
    id: Uuid,
) -> AppResult<crate::entity::products::Model> {
    Products::find()
        .filter(Column::Id.eq(id))
        .filter(Column::SuperAdminId.eq(vendor.user_id()))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn ensure_category<C: ConnectionTrait>(conn: &C, category_id: Uuid) -> AppResult<()> {
    let exists = Categories::find_by_id(category_id).one(conn).await?;
    if exists.is_none() {
        return Err(AppError::BadRequest("Category not found".into()));
    }
    Ok(())
}
