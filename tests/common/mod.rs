#![allow(dead_code)]

use axum_marketplace::{
    db::{create_pool, run_migrations},
    entity::{
        categories::ActiveModel as CategoryActive, products::ActiveModel as ProductActive,
        products::Model as ProductModel, sea_orm_active_enums::Role,
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::{NotSet, Set};
use uuid::Uuid;

/// Connects to the test database, or returns `None` so the caller can skip.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 5).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(pool)))
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{} user", role.as_str())),
        email: Set(unique_email(role.as_str())),
        password_hash: Set("unused".into()),
        role: Set(role),
        unique_code: Set(None),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

pub async fn create_category(state: &AppState) -> anyhow::Result<Uuid> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Category {}", Uuid::new_v4().simple())),
        description: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn create_product(
    state: &AppState,
    vendor: &AuthUser,
    price: i64,
    stock: i32,
) -> anyhow::Result<ProductModel> {
    let category_id = create_category(state).await?;
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Widget {}", Uuid::new_v4().simple())),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        stock: Set(stock),
        category_id: Set(category_id),
        super_admin_id: Set(vendor.user_id),
        image_url: NotSet,
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}
