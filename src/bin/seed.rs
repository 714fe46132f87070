use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_marketplace::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};
use uuid::Uuid;

const DEFAULT_CATEGORIES: [&str; 19] = [
    "Electronics",
    "Books",
    "Clothing",
    "Home & Kitchen",
    "Beauty & Personal Care",
    "Sports & Outdoors",
    "Toys & Games",
    "Automotive",
    "Pet Supplies",
    "Health & Household",
    "Movies & TV",
    "Music",
    "Video Games",
    "Garden & Outdoor",
    "Baby Products",
    "Office Products",
    "Industrial & Scientific",
    "Handmade",
    "Collectibles & Fine Art",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.max_connections).await?;
    run_migrations(&pool).await?;

    seed_categories(&pool).await?;
    let admin_id = ensure_user(&pool, "Admin", "admin@msrshop.com", "admin123", "admin").await?;
    let customer_id =
        ensure_user(&pool, "Demo Customer", "customer@example.com", "customer123", "customer")
            .await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for name in DEFAULT_CATEGORIES {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(format!("Products in the {name} category"))
        .execute(pool)
        .await?;
    }

    println!("Seeded {} categories", DEFAULT_CATEGORIES.len());
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    // Existing accounts keep their password; only the role is enforced.
    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, is_active)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}
