use rand::Rng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::admin::{CreateSuperAdminRequest, SuperAdminInvite, SuperAdminList},
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::Entity as Orders,
        payments::{Column as PaymentCol, Entity as Payments},
        sea_orm_active_enums::Role,
        users::{self, ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::User,
    response::{ApiResponse, Meta, Removed},
    state::AppState,
};

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const CODE_LEN: usize = 8;
const MAX_CODE_ATTEMPTS: usize = 5;

/// Random invite code of [`CODE_LEN`] characters from `A-Z0-9`.
pub fn generate_unique_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

fn is_code_collision(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("unique_code")
    )
}

/// Create an inactive vendor invite. The returned code is what the vendor
/// registers with.
pub async fn create_super_admin(
    state: &AppState,
    admin: &AdminUser,
    payload: CreateSuperAdminRequest,
) -> AppResult<ApiResponse<SuperAdminInvite>> {
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_string();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest(
            "Please fill in all required fields.".into(),
        ));
    }

    let taken = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Email already registered!".into()));
    }

    let category = payload
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let mut attempt = 0;
    let user = loop {
        attempt += 1;
        let code = generate_unique_code();
        match insert_invite(state, &name, &email, category, &code).await {
            Ok(user) => break user,
            Err(AppError::OrmError(err))
                if is_code_collision(&err) && attempt < MAX_CODE_ATTEMPTS =>
            {
                tracing::debug!(attempt, "invite code collision, retrying");
            }
            Err(err) => return Err(err),
        }
    };

    let unique_code = user.unique_code.clone().unwrap_or_default();

    audit::record(
        &state.pool,
        admin.user_id(),
        "super_admin_create",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Super Admin created successfully! Unique code: {unique_code}"),
        SuperAdminInvite {
            user: user.into(),
            unique_code,
        },
        Some(Meta::empty()),
    ))
}

async fn insert_invite(
    state: &AppState,
    name: &str,
    email: &str,
    category: Option<&str>,
    code: &str,
) -> AppResult<users::Model> {
    let txn = state.orm.begin().await?;

    if let Some(category) = category {
        ensure_category(&txn, category).await?;
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(String::new()),
        role: Set(Role::SuperAdmin),
        unique_code: Set(Some(code.to_string())),
        is_active: Set(false),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(user)
}

async fn ensure_category<C: ConnectionTrait>(conn: &C, name: &str) -> AppResult<()> {
    let existing = Categories::find()
        .filter(CategoryCol::Name.eq(name))
        .one(conn)
        .await?;
    if existing.is_none() {
        CategoryActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(None),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

pub async fn list_super_admins(
    state: &AppState,
    _admin: &AdminUser,
) -> AppResult<ApiResponse<SuperAdminList>> {
    let items: Vec<User> = Users::find()
        .filter(UserCol::Role.eq(Role::SuperAdmin))
        .order_by_desc(UserCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Super Admins",
        SuperAdminList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn toggle_super_admin(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    let vendor = Users::find_by_id(id)
        .filter(UserCol::Role.eq(Role::SuperAdmin))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_active = !vendor.is_active;
    let mut active: UserActive = vendor.into();
    active.is_active = Set(is_active);
    let vendor = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        admin.user_id(),
        "super_admin_toggle",
        "users",
        serde_json::json!({ "user_id": vendor.id, "is_active": is_active }),
    )
    .await;

    let message = if is_active {
        "Super Admin activated"
    } else {
        "Super Admin deactivated"
    };
    Ok(ApiResponse::success(message, vendor.into(), Some(Meta::empty())))
}

/// Remove an order with its items and payment in one transaction.
pub async fn delete_order(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<Removed>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Payments::delete_many()
        .filter(PaymentCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(order.id).exec(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        admin.user_id(),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::removed("Order deleted successfully!", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_eight_uppercase_alphanumerics() {
        for _ in 0..1000 {
            let code = generate_unique_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "bad code {code}"
            );
        }
    }

    #[test]
    fn codes_vary() {
        let a = generate_unique_code();
        let b = generate_unique_code();
        let c = generate_unique_code();
        assert!(a != b || b != c);
    }

    #[test]
    fn only_unique_code_violations_count_as_collisions() {
        let other = DbErr::Custom("boom".into());
        assert!(!is_code_collision(&other));
    }
}
