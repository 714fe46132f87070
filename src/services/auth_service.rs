use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
    entity::{
        sea_orm_active_enums::Role,
        users::{self, ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, jwt_secret},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn token_ttl_hours() -> i64 {
    std::env::var("JWT_TTL_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|hours| *hours > 0)
        .unwrap_or(DEFAULT_TOKEN_TTL_HOURS)
}

pub fn issue_token(user_id: Uuid, role: Role, secret: &str, ttl_hours: i64) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Customer sign-up, or vendor activation when an invite code is supplied.
pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_string();
    let password_hash = hash_password(&payload.password)?;

    let user = match payload.invite_code() {
        Some(code) => claim_invite(state, &name, &email, code, password_hash).await?,
        None => register_customer(state, &name, &email, password_hash).await?,
    };

    audit::record(
        &state.pool,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Registration successful! Please log in.",
        user.into(),
        Some(Meta::empty()),
    ))
}

async fn register_customer(
    state: &AppState,
    name: &str,
    email: &str,
    password_hash: String,
) -> AppResult<users::Model> {
    let taken = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Email already registered!".into()));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(Role::Customer),
        unique_code: Set(None),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user)
}

/// The code is single use: it must belong to an unclaimed vendor invite issued
/// for this exact email, and it is cleared once claimed.
async fn claim_invite(
    state: &AppState,
    name: &str,
    email: &str,
    code: &str,
    password_hash: String,
) -> AppResult<users::Model> {
    let txn = state.orm.begin().await?;

    let invite = Users::find()
        .filter(UserCol::UniqueCode.eq(code))
        .filter(UserCol::Email.eq(email))
        .filter(UserCol::Role.eq(Role::SuperAdmin))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid unique code.".into()))?;

    let mut active: UserActive = invite.into();
    active.name = Set(name.to_string());
    active.password_hash = Set(password_hash);
    active.is_active = Set(true);
    active.unique_code = Set(None);
    let user = active.update(&txn).await?;

    txn.commit().await?;
    Ok(user)
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = payload.email.trim();
    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.into()))?;

    // Unclaimed vendor invites have no password yet.
    if user.password_hash.is_empty() {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    if !user.is_active {
        return Err(AppError::BadRequest(
            "Your account has been deactivated.".into(),
        ));
    }

    let secret = jwt_secret()?;
    let token = issue_token(user.id, user.role, &secret, token_ttl_hours())?;

    audit::record(
        &state.pool,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            user: user.into(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Profile", model.into(), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest(
            "Please fill in all required fields.".into(),
        ));
    }

    let taken = Users::find()
        .filter(UserCol::Email.eq(email))
        .filter(UserCol::Id.ne(user.user_id))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Email already registered!".into()));
    }

    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = model.into();
    active.name = Set(name.to_string());
    active.email = Set(email.to_string());
    let model = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated successfully!",
        model.into(),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn issued_token_carries_role_and_subject() {
        let id = Uuid::new_v4();
        let token = issue_token(id, Role::SuperAdmin, "test-secret", 1).unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, id.to_string());
        assert_eq!(decoded.claims.role, Role::SuperAdmin);
    }

    #[test]
    fn token_is_rejected_with_another_secret() {
        let token = issue_token(Uuid::new_v4(), Role::Customer, "one", 1).unwrap();
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"two"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn hashes_verify_against_the_original_password() {
        let hash = hash_password("secret1").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"secret1", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"secret2", &parsed)
                .is_err()
        );
    }
}
