use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::{sea_orm_active_enums::Role, users::Entity as Users},
    error::AppError,
    state::AppState,
};

/// Authenticated principal for the current request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// The single role check. Everything role-restricted goes through here.
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role != role {
            return Err(AppError::AccessDenied(role.denied_message().into()));
        }
        Ok(())
    }

    pub fn admin(&self) -> Result<AdminUser, AppError> {
        self.require(Role::Admin)?;
        Ok(AdminUser(self.clone()))
    }

    pub fn super_admin(&self) -> Result<SuperAdminUser, AppError> {
        self.require(Role::SuperAdmin)?;
        Ok(SuperAdminUser(self.clone()))
    }

    /// Re-reads the account so a deactivation or role change applies to tokens
    /// that were issued before it.
    async fn confirm_stored(&self, state: &AppState, role: Role) -> Result<(), AppError> {
        let stored = Users::find_by_id(self.user_id).one(&state.orm).await?;
        match stored {
            Some(user) if user.is_active && user.role == role => Ok(()),
            _ => Err(AppError::AccessDenied(role.denied_message().into())),
        }
    }
}

/// Proof that the caller is a platform admin. Only obtainable via [`AuthUser::admin`].
#[derive(Debug, Clone)]
pub struct AdminUser(AuthUser);

impl AdminUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

/// Proof that the caller is a vendor. Only obtainable via [`AuthUser::super_admin`].
#[derive(Debug, Clone)]
pub struct SuperAdminUser(AuthUser);

impl SuperAdminUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

pub fn jwt_secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Please log in to access this page.".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let secret = jwt_secret()?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role,
        })
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::AccessDenied(Role::Admin.denied_message().into()))?;
        let admin = user.admin()?;
        user.confirm_stored(state, Role::Admin).await?;
        Ok(admin)
    }
}

impl FromRequestParts<AppState> for SuperAdminUser {
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::AccessDenied(Role::SuperAdmin.denied_message().into()))?;
        let vendor = user.super_admin()?;
        user.confirm_stored(state, Role::SuperAdmin).await?;
        Ok(vendor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn exact_role_match_is_required() {
        assert!(user(Role::Admin).require(Role::Admin).is_ok());
        assert!(user(Role::SuperAdmin).require(Role::Admin).is_err());
        assert!(user(Role::Customer).require(Role::SuperAdmin).is_err());
    }

    #[test]
    fn admin_is_not_a_vendor() {
        let err = user(Role::Admin).super_admin().unwrap_err();
        match err {
            AppError::AccessDenied(msg) => {
                assert_eq!(msg, "Access denied. Super Admin privileges required.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn capability_keeps_the_principal_id() {
        let vendor = user(Role::SuperAdmin);
        let capability = vendor.super_admin().unwrap();
        assert_eq!(capability.user_id(), vendor.user_id);
    }
}
