use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{entity::sea_orm_active_enums::Role, error::AppError, models::User};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    /// Vendor invite code issued by an admin. Absent for customer sign-ups.
    pub unique_code: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [&self.name, &self.email, &self.password, &self.confirm_password];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(AppError::BadRequest(
                "Please fill in all required fields.".into(),
            ));
        }
        if self.password != self.confirm_password {
            return Err(AppError::BadRequest("Passwords do not match.".into()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long."
            )));
        }
        Ok(())
    }

    /// Trimmed invite code, treating blank input as no code.
    pub fn invite_code(&self) -> Option<&str> {
        self.unique_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}
