use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::User;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSuperAdminRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Category the vendor will sell in; created when missing.
    pub category: Option<String>,
}

/// A provisioned vendor together with the invite code to hand over.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuperAdminInvite {
    pub user: User,
    pub unique_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SuperAdminList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}
