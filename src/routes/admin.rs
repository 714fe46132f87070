use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
};
use uuid::Uuid;

use crate::{
    dto::admin::{CreateSuperAdminRequest, SuperAdminInvite, SuperAdminList},
    error::AppResult,
    middleware::auth::AdminUser,
    models::User,
    response::{ApiResponse, Removed},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/super-admins", get(list_super_admins).post(create_super_admin))
        .route("/super-admins/{id}/toggle", patch(toggle_super_admin))
        .route("/orders/{id}", delete(delete_order))
}

#[utoipa::path(
    get,
    path = "/api/admin/super-admins",
    responses(
        (status = 200, description = "All vendor accounts", body = ApiResponse<SuperAdminList>),
        (status = 303, description = "Not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_super_admins(
    State(state): State<AppState>,
    admin: AdminUser,
) -> AppResult<Json<ApiResponse<SuperAdminList>>> {
    let resp = admin_service::list_super_admins(&state, &admin).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/super-admins",
    request_body = CreateSuperAdminRequest,
    responses(
        (status = 201, description = "Inactive vendor created with a one-time unique code", body = ApiResponse<SuperAdminInvite>),
        (status = 400, description = "Missing fields or email already registered"),
        (status = 303, description = "Not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_super_admin(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CreateSuperAdminRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SuperAdminInvite>>)> {
    let resp = admin_service::create_super_admin(&state, &admin, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/super-admins/{id}/toggle",
    params(
        ("id" = Uuid, Path, description = "Vendor user ID")
    ),
    responses(
        (status = 200, description = "Activation flipped", body = ApiResponse<User>),
        (status = 404, description = "Vendor not found"),
        (status = 303, description = "Not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_super_admin(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::toggle_super_admin(&state, &admin, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order, items and payment deleted", body = ApiResponse<Removed>),
        (status = 404, description = "Order not found"),
        (status = 303, description = "Not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    let resp = admin_service::delete_order(&state, &admin, id).await?;
    Ok(Json(resp))
}
