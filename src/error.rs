use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Role gate rejection. Rendered as a redirect to the storefront index.
    #[error("{0}")]
    AccessDenied(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied(_) => StatusCode::SEE_OTHER,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Persistence details never leave the server.
    fn public_message(&self) -> String {
        match self {
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                GENERIC_FAILURE.to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::DbError(err) => tracing::error!(error = ?err, "database error"),
            AppError::OrmError(err) => tracing::error!(error = ?err, "orm error"),
            AppError::Internal(err) => tracing::error!(error = ?err, "internal error"),
            _ => {}
        }

        let message = self.public_message();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        if let AppError::AccessDenied(_) = self {
            return (status, [(header::LOCATION, "/")], axum::Json(body)).into_response();
        }

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
