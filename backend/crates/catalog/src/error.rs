//! Catalog Error Types

use axum::response::{IntoResponse, Response};
use kernel::{AppError, ErrorKind};
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Vendor not found")]
    VendorNotFound,

    #[error("You already have a vendor profile")]
    VendorExists,

    #[error("Vendor profile required")]
    NotAVendor,

    #[error("Vendor account is {0}")]
    VendorNotApproved(&'static str),

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Category already exists")]
    CategoryExists,

    #[error("Product not found")]
    ProductNotFound,

    #[error("You do not have permission to modify this resource")]
    NotOwner,

    #[error("Review not found")]
    ReviewNotFound,

    #[error("You can only review products you have purchased")]
    NotPurchased,

    #[error("You have already reviewed this product")]
    AlreadyReviewed,

    #[error("File exceeds the maximum size of {max} bytes")]
    FileTooLarge { max: usize },

    #[error("File type .{0} is not allowed")]
    FileTypeNotAllowed(String),

    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::VendorNotFound
            | CatalogError::CategoryNotFound
            | CatalogError::ProductNotFound
            | CatalogError::ReviewNotFound => ErrorKind::NotFound,
            CatalogError::VendorExists
            | CatalogError::CategoryExists
            | CatalogError::AlreadyReviewed => ErrorKind::Conflict,
            CatalogError::NotAVendor
            | CatalogError::VendorNotApproved(_)
            | CatalogError::NotOwner
            | CatalogError::NotPurchased => ErrorKind::Forbidden,
            CatalogError::FileTooLarge { .. } => ErrorKind::PayloadTooLarge,
            CatalogError::FileTypeNotAllowed(_)
            | CatalogError::MissingFile
            | CatalogError::InvalidUpload(_)
            | CatalogError::InvalidStatus(_) => ErrorKind::BadRequest,
            CatalogError::App(e) => e.kind(),
            CatalogError::Database(_) | CatalogError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    fn log(&self) {
        match self {
            CatalogError::Database(e) => {
                tracing::error!(error = %e, "Catalog database error");
            }
            CatalogError::Internal(msg) => {
                tracing::error!(message = %msg, "Catalog internal error");
            }
            CatalogError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Catalog integration error");
            }
            CatalogError::NotOwner => {
                tracing::warn!("Ownership check failed");
            }
            _ => {
                tracing::debug!(error = %self, "Catalog error");
            }
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::App(e) => e,
            CatalogError::Database(e) => AppError::from(e),
            CatalogError::Internal(msg) => {
                AppError::internal("Internal server error").with_detail(msg)
            }
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

impl From<platform::storage::StorageError> for CatalogError {
    fn from(err: platform::storage::StorageError) -> Self {
        CatalogError::App(err.into())
    }
}

impl From<auth::AuthError> for CatalogError {
    fn from(err: auth::AuthError) -> Self {
        CatalogError::App(err.into())
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(CatalogError::ProductNotFound).status_code(), 404);
        assert_eq!(AppError::from(CatalogError::CategoryExists).status_code(), 409);
        assert_eq!(AppError::from(CatalogError::NotPurchased).status_code(), 403);
        assert_eq!(
            AppError::from(CatalogError::FileTooLarge { max: 10 }).status_code(),
            413
        );
        assert_eq!(
            AppError::from(CatalogError::FileTypeNotAllowed("exe".into())).message(),
            "File type .exe is not allowed"
        );
    }

    #[test]
    fn test_app_errors_pass_through() {
        let err = CatalogError::App(AppError::service_unavailable("File storage is not available"));
        let app = AppError::from(err);
        assert_eq!(app.status_code(), 503);
        assert_eq!(app.message(), "File storage is not available");
    }
}
