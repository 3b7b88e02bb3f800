//! Commerce Error Types

use axum::response::{IntoResponse, Response};
use kernel::{AppError, ErrorKind};
use thiserror::Error;

pub type CommerceResult<T> = Result<T, CommerceError>;

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("Order not found")]
    OrderNotFound,

    #[error("One or more products are unavailable")]
    ProductUnavailable,

    #[error("You cannot buy your own product")]
    OwnProduct,

    #[error("You already own one or more of these products")]
    AlreadyOwned,

    #[error("All products in an order must share a currency")]
    CurrencyMismatch,

    #[error("Order is {0}")]
    OrderNotPending(&'static str),

    #[error("You do not have access to this order")]
    NotOrderOwner,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Vendor profile required")]
    NotAVendor,

    #[error("Wallet not found")]
    WalletNotFound,

    #[error("Minimum withdrawal amount is {0}")]
    BelowMinimum(String),

    #[error("Insufficient wallet balance")]
    InsufficientBalance,

    #[error("Add bank details before requesting a withdrawal")]
    MissingBankDetails,

    #[error("Withdrawal not found")]
    WithdrawalNotFound,

    #[error("Withdrawal has already been processed")]
    WithdrawalProcessed,

    #[error("You have not purchased this product")]
    NotPurchased,

    #[error("Invalid or expired download link")]
    InvalidDownloadToken,

    #[error("File not found")]
    FileUnavailable,

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommerceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommerceError::OrderNotFound
            | CommerceError::PaymentNotFound
            | CommerceError::WalletNotFound
            | CommerceError::WithdrawalNotFound
            | CommerceError::FileUnavailable => ErrorKind::NotFound,
            CommerceError::ProductUnavailable
            | CommerceError::OwnProduct
            | CommerceError::CurrencyMismatch
            | CommerceError::BelowMinimum(_)
            | CommerceError::InsufficientBalance
            | CommerceError::MissingBankDetails => ErrorKind::BadRequest,
            CommerceError::AlreadyOwned
            | CommerceError::OrderNotPending(_)
            | CommerceError::WithdrawalProcessed => ErrorKind::Conflict,
            CommerceError::NotOrderOwner
            | CommerceError::NotAVendor
            | CommerceError::NotPurchased
            | CommerceError::InvalidDownloadToken => ErrorKind::Forbidden,
            CommerceError::InvalidSignature => ErrorKind::Unauthorized,
            CommerceError::App(e) => e.kind(),
            CommerceError::Database(_) | CommerceError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    fn log(&self) {
        match self {
            CommerceError::Database(e) => {
                tracing::error!(error = %e, "Commerce database error");
            }
            CommerceError::Internal(msg) => {
                tracing::error!(message = %msg, "Commerce internal error");
            }
            CommerceError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Commerce integration error");
            }
            CommerceError::InvalidSignature => {
                tracing::warn!("Webhook rejected: signature mismatch");
            }
            CommerceError::InvalidDownloadToken => {
                tracing::warn!("Download rejected: invalid or expired token");
            }
            _ => {
                tracing::debug!(error = %self, "Commerce error");
            }
        }
    }
}

impl From<CommerceError> for AppError {
    fn from(err: CommerceError) -> Self {
        match err {
            CommerceError::App(e) => e,
            CommerceError::Database(e) => AppError::from(e),
            CommerceError::Internal(msg) => {
                AppError::internal("Internal server error").with_detail(msg)
            }
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

impl From<platform::paystack::GatewayError> for CommerceError {
    fn from(err: platform::paystack::GatewayError) -> Self {
        CommerceError::App(err.into())
    }
}

impl IntoResponse for CommerceError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::paystack::GatewayError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(CommerceError::InvalidSignature).status_code(), 401);
        assert_eq!(AppError::from(CommerceError::InvalidDownloadToken).status_code(), 403);
        assert_eq!(AppError::from(CommerceError::WithdrawalProcessed).status_code(), 409);
        assert_eq!(AppError::from(CommerceError::InsufficientBalance).status_code(), 400);
        assert_eq!(
            AppError::from(CommerceError::OrderNotPending("paid")).message(),
            "Order is paid"
        );
    }

    #[test]
    fn test_gateway_errors() {
        let err = CommerceError::from(GatewayError::NotConfigured);
        assert_eq!(AppError::from(err).status_code(), 503);

        let err = CommerceError::from(GatewayError::Declined("Invalid key".into()));
        assert_eq!(AppError::from(err).message(), "Payment gateway: Invalid key");
    }
}
