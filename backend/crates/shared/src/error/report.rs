//! Error report attached to error responses.
//!
//! `AppError::into_response` consumes the error, so the pieces the request
//! funnel needs for logging and debug output travel with the response as an
//! extension.

use super::kind::ErrorKind;

/// Snapshot of an [`AppError`](super::app_error::AppError) taken when it was rendered.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    /// The original message, before server errors are masked.
    pub message: String,
    /// Rendered source chain, outermost first.
    pub chain: Vec<String>,
}

impl ErrorReport {
    /// Raw detail for debug output: the innermost cause, or the message.
    pub fn detail(&self) -> &str {
        self.chain.last().map(String::as_str).unwrap_or(&self.message)
    }
}

impl From<&super::app_error::AppError> for ErrorReport {
    fn from(err: &super::app_error::AppError) -> Self {
        Self {
            kind: err.kind(),
            message: err.message().to_string(),
            chain: err.source_chain(),
        }
    }
}
