//! Field-level request validation.
//!
//! DTOs implement [`Validate`]; violations are collected by a [`Validator`]
//! and surface as one 400 with every failing field listed.

use crate::error::app_error::AppError;

pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Accumulates field violations.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation when `ok` is false.
    pub fn check(&mut self, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(message.into());
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), format!("{field} is required"))
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        self.check(
            (min..=max).contains(&len),
            format!("{field} must be between {min} and {max} characters"),
        )
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_email(value), format!("{field} must be a valid email address"))
    }

    pub fn range<N: PartialOrd + std::fmt::Display>(
        &mut self,
        field: &str,
        value: N,
        min: N,
        max: N,
    ) -> &mut Self {
        let message = format!("{field} must be between {min} and {max}");
        self.check(value >= min && value <= max, message)
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn finish(&self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::bad_request(format!(
                "Validation failed: {}",
                self.errors.join("; ")
            )))
        }
    }
}

/// Loose structural check: one `@`, non-empty local part, dotted domain.
pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_violation() {
        let mut v = Validator::new();
        v.required("name", " ")
            .email("email", "not-an-email")
            .range("rating", 6, 1, 5);
        assert_eq!(v.errors().len(), 3);
        let err = v.finish().unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().starts_with("Validation failed: name is required"));
    }

    #[test]
    fn test_passes_clean_input() {
        let mut v = Validator::new();
        v.length("title", "Rust ebook", 3, 120).email("email", "ada@example.com");
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a@@b.co"));
        assert!(!is_email("a b@c.co"));
    }
}
