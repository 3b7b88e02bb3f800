//! Success envelope.
//!
//! Every successful JSON body is `{ "success": true, "message"?: ..., "data"?: ... }`.

use std::borrow::Cow;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<Cow<'static, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip)]
    status: u16,
}

impl<T> ApiResponse<T> {
    /// 200 with a data payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            status: 200,
        }
    }

    /// 201 with a data payload.
    pub fn created(data: T) -> Self {
        Self {
            status: 201,
            ..Self::ok(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

impl ApiResponse<()> {
    /// 200 carrying only a message.
    pub fn message(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            status: 200,
        }
    }
}

#[cfg(feature = "axum")]
impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status)
            .unwrap_or(axum::http::StatusCode::OK);
        (status, axum::Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": [1, 2] }));
    }

    #[test]
    fn test_message_only_envelope() {
        let response = ApiResponse::message("Logged out");
        assert_eq!(response.status(), 200);
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "Logged out" }));
    }

    #[test]
    fn test_created_status() {
        let response = ApiResponse::created("x").with_message("Created");
        assert_eq!(response.status(), 201);
        assert_eq!(response.data(), Some(&"x"));
    }
}
