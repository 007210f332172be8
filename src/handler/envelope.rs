//! JSON response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// `{ "code": int, "message": string, "data": value|null }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ResponseEnvelope {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Render with an explicit HTTP status; `code` is only the body field.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_data_serializes_as_null() {
        let json = serde_json::to_value(ResponseEnvelope::new(401, "unauthorized")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "code": 401, "message": "unauthorized", "data": null })
        );
    }

    #[test]
    fn test_status_is_independent_of_code() {
        let response = ResponseEnvelope::new(40100, "custom").into_response_with(StatusCode::UNAUTHORIZED);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
