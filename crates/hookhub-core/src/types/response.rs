//! Response envelope for control-surface operations.

use serde::{Deserialize, Serialize};

/// Generic request/response envelope: `{ success, data?, error?, message? }`.
///
/// `error` carries a machine-readable code, `message` a human-readable one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Operation result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Machine-readable error code on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    /// A successful response carrying data.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// A successful response with no payload.
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: None,
        }
    }

    /// A failed response.
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(code.into()),
            message: Some(message.into()),
        }
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_omits_data() {
        let resp = ApiResponse::failure("NOT_FOUND", "no such hook");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": "NOT_FOUND",
                "message": "no such hook"
            })
        );
    }

    #[test]
    fn test_empty_is_bare_success() {
        let json = serde_json::to_string(&ApiResponse::empty()).expect("serialize");
        assert_eq!(json, r#"{"success":true}"#);
    }
}
