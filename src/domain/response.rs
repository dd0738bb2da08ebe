//! The `{success, data, error}` envelope shared by every storage operation

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Success without a payload (delete)
    pub fn ok_empty() -> Self {
        ApiResponse {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Success carrying fallback data plus the failure that caused it
    pub fn degraded(data: T, error: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: Some(error.into()),
        }
    }

    /// True when the call "succeeded" only by falling back
    pub fn is_degraded(&self) -> bool {
        self.success && self.error.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_ok_omits_error() {
        let value = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(value, json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn test_fail_omits_data() {
        let value = serde_json::to_value(ApiResponse::<Value>::fail("Notice not found")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "Notice not found"}));
    }

    #[test]
    fn test_delete_body_decodes() {
        let response: ApiResponse<Value> = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(response.success);
        assert!(response.data.is_none());
        assert!(!response.is_degraded());
    }

    #[test]
    fn test_degraded_is_distinguishable() {
        let response = ApiResponse::degraded(Vec::<Value>::new(), "connection refused");
        assert!(response.success);
        assert!(response.is_degraded());
        assert_eq!(response.data, Some(vec![]));
    }
}
