//! The uniform error shape returned to MCP callers.

use canvas_lms_client::{CanvasError, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Tool arguments were rejected before any Canvas call.
pub const INVALID_PARAMS: i32 = -32602;
/// Canvas credentials are not configured.
pub const CONFIGURATION_ERROR: i32 = -32001;
/// Canvas could not be reached.
pub const TRANSPORT_ERROR: i32 = -32002;
/// Canvas answered with a non-success status.
pub const API_ERROR: i32 = -32003;
/// A composite tool completed some steps before failing.
pub const PARTIAL_FAILURE: i32 = -32004;
/// Canvas answered with a body that could not be used.
pub const UNEXPECTED_RESPONSE: i32 = -32005;
/// The request was cancelled by the client.
pub const REQUEST_CANCELLED: i32 = -32800;

/// A failed tool call, as the caller sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error classification.
    pub kind: ErrorKind,
    /// Human-readable summary.
    pub message: String,
    /// Whether repeating the same call may succeed.
    pub retryable: bool,
    /// HTTP status, for API errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Canvas API path involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Individual Canvas messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// What a composite created before failing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<Value>,
    /// The failing step's error, for partial failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ToolError>>,
}

impl ToolError {
    /// JSON-RPC error code for this kind.
    #[must_use]
    pub fn json_rpc_code(&self) -> i32 {
        match self.kind {
            ErrorKind::ValidationError => INVALID_PARAMS,
            ErrorKind::ConfigurationError => CONFIGURATION_ERROR,
            ErrorKind::TransportError => TRANSPORT_ERROR,
            ErrorKind::ApiError => API_ERROR,
            ErrorKind::PartialFailure => PARTIAL_FAILURE,
            ErrorKind::UnexpectedResponse => UNEXPECTED_RESPONSE,
            ErrorKind::Cancelled => REQUEST_CANCELLED,
        }
    }
}

impl From<&CanvasError> for ToolError {
    fn from(error: &CanvasError) -> Self {
        let mut shaped = Self {
            kind: error.kind(),
            message: error.to_string(),
            retryable: error.is_retryable(),
            status: error.status(),
            path: error.path().map(str::to_owned),
            errors: Vec::new(),
            completed: None,
            cause: None,
        };

        match error {
            CanvasError::Api { errors, .. } => shaped.errors.clone_from(errors),
            CanvasError::PartialFailure {
                completed, cause, ..
            } => {
                shaped.completed = serde_json::to_value(completed.as_ref()).ok();
                shaped.cause = Some(Box::new(Self::from(cause.as_ref())));
            }
            _ => {}
        }
        shaped
    }
}

impl From<CanvasError> for ToolError {
    fn from(error: CanvasError) -> Self {
        Self::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_lms_client::{ConfigError, CreatedPage, PageSlug};
    use serde_json::json;

    #[test]
    fn api_error_shape() {
        let error = ToolError::from(CanvasError::Api {
            status: 404,
            message: "The specified resource does not exist.".into(),
            errors: vec!["The specified resource does not exist.".into()],
            path: "courses/1/modules/2/items/3".into(),
        });
        assert_eq!(error.json_rpc_code(), API_ERROR);

        let value = serde_json::to_value(&error).expect("json");
        assert_eq!(value["kind"], json!("api_error"));
        assert_eq!(value["status"], json!(404));
        assert_eq!(value["retryable"], json!(false));
        assert_eq!(value["path"], json!("courses/1/modules/2/items/3"));
        assert!(value.get("completed").is_none());
    }

    #[test]
    fn partial_failure_nests_cause_and_completed() {
        let page = json!({ "url": "week-1", "title": "Week 1" });
        let error = ToolError::from(CanvasError::PartialFailure {
            operation: "create_page_and_add_to_module",
            completed: Box::new(CreatedPage {
                page_url: Some(PageSlug::parse("week-1").expect("slug")),
                page: page.as_object().cloned().expect("object"),
            }),
            cause: Box::new(CanvasError::Api {
                status: 403,
                message: "unauthorized".into(),
                errors: vec!["unauthorized".into()],
                path: "courses/1/modules/2/items".into(),
            }),
        });

        assert_eq!(error.json_rpc_code(), PARTIAL_FAILURE);
        let value = serde_json::to_value(&error).expect("json");
        assert_eq!(value["kind"], json!("partial_failure"));
        assert_eq!(value["completed"]["page_url"], json!("week-1"));
        assert_eq!(value["completed"]["page"]["title"], json!("Week 1"));
        assert_eq!(value["cause"]["kind"], json!("api_error"));
        assert_eq!(value["cause"]["status"], json!(403));
    }

    #[test]
    fn configuration_and_validation_codes() {
        let config = ToolError::from(CanvasError::from(ConfigError::Missing {
            missing: "CANVAS_API_TOKEN".into(),
        }));
        assert_eq!(config.json_rpc_code(), CONFIGURATION_ERROR);
        assert!(!config.retryable);

        let validation = ToolError::from(CanvasError::Validation("bad".into()));
        assert_eq!(validation.json_rpc_code(), INVALID_PARAMS);
        assert_eq!(ToolError::from(CanvasError::Cancelled).json_rpc_code(), REQUEST_CANCELLED);
    }
}
