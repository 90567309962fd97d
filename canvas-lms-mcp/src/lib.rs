//! # Canvas LMS MCP
//!
//! MCP (Model Context Protocol) tools over the Canvas LMS client.
//!
//! ## MCP Tools
//!
//! - Courses: `get_courses`, `get_course`, `create_course`
//! - Sections: `create_section`, `list_sections`, `get_section`, `update_section`,
//!   `delete_section`, `cross_list_section`
//! - Modules: `list_modules`, `get_module`, `create_module`, `update_module`, `delete_module`
//! - Module items: `list_module_items`, `get_module_item`, `create_module_item`,
//!   `update_module_item`, `delete_module_item`
//! - Pages: `list_pages`, `get_page`, `create_page`, `update_page`, `delete_page`
//! - Composite: `add_page_to_module`, `create_page_and_add_to_module`
//!
//! Failures are reported as JSON-RPC errors whose `data` is a [`ToolError`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod metrics;
pub mod schema;
pub mod server;
pub mod tools;

// Re-export key types for convenience
pub use error::ToolError;
pub use server::{
    CanvasLmsMcpServer, JsonRpcError, JsonRpcRequest, JsonRpcResponse, DEFAULT_SCOPE,
};

use canvas_lms_client::CanvasResult;
use serde::{Deserialize, Serialize};

/// MCP tool response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Result data (if successful).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl ToolResponse {
    /// Create a success response.
    #[must_use]
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn failure(error: ToolError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Shape a tool outcome.
    #[must_use]
    pub fn from_result(result: CanvasResult<serde_json::Value>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(ToolError::from(e)),
        }
    }
}
