//! Resource mappers.
//!
//! Each submodule adds one resource's operations to [`CanvasClient`](crate::CanvasClient)
//! and defines the payload types those operations send. Payloads are validated
//! before any request leaves the process.

pub mod courses;
pub mod module_items;
pub mod modules;
pub mod pages;
pub mod sections;

pub use courses::NewCourse;
pub use module_items::{
    CompletionRequirement, CompletionRequirementType, ModuleItemType, ModuleItemUpdate,
    NewModuleItem,
};
pub use modules::{ModuleUpdate, NewModule};
pub use pages::{EditingRoles, NewPage, PageUpdate};
pub use sections::{NewSection, SectionUpdate};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CanvasError, CanvasResult};

/// Wrap a payload in the key Canvas expects, e.g. `{"course": {...}}`.
pub(crate) fn wrap<T: Serialize>(key: &str, payload: &T) -> CanvasResult<Value> {
    let inner = serde_json::to_value(payload)
        .map_err(|e| CanvasError::validation(format!("cannot encode {key}: {e}")))?;
    let mut body = Map::new();
    body.insert(key.to_string(), inner);
    Ok(Value::Object(body))
}

/// Like [`wrap`], but rejects payloads that would change nothing.
pub(crate) fn wrap_update<T: Serialize>(key: &str, payload: &T) -> CanvasResult<Value> {
    let body = wrap(key, payload)?;
    let is_empty = body
        .get(key)
        .and_then(Value::as_object)
        .map_or(true, Map::is_empty);
    if is_empty {
        return Err(CanvasError::validation(format!(
            "nothing to update: provide at least one {key} field"
        )));
    }
    Ok(body)
}

pub(crate) fn require_text(field: &str, value: &str) -> CanvasResult<()> {
    if value.trim().is_empty() {
        return Err(CanvasError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_optional_text(field: &str, value: Option<&str>) -> CanvasResult<()> {
    value.map_or(Ok(()), |value| require_text(field, value))
}

pub(crate) fn validate_position(field: &str, position: Option<u32>) -> CanvasResult<()> {
    if position == Some(0) {
        return Err(CanvasError::validation(format!("{field} must be 1 or greater")));
    }
    Ok(())
}
