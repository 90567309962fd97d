//! Course modules.

use reqwest::Method;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::{require_optional_text, require_text, validate_position, wrap, wrap_update};
use crate::client::{ApiPath, CanvasClient, Pagination};
use crate::error::CanvasResult;
use crate::ids::CanvasId;
use crate::JsonObject;

/// Fields for `POST courses/:course_id/modules`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewModule {
    /// Module name.
    pub name: String,
    /// 1-based position among the course's modules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// ISO 8601 unlock date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<String>,
    /// Whether items must be completed in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_sequential_progress: Option<bool>,
    /// Modules that must be completed first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prerequisite_module_ids: Vec<CanvasId>,
    /// Whether completing the module publishes the final grade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_final_grade: Option<bool>,
}

/// Fields for `PUT courses/:course_id/modules/:module_id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModuleUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New 1-based position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// New unlock date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<String>,
    /// Sequential progress flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_sequential_progress: Option<bool>,
    /// Replacement prerequisites; `Some(vec![])` clears them.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_prerequisites"
    )]
    pub prerequisite_module_ids: Option<Vec<CanvasId>>,
    /// Publish-final-grade flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_final_grade: Option<bool>,
    /// Publication state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

// Canvas ignores an empty array; a single blank entry is how prerequisites are cleared.
#[allow(clippy::ref_option)]
fn serialize_prerequisites<S: Serializer>(
    ids: &Option<Vec<CanvasId>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ids {
        Some(ids) if !ids.is_empty() => ids.serialize(serializer),
        _ => [""].serialize(serializer),
    }
}

impl CanvasClient {
    /// Modules of a course, in course order.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn list_modules(
        &self,
        course_id: CanvasId,
        pagination: Pagination,
    ) -> CanvasResult<Vec<Value>> {
        self.list(&modules_path(course_id), Vec::new(), pagination)
            .await
    }

    /// One module.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn get_module(
        &self,
        course_id: CanvasId,
        module_id: CanvasId,
    ) -> CanvasResult<JsonObject> {
        self.get_object(&modules_path(course_id).push(module_id))
            .await
    }

    /// Create a module.
    ///
    /// # Errors
    ///
    /// Validation error for a blank name or a zero position, otherwise any
    /// error from the request.
    pub async fn create_module(
        &self,
        course_id: CanvasId,
        module: &NewModule,
    ) -> CanvasResult<JsonObject> {
        require_text("name", &module.name)?;
        validate_position("position", module.position)?;
        require_optional_text("unlock_at", module.unlock_at.as_deref())?;

        let body = wrap("module", module)?;
        self.send_object(Method::POST, &modules_path(course_id), Some(&body))
            .await
    }

    /// Update a module.
    ///
    /// # Errors
    ///
    /// Validation error if nothing would change or a field is malformed,
    /// otherwise any error from the request.
    pub async fn update_module(
        &self,
        course_id: CanvasId,
        module_id: CanvasId,
        update: &ModuleUpdate,
    ) -> CanvasResult<JsonObject> {
        require_optional_text("name", update.name.as_deref())?;
        validate_position("position", update.position)?;
        require_optional_text("unlock_at", update.unlock_at.as_deref())?;

        let body = wrap_update("module", update)?;
        let path = modules_path(course_id).push(module_id);
        self.send_object(Method::PUT, &path, Some(&body)).await
    }

    /// Delete a module. Returns the deleted module.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn delete_module(
        &self,
        course_id: CanvasId,
        module_id: CanvasId,
    ) -> CanvasResult<JsonObject> {
        let path = modules_path(course_id).push(module_id);
        self.send_object(Method::DELETE, &path, None).await
    }
}

fn modules_path(course_id: CanvasId) -> ApiPath {
    ApiPath::new("courses").push(course_id).push("modules")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(raw: u64) -> CanvasId {
        CanvasId::new(raw).expect("id")
    }

    #[test]
    fn new_module_omits_absent_fields() {
        let module = NewModule {
            name: "Week 1".into(),
            prerequisite_module_ids: vec![id(3), id(4)],
            ..NewModule::default()
        };
        assert_eq!(
            wrap("module", &module).expect("wrap"),
            json!({ "module": { "name": "Week 1", "prerequisite_module_ids": [3, 4] } })
        );
    }

    #[test]
    fn empty_prerequisites_clear_on_update() {
        let update = ModuleUpdate {
            prerequisite_module_ids: Some(Vec::new()),
            ..ModuleUpdate::default()
        };
        assert_eq!(
            wrap_update("module", &update).expect("wrap"),
            json!({ "module": { "prerequisite_module_ids": [""] } })
        );
    }

    #[test]
    fn update_without_fields_is_rejected() {
        assert!(wrap_update("module", &ModuleUpdate::default()).is_err());
    }
}
