//! Course sections.
//!
//! Sections are addressed by their own id once created. Moving a section to
//! another course goes through the cross-list endpoint, never through an
//! update of `course_id`.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::{require_optional_text, require_text, wrap, wrap_update};
use crate::client::{ApiPath, CanvasClient, Pagination};
use crate::error::CanvasResult;
use crate::ids::CanvasId;
use crate::JsonObject;

/// Fields for `POST courses/:course_id/sections`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSection {
    /// Section name.
    pub name: String,
    /// SIS identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sis_section_id: Option<String>,
}

/// Fields for `PUT sections/:section_id`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionUpdate {
    /// New section name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CanvasClient {
    /// Sections of a course.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn list_sections(
        &self,
        course_id: CanvasId,
        pagination: Pagination,
    ) -> CanvasResult<Vec<Value>> {
        let path = ApiPath::new("courses").push(course_id).push("sections");
        self.list(&path, Vec::new(), pagination).await
    }

    /// One section.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn get_section(&self, section_id: CanvasId) -> CanvasResult<JsonObject> {
        self.get_object(&section_path(section_id)).await
    }

    /// Create a section in a course.
    ///
    /// # Errors
    ///
    /// Validation error for a blank name, otherwise any error from the request.
    pub async fn create_section(
        &self,
        course_id: CanvasId,
        section: &NewSection,
    ) -> CanvasResult<JsonObject> {
        require_text("name", &section.name)?;
        require_optional_text("sis_section_id", section.sis_section_id.as_deref())?;

        let body = wrap("course_section", section)?;
        let path = ApiPath::new("courses").push(course_id).push("sections");
        self.send_object(Method::POST, &path, Some(&body)).await
    }

    /// Rename a section.
    ///
    /// # Errors
    ///
    /// Validation error if nothing would change or the name is blank,
    /// otherwise any error from the request.
    pub async fn update_section(
        &self,
        section_id: CanvasId,
        update: &SectionUpdate,
    ) -> CanvasResult<JsonObject> {
        require_optional_text("name", update.name.as_deref())?;
        let body = wrap_update("course_section", update)?;
        self.send_object(Method::PUT, &section_path(section_id), Some(&body))
            .await
    }

    /// Delete a section. Returns the deleted section.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn delete_section(&self, section_id: CanvasId) -> CanvasResult<JsonObject> {
        self.send_object(Method::DELETE, &section_path(section_id), None)
            .await
    }

    /// Move a section into another course.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn cross_list_section(
        &self,
        section_id: CanvasId,
        new_course_id: CanvasId,
    ) -> CanvasResult<JsonObject> {
        let path = section_path(section_id).push("crosslist").push(new_course_id);
        tracing::info!(%section_id, %new_course_id, "cross-listing section");
        self.send_object(Method::POST, &path, None).await
    }
}

fn section_path(section_id: CanvasId) -> ApiPath {
    ApiPath::new("sections").push(section_id)
}
