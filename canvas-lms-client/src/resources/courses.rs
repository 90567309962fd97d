//! Courses.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::{require_optional_text, require_text, wrap};
use crate::client::{ApiPath, CanvasClient, Pagination};
use crate::error::CanvasResult;
use crate::ids::{AccountRef, CanvasId};
use crate::JsonObject;

/// Fields for `POST accounts/:account_id/courses`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCourse {
    /// Course name.
    pub name: String,
    /// Short code, e.g. `BIO-101`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    /// SIS identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sis_course_id: Option<String>,
}

impl NewCourse {
    fn validate(&self) -> CanvasResult<()> {
        require_text("name", &self.name)?;
        require_optional_text("course_code", self.course_code.as_deref())?;
        require_optional_text("sis_course_id", self.sis_course_id.as_deref())
    }
}

impl CanvasClient {
    /// Courses visible to the token's user.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn list_courses(&self, pagination: Pagination) -> CanvasResult<Vec<Value>> {
        self.list(&ApiPath::new("courses"), Vec::new(), pagination)
            .await
    }

    /// One course.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn get_course(&self, course_id: CanvasId) -> CanvasResult<JsonObject> {
        self.get_object(&ApiPath::new("courses").push(course_id))
            .await
    }

    /// Create a course under an account.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Validation`](crate::CanvasError::Validation) for a blank name,
    /// otherwise any error from the request.
    pub async fn create_course(
        &self,
        account: AccountRef,
        course: &NewCourse,
    ) -> CanvasResult<JsonObject> {
        course.validate()?;
        let body = wrap("course", course)?;
        let path = ApiPath::new("accounts").push(account).push("courses");
        self.send_object(Method::POST, &path, Some(&body)).await
    }
}
