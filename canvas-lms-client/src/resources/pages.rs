//! Wiki pages, addressed by slug.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{require_optional_text, require_text, wrap, wrap_update};
use crate::client::{ApiPath, CanvasClient, Pagination};
use crate::error::{CanvasError, CanvasResult};
use crate::ids::{CanvasId, PageSlug};
use crate::JsonObject;

/// Who may edit a page: a comma-separated subset of [`EditingRoles::ALLOWED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EditingRoles(String);

impl EditingRoles {
    /// Roles Canvas accepts.
    pub const ALLOWED: [&'static str; 4] = ["teachers", "students", "members", "public"];

    /// Parse and normalize (trimmed, lowercase, duplicates removed).
    ///
    /// # Errors
    ///
    /// Validation error for an empty list or an unknown role.
    pub fn parse(raw: &str) -> CanvasResult<Self> {
        let mut roles: Vec<String> = Vec::new();
        for role in raw.split(',').map(|r| r.trim().to_ascii_lowercase()) {
            if role.is_empty() {
                continue;
            }
            if !Self::ALLOWED.contains(&role.as_str()) {
                return Err(CanvasError::validation(format!(
                    "unknown editing role {role:?}; expected a comma-separated list of {}",
                    Self::ALLOWED.join(", ")
                )));
            }
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        if roles.is_empty() {
            return Err(CanvasError::validation("editing_roles must name at least one role"));
        }
        Ok(Self(roles.join(",")))
    }

    /// The normalized list.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EditingRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EditingRoles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|e| serde::de::Error::custom(e.into_message()))
    }
}

/// Fields for `POST courses/:course_id/pages`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPage {
    /// Page title; Canvas derives the slug from it.
    pub title: String,
    /// HTML body.
    pub body: String,
    /// Who may edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing_roles: Option<EditingRoles>,
    /// Publication state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    /// Make this the course front page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_page: Option<bool>,
}

/// Fields for `PUT courses/:course_id/pages/:url`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageUpdate {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Who may edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing_roles: Option<EditingRoles>,
    /// Publication state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    /// Front page flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_page: Option<bool>,
}

impl CanvasClient {
    /// Pages of a course, optionally filtered by a title search.
    ///
    /// A blank `search_term` is ignored.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn list_pages(
        &self,
        course_id: CanvasId,
        search_term: Option<&str>,
        pagination: Pagination,
    ) -> CanvasResult<Vec<Value>> {
        let query = search_term
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| vec![("search_term".to_string(), term.to_string())])
            .unwrap_or_default();
        self.list(&pages_path(course_id), query, pagination).await
    }

    /// One page, including its body.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn get_page(&self, course_id: CanvasId, page_url: &PageSlug) -> CanvasResult<JsonObject> {
        self.get_object(&pages_path(course_id).push(page_url)).await
    }

    /// Create a page. The returned representation carries the assigned slug in `url`.
    ///
    /// # Errors
    ///
    /// Validation error for a blank title, otherwise any error from the request.
    pub async fn create_page(&self, course_id: CanvasId, page: &NewPage) -> CanvasResult<JsonObject> {
        require_text("title", &page.title)?;
        let body = wrap("wiki_page", page)?;
        self.send_object(Method::POST, &pages_path(course_id), Some(&body))
            .await
    }

    /// Update a page.
    ///
    /// # Errors
    ///
    /// Validation error if nothing would change or the title is blank,
    /// otherwise any error from the request.
    pub async fn update_page(
        &self,
        course_id: CanvasId,
        page_url: &PageSlug,
        update: &PageUpdate,
    ) -> CanvasResult<JsonObject> {
        require_optional_text("title", update.title.as_deref())?;
        let body = wrap_update("wiki_page", update)?;
        let path = pages_path(course_id).push(page_url);
        self.send_object(Method::PUT, &path, Some(&body)).await
    }

    /// Delete a page. Returns the deleted page.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn delete_page(&self, course_id: CanvasId, page_url: &PageSlug) -> CanvasResult<JsonObject> {
        let path = pages_path(course_id).push(page_url);
        self.send_object(Method::DELETE, &path, None).await
    }
}

fn pages_path(course_id: CanvasId) -> ApiPath {
    ApiPath::new("courses").push(course_id).push("pages")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn editing_roles_are_normalized() {
        let roles = EditingRoles::parse(" Teachers, students ,teachers").expect("roles");
        assert_eq!(roles.as_str(), "teachers,students");
    }

    #[test]
    fn editing_roles_reject_unknown_and_empty() {
        assert!(EditingRoles::parse("teachers,admins").is_err());
        assert!(EditingRoles::parse(" , ").is_err());
        assert!(serde_json::from_value::<EditingRoles>(json!("owners")).is_err());
    }

    #[test]
    fn new_page_body() {
        let page = NewPage {
            title: "Week 1".into(),
            body: "<p>Hello</p>".into(),
            editing_roles: Some(EditingRoles::parse("teachers").expect("roles")),
            published: Some(true),
            front_page: None,
        };
        assert_eq!(
            wrap("wiki_page", &page).expect("wrap"),
            json!({ "wiki_page": {
                "title": "Week 1",
                "body": "<p>Hello</p>",
                "editing_roles": "teachers",
                "published": true
            } })
        );
    }
}
