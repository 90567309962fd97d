//! Items inside a module.
//!
//! What an item must carry depends on its type:
//!
//! | type | content_id | page_url | external_url |
//! |---|---|---|---|
//! | `File`, `Discussion`, `Assignment`, `Quiz` | required | | |
//! | `ExternalTool` | required | | required |
//! | `Page` | optional | required | |
//! | `ExternalUrl` | | | required |
//! | `SubHeader` | | | |
//!
//! Fields a type does not use are dropped before the request is sent.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{require_optional_text, require_text, validate_position, wrap, wrap_update};
use crate::client::{ApiPath, CanvasClient, Pagination};
use crate::error::{CanvasError, CanvasResult};
use crate::ids::{CanvasId, PageSlug};
use crate::JsonObject;

/// Kind of content a module item points at. Serialized with Canvas's names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleItemType {
    /// A course file.
    File,
    /// A wiki page.
    Page,
    /// A discussion topic.
    Discussion,
    /// An assignment.
    Assignment,
    /// A quiz.
    Quiz,
    /// A text-only heading.
    SubHeader,
    /// A link to an external URL.
    ExternalUrl,
    /// An LTI tool launch.
    ExternalTool,
}

impl ModuleItemType {
    /// All types, in the order Canvas documents them.
    pub const ALL: [Self; 8] = [
        Self::File,
        Self::Page,
        Self::Discussion,
        Self::Assignment,
        Self::Quiz,
        Self::SubHeader,
        Self::ExternalUrl,
        Self::ExternalTool,
    ];

    /// Canvas's name for the type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Page => "Page",
            Self::Discussion => "Discussion",
            Self::Assignment => "Assignment",
            Self::Quiz => "Quiz",
            Self::SubHeader => "SubHeader",
            Self::ExternalUrl => "ExternalUrl",
            Self::ExternalTool => "ExternalTool",
        }
    }

    fn requires_content_id(self) -> bool {
        !matches!(self, Self::Page | Self::SubHeader | Self::ExternalUrl)
    }

    fn accepts_content_id(self) -> bool {
        !matches!(self, Self::SubHeader | Self::ExternalUrl)
    }

    fn uses_external_url(self) -> bool {
        matches!(self, Self::ExternalUrl | Self::ExternalTool)
    }
}

/// What a student must do to complete an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionRequirementType {
    /// View the item.
    MustView,
    /// Submit the assignment or quiz.
    MustSubmit,
    /// Post to the discussion.
    MustContribute,
    /// Mark the item done.
    MustMarkDone,
    /// Reach a minimum score.
    MinScore,
}

impl CompletionRequirementType {
    /// Wire names of every requirement type.
    pub const NAMES: [&'static str; 5] = [
        "must_view",
        "must_submit",
        "must_contribute",
        "must_mark_done",
        "min_score",
    ];
}

/// A completion requirement. `min_score` is present only for [`CompletionRequirementType::MinScore`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletionRequirement {
    #[serde(rename = "type")]
    kind: CompletionRequirementType,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_score: Option<f64>,
}

impl CompletionRequirement {
    /// Build a requirement. A score given for any type but `min_score` is ignored.
    ///
    /// # Errors
    ///
    /// Validation error if `min_score` is the type and no finite,
    /// non-negative score is given.
    pub fn new(kind: CompletionRequirementType, min_score: Option<f64>) -> CanvasResult<Self> {
        if kind != CompletionRequirementType::MinScore {
            return Ok(Self {
                kind,
                min_score: None,
            });
        }
        match min_score {
            Some(score) if score.is_finite() && score >= 0.0 => Ok(Self {
                kind,
                min_score: Some(score),
            }),
            Some(score) => Err(CanvasError::validation(format!(
                "min_score must be a non-negative number, got {score}"
            ))),
            None => Err(CanvasError::validation(
                "completion requirement min_score needs a min_score value",
            )),
        }
    }

    /// The requirement type.
    #[must_use]
    pub fn kind(&self) -> CompletionRequirementType {
        self.kind
    }

    /// The minimum score, for `min_score` requirements.
    #[must_use]
    pub fn min_score(&self) -> Option<f64> {
        self.min_score
    }
}

/// Fields for `POST courses/:course_id/modules/:module_id/items`.
#[derive(Debug, Clone, Serialize)]
pub struct NewModuleItem {
    /// Item title.
    pub title: String,
    /// Item type.
    #[serde(rename = "type")]
    pub kind: ModuleItemType,
    /// Id of the referenced content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<CanvasId>,
    /// 1-based position in the module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Indentation level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
    /// Page slug, for `Page` items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<PageSlug>,
    /// Target URL, for `ExternalUrl` and `ExternalTool` items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    /// Open in a new tab.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_tab: Option<bool>,
    /// Completion requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_requirement: Option<CompletionRequirement>,
}

impl NewModuleItem {
    /// An item of `kind` with only a title set.
    #[must_use]
    pub fn new(title: impl Into<String>, kind: ModuleItemType) -> Self {
        Self {
            title: title.into(),
            kind,
            content_id: None,
            position: None,
            indent: None,
            page_url: None,
            external_url: None,
            new_tab: None,
            completion_requirement: None,
        }
    }

    /// A `Page` item pointing at `page_url`.
    #[must_use]
    pub fn page(title: impl Into<String>, page_url: PageSlug) -> Self {
        Self {
            page_url: Some(page_url),
            ..Self::new(title, ModuleItemType::Page)
        }
    }

    /// Check the type rules and drop fields the type does not use.
    ///
    /// # Errors
    ///
    /// Validation error naming the first rule broken.
    pub fn prepared(&self) -> CanvasResult<Self> {
        require_text("title", &self.title)?;
        validate_position("position", self.position)?;

        let kind = self.kind;
        if kind.requires_content_id() && self.content_id.is_none() {
            return Err(CanvasError::validation(format!(
                "content_id is required for {} items",
                kind.as_str()
            )));
        }
        if kind == ModuleItemType::Page && self.page_url.is_none() {
            return Err(CanvasError::validation("page_url is required for Page items"));
        }
        if kind.uses_external_url() {
            match self.external_url.as_deref() {
                Some(url) if !url.trim().is_empty() => {}
                _ => {
                    return Err(CanvasError::validation(format!(
                        "external_url is required for {} items",
                        kind.as_str()
                    )))
                }
            }
        }

        let mut item = self.clone();
        if !kind.accepts_content_id() {
            item.content_id = None;
        }
        if kind != ModuleItemType::Page {
            item.page_url = None;
        }
        if !kind.uses_external_url() {
            item.external_url = None;
        }
        Ok(item)
    }
}

/// Fields for `PUT courses/:course_id/modules/:module_id/items/:item_id`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModuleItemUpdate {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New 1-based position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// New indentation level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
    /// New external URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    /// Open in a new tab.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_tab: Option<bool>,
    /// Replacement completion requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_requirement: Option<CompletionRequirement>,
    /// Publication state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl CanvasClient {
    /// Items of a module, in module order.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn list_module_items(
        &self,
        course_id: CanvasId,
        module_id: CanvasId,
        pagination: Pagination,
    ) -> CanvasResult<Vec<Value>> {
        self.list(&items_path(course_id, module_id), Vec::new(), pagination)
            .await
    }

    /// One module item.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request.
    pub async fn get_module_item(
        &self,
        course_id: CanvasId,
        module_id: CanvasId,
        item_id: CanvasId,
    ) -> CanvasResult<JsonObject> {
        self.get_object(&items_path(course_id, module_id).push(item_id))
            .await
    }

    /// Add an item to a module.
    ///
    /// # Errors
    ///
    /// Validation error if the item breaks its type's rules, otherwise any
    /// error from the request.
    pub async fn create_module_item(
        &self,
        course_id: CanvasId,
        module_id: CanvasId,
        item: &NewModuleItem,
    ) -> CanvasResult<JsonObject> {
        let item = item.prepared()?;
        let body = wrap("module_item", &item)?;
        self.send_object(Method::POST, &items_path(course_id, module_id), Some(&body))
            .await
    }

    /// Update a module item.
    ///
    /// # Errors
    ///
    /// Validation error if nothing would change or a field is malformed,
    /// otherwise any error from the request.
    pub async fn update_module_item(
        &self,
        course_id: CanvasId,
        module_id: CanvasId,
        item_id: CanvasId,
        update: &ModuleItemUpdate,
    ) -> CanvasResult<JsonObject> {
        require_optional_text("title", update.title.as_deref())?;
        require_optional_text("external_url", update.external_url.as_deref())?;
        validate_position("position", update.position)?;

        let body = wrap_update("module_item", update)?;
        let path = items_path(course_id, module_id).push(item_id);
        self.send_object(Method::PUT, &path, Some(&body)).await
    }

    /// Remove an item from a module. Returns the deleted item.
    ///
    /// # Errors
    ///
    /// Any transport, API or decoding error from the request; a missing item
    /// is an API error with status 404.
    pub async fn delete_module_item(
        &self,
        course_id: CanvasId,
        module_id: CanvasId,
        item_id: CanvasId,
    ) -> CanvasResult<JsonObject> {
        let path = items_path(course_id, module_id).push(item_id);
        self.send_object(Method::DELETE, &path, None).await
    }
}

fn items_path(course_id: CanvasId, module_id: CanvasId) -> ApiPath {
    ApiPath::new("courses")
        .push(course_id)
        .push("modules")
        .push(module_id)
        .push("items")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(raw: u64) -> CanvasId {
        CanvasId::new(raw).expect("id")
    }

    #[test]
    fn content_items_need_content_id() {
        for kind in [
            ModuleItemType::File,
            ModuleItemType::Discussion,
            ModuleItemType::Assignment,
            ModuleItemType::Quiz,
        ] {
            let err = NewModuleItem::new("Reading", kind)
                .prepared()
                .expect_err("missing content_id");
            assert!(err.to_string().contains("content_id"), "{kind:?}");
        }
    }

    #[test]
    fn page_items_need_slug() {
        assert!(NewModuleItem::new("Intro", ModuleItemType::Page).prepared().is_err());

        let slug = PageSlug::parse("intro").expect("slug");
        let item = NewModuleItem::page("Intro", slug).prepared().expect("valid");
        assert_eq!(
            wrap("module_item", &item).expect("wrap"),
            json!({ "module_item": { "title": "Intro", "type": "Page", "page_url": "intro" } })
        );
    }

    #[test]
    fn irrelevant_fields_are_dropped() {
        let item = NewModuleItem {
            external_url: Some("https://example.edu/syllabus".into()),
            content_id: Some(id(9)),
            page_url: Some(PageSlug::parse("stray").expect("slug")),
            ..NewModuleItem::new("Syllabus", ModuleItemType::ExternalUrl)
        };
        let body = wrap("module_item", &item.prepared().expect("valid")).expect("wrap");
        assert_eq!(
            body,
            json!({ "module_item": {
                "title": "Syllabus",
                "type": "ExternalUrl",
                "external_url": "https://example.edu/syllabus"
            } })
        );

        let header = NewModuleItem {
            content_id: Some(id(1)),
            ..NewModuleItem::new("Week 1", ModuleItemType::SubHeader)
        };
        assert!(header.prepared().expect("valid").content_id.is_none());
    }

    #[test]
    fn external_items_need_url() {
        let tool = NewModuleItem {
            content_id: Some(id(4)),
            external_url: Some("  ".into()),
            ..NewModuleItem::new("LTI", ModuleItemType::ExternalTool)
        };
        assert!(tool.prepared().is_err());
    }

    #[test]
    fn completion_requirement_rules() {
        let view = CompletionRequirement::new(CompletionRequirementType::MustView, Some(5.0))
            .expect("must_view");
        assert_eq!(view.min_score(), None);
        assert_eq!(serde_json::to_value(view).expect("json"), json!({ "type": "must_view" }));

        let score = CompletionRequirement::new(CompletionRequirementType::MinScore, Some(7.5))
            .expect("min_score");
        assert_eq!(
            serde_json::to_value(score).expect("json"),
            json!({ "type": "min_score", "min_score": 7.5 })
        );

        assert!(CompletionRequirement::new(CompletionRequirementType::MinScore, None).is_err());
        assert!(CompletionRequirement::new(CompletionRequirementType::MinScore, Some(-1.0)).is_err());
    }

    #[test]
    fn type_names_round_trip_through_serde() {
        for kind in ModuleItemType::ALL {
            let value = serde_json::to_value(kind).expect("json");
            assert_eq!(value, json!(kind.as_str()));
        }
        assert!(serde_json::from_value::<ModuleItemType>(json!("Video")).is_err());
        assert_eq!(
            serde_json::from_value::<CompletionRequirementType>(json!("must_mark_done"))
                .expect("type"),
            CompletionRequirementType::MustMarkDone
        );
    }

    #[test]
    fn zero_position_is_rejected() {
        let item = NewModuleItem {
            position: Some(0),
            ..NewModuleItem::page("Intro", PageSlug::parse("intro").expect("slug"))
        };
        assert!(item.prepared().is_err());
    }
}
