//! Tool parameters and dispatch.
//!
//! Each tool deserializes its arguments into a parameter struct (unknown
//! fields are rejected), builds the client payload and delegates to exactly
//! one client or composite operation.

use canvas_lms_client::composite::{self, PagePlacement};
use canvas_lms_client::resources::{
    CompletionRequirement, CompletionRequirementType, EditingRoles, ModuleItemType,
    ModuleItemUpdate, ModuleUpdate, NewCourse, NewModule, NewModuleItem, NewPage, NewSection,
    PageUpdate, SectionUpdate,
};
use canvas_lms_client::{
    AccountRef, CanvasClient, CanvasError, CanvasId, CanvasResult, CancellationToken, PageSlug,
    Pagination,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Every tool name, in listing order.
pub const TOOL_NAMES: [&str; 26] = [
    "get_courses",
    "get_course",
    "create_course",
    "create_section",
    "list_sections",
    "get_section",
    "update_section",
    "delete_section",
    "cross_list_section",
    "list_modules",
    "get_module",
    "create_module",
    "update_module",
    "delete_module",
    "list_module_items",
    "get_module_item",
    "create_module_item",
    "update_module_item",
    "delete_module_item",
    "list_pages",
    "get_page",
    "create_page",
    "update_page",
    "delete_page",
    "add_page_to_module",
    "create_page_and_add_to_module",
];

/// Parameters for `get_courses`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListCoursesParams {
    /// Return only the first page of results.
    #[serde(default)]
    pub first_page_only: bool,
}

/// Parameters for tools addressing one course.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseParams {
    /// Course id.
    pub course_id: CanvasId,
}

/// Parameters for tools listing a course's children.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseListParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Return only the first page of results.
    #[serde(default)]
    pub first_page_only: bool,
}

/// Parameters for `create_course`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCourseParams {
    /// Account id, or `self`.
    pub account_id: AccountRef,
    /// Course name.
    pub name: String,
    /// Course code.
    #[serde(default)]
    pub course_code: Option<String>,
    /// SIS id.
    #[serde(default)]
    pub sis_course_id: Option<String>,
}

/// Parameters for `create_section`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSectionParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Section name.
    pub section_name: String,
    /// SIS id.
    #[serde(default)]
    pub sis_section_id: Option<String>,
}

/// Parameters for tools addressing one section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionParams {
    /// Section id.
    pub section_id: CanvasId,
}

/// Parameters for `update_section`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSectionParams {
    /// Section id.
    pub section_id: CanvasId,
    /// New name.
    #[serde(default)]
    pub section_name: Option<String>,
}

/// Parameters for `cross_list_section`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrossListParams {
    /// Section to move.
    pub section_id: CanvasId,
    /// Course to move it into.
    pub new_course_id: CanvasId,
}

/// Parameters for tools addressing one module.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Module id.
    pub module_id: CanvasId,
}

/// Parameters for `list_module_items`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleListParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Module id.
    pub module_id: CanvasId,
    /// Return only the first page of results.
    #[serde(default)]
    pub first_page_only: bool,
}

/// Parameters for `create_module`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateModuleParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Module name.
    pub name: String,
    /// 1-based position.
    #[serde(default)]
    pub position: Option<u32>,
    /// ISO 8601 unlock date.
    #[serde(default)]
    pub unlock_at: Option<String>,
    /// Require items in order.
    #[serde(default)]
    pub require_sequential_progress: Option<bool>,
    /// Prerequisite module ids.
    #[serde(default)]
    pub prerequisite_module_ids: Option<Vec<CanvasId>>,
    /// Publish final grade on completion.
    #[serde(default)]
    pub publish_final_grade: Option<bool>,
}

/// Parameters for `update_module`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateModuleParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Module id.
    pub module_id: CanvasId,
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New position.
    #[serde(default)]
    pub position: Option<u32>,
    /// New unlock date.
    #[serde(default)]
    pub unlock_at: Option<String>,
    /// Require items in order.
    #[serde(default)]
    pub require_sequential_progress: Option<bool>,
    /// Replacement prerequisites; an empty list clears them.
    #[serde(default)]
    pub prerequisite_module_ids: Option<Vec<CanvasId>>,
    /// Publish final grade on completion.
    #[serde(default)]
    pub publish_final_grade: Option<bool>,
    /// Publication state.
    #[serde(default)]
    pub published: Option<bool>,
}

/// Parameters for tools addressing one module item.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleItemParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Module id.
    pub module_id: CanvasId,
    /// Item id.
    pub item_id: CanvasId,
}

/// Parameters for `create_module_item`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateModuleItemParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Module id.
    pub module_id: CanvasId,
    /// Item title.
    pub title: String,
    /// Item type.
    #[serde(rename = "type")]
    pub kind: ModuleItemType,
    /// Referenced content id.
    #[serde(default)]
    pub content_id: Option<CanvasId>,
    /// 1-based position.
    #[serde(default)]
    pub position: Option<u32>,
    /// Indentation level.
    #[serde(default)]
    pub indent: Option<u32>,
    /// Page slug, for `Page` items.
    #[serde(default)]
    pub page_url: Option<PageSlug>,
    /// URL, for `ExternalUrl` and `ExternalTool` items.
    #[serde(default)]
    pub external_url: Option<String>,
    /// Open in a new tab.
    #[serde(default)]
    pub new_tab: Option<bool>,
    /// Completion requirement type.
    #[serde(default)]
    pub completion_requirement_type: Option<CompletionRequirementType>,
    /// Score for `min_score` requirements.
    #[serde(default)]
    pub min_score: Option<f64>,
}

/// Parameters for `update_module_item`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateModuleItemParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Module id.
    pub module_id: CanvasId,
    /// Item id.
    pub item_id: CanvasId,
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New position.
    #[serde(default)]
    pub position: Option<u32>,
    /// New indentation level.
    #[serde(default)]
    pub indent: Option<u32>,
    /// New external URL.
    #[serde(default)]
    pub external_url: Option<String>,
    /// Open in a new tab.
    #[serde(default)]
    pub new_tab: Option<bool>,
    /// Completion requirement type.
    #[serde(default)]
    pub completion_requirement_type: Option<CompletionRequirementType>,
    /// Score for `min_score` requirements.
    #[serde(default)]
    pub min_score: Option<f64>,
    /// Publication state.
    #[serde(default)]
    pub published: Option<bool>,
}

/// Parameters for `list_pages`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListPagesParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Title search.
    #[serde(default)]
    pub search_term: Option<String>,
    /// Return only the first page of results.
    #[serde(default)]
    pub first_page_only: bool,
}

/// Parameters for tools addressing one page.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Page slug.
    pub page_url: PageSlug,
}

/// Parameters for `create_page`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePageParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Page title.
    pub title: String,
    /// HTML body.
    pub body: String,
    /// Who may edit.
    #[serde(default)]
    pub editing_roles: Option<EditingRoles>,
    /// Publication state.
    #[serde(default)]
    pub published: Option<bool>,
    /// Make this the front page.
    #[serde(default)]
    pub front_page: Option<bool>,
}

/// Parameters for `update_page`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePageParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Page slug.
    pub page_url: PageSlug,
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New HTML body.
    #[serde(default)]
    pub body: Option<String>,
    /// Who may edit.
    #[serde(default)]
    pub editing_roles: Option<EditingRoles>,
    /// Publication state.
    #[serde(default)]
    pub published: Option<bool>,
    /// Front page flag.
    #[serde(default)]
    pub front_page: Option<bool>,
}

/// Parameters for `add_page_to_module`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddPageToModuleParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Module id.
    pub module_id: CanvasId,
    /// Slug of the existing page.
    pub page_url: PageSlug,
    /// Item title; defaults to the page title.
    #[serde(default)]
    pub title: Option<String>,
    /// 1-based position.
    #[serde(default)]
    pub position: Option<u32>,
    /// Indentation level.
    #[serde(default)]
    pub indent: Option<u32>,
    /// Open in a new tab.
    #[serde(default)]
    pub new_tab: Option<bool>,
}

/// Parameters for `create_page_and_add_to_module`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePageAndAddParams {
    /// Course id.
    pub course_id: CanvasId,
    /// Module id.
    pub module_id: CanvasId,
    /// Page title, also used as the item title.
    pub title: String,
    /// HTML body.
    pub body: String,
    /// Who may edit.
    #[serde(default)]
    pub editing_roles: Option<EditingRoles>,
    /// Publication state; defaults to published.
    #[serde(default = "published_by_default")]
    pub published: Option<bool>,
    /// Make this the front page.
    #[serde(default)]
    pub front_page: Option<bool>,
    /// Item position in the module.
    #[serde(default)]
    pub module_item_position: Option<u32>,
    /// Item indentation level.
    #[serde(default)]
    pub module_item_indent: Option<u32>,
    /// Open in a new tab.
    #[serde(default)]
    pub new_tab: Option<bool>,
}

#[allow(clippy::unnecessary_wraps)]
fn published_by_default() -> Option<bool> {
    Some(true)
}

fn pagination(first_page_only: bool) -> Pagination {
    if first_page_only {
        Pagination::FirstPage
    } else {
        Pagination::All
    }
}

fn completion(
    kind: Option<CompletionRequirementType>,
    min_score: Option<f64>,
) -> CanvasResult<Option<CompletionRequirement>> {
    match (kind, min_score) {
        (Some(kind), min_score) => CompletionRequirement::new(kind, min_score).map(Some),
        (None, Some(_)) => Err(CanvasError::Validation(
            "min_score requires completion_requirement_type".into(),
        )),
        (None, None) => Ok(None),
    }
}

fn parse<T: DeserializeOwned>(tool: &str, arguments: Value) -> CanvasResult<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| CanvasError::Validation(format!("{tool}: {e}")))
}

fn object(value: canvas_lms_client::JsonObject) -> Value {
    Value::Object(value)
}

/// Run one tool against Canvas.
///
/// `cancel` is observed by composite tools; single-request tools run to completion.
///
/// # Errors
///
/// A validation error for an unknown tool or malformed arguments, otherwise
/// whatever the delegated operation returns.
#[allow(clippy::too_many_lines)]
pub async fn call_tool(
    client: &CanvasClient,
    name: &str,
    arguments: Value,
    cancel: &CancellationToken,
) -> CanvasResult<Value> {
    match name {
        // Courses
        "get_courses" => {
            let p: ListCoursesParams = parse(name, arguments)?;
            client
                .list_courses(pagination(p.first_page_only))
                .await
                .map(Value::Array)
        }
        "get_course" => {
            let p: CourseParams = parse(name, arguments)?;
            client.get_course(p.course_id).await.map(object)
        }
        "create_course" => {
            let p: CreateCourseParams = parse(name, arguments)?;
            let course = NewCourse {
                name: p.name,
                course_code: p.course_code,
                sis_course_id: p.sis_course_id,
            };
            client.create_course(p.account_id, &course).await.map(object)
        }

        // Sections
        "create_section" => {
            let p: CreateSectionParams = parse(name, arguments)?;
            let section = NewSection {
                name: p.section_name,
                sis_section_id: p.sis_section_id,
            };
            client.create_section(p.course_id, &section).await.map(object)
        }
        "list_sections" => {
            let p: CourseListParams = parse(name, arguments)?;
            client
                .list_sections(p.course_id, pagination(p.first_page_only))
                .await
                .map(Value::Array)
        }
        "get_section" => {
            let p: SectionParams = parse(name, arguments)?;
            client.get_section(p.section_id).await.map(object)
        }
        "update_section" => {
            let p: UpdateSectionParams = parse(name, arguments)?;
            let update = SectionUpdate {
                name: p.section_name,
            };
            client.update_section(p.section_id, &update).await.map(object)
        }
        "delete_section" => {
            let p: SectionParams = parse(name, arguments)?;
            client.delete_section(p.section_id).await.map(object)
        }
        "cross_list_section" => {
            let p: CrossListParams = parse(name, arguments)?;
            client
                .cross_list_section(p.section_id, p.new_course_id)
                .await
                .map(object)
        }

        // Modules
        "list_modules" => {
            let p: CourseListParams = parse(name, arguments)?;
            client
                .list_modules(p.course_id, pagination(p.first_page_only))
                .await
                .map(Value::Array)
        }
        "get_module" => {
            let p: ModuleParams = parse(name, arguments)?;
            client.get_module(p.course_id, p.module_id).await.map(object)
        }
        "create_module" => {
            let p: CreateModuleParams = parse(name, arguments)?;
            let module = NewModule {
                name: p.name,
                position: p.position,
                unlock_at: p.unlock_at,
                require_sequential_progress: p.require_sequential_progress,
                prerequisite_module_ids: p.prerequisite_module_ids.unwrap_or_default(),
                publish_final_grade: p.publish_final_grade,
            };
            client.create_module(p.course_id, &module).await.map(object)
        }
        "update_module" => {
            let p: UpdateModuleParams = parse(name, arguments)?;
            let update = ModuleUpdate {
                name: p.name,
                position: p.position,
                unlock_at: p.unlock_at,
                require_sequential_progress: p.require_sequential_progress,
                prerequisite_module_ids: p.prerequisite_module_ids,
                publish_final_grade: p.publish_final_grade,
                published: p.published,
            };
            client
                .update_module(p.course_id, p.module_id, &update)
                .await
                .map(object)
        }
        "delete_module" => {
            let p: ModuleParams = parse(name, arguments)?;
            client.delete_module(p.course_id, p.module_id).await.map(object)
        }

        // Module items
        "list_module_items" => {
            let p: ModuleListParams = parse(name, arguments)?;
            client
                .list_module_items(p.course_id, p.module_id, pagination(p.first_page_only))
                .await
                .map(Value::Array)
        }
        "get_module_item" => {
            let p: ModuleItemParams = parse(name, arguments)?;
            client
                .get_module_item(p.course_id, p.module_id, p.item_id)
                .await
                .map(object)
        }
        "create_module_item" => {
            let p: CreateModuleItemParams = parse(name, arguments)?;
            let item = NewModuleItem {
                content_id: p.content_id,
                position: p.position,
                indent: p.indent,
                page_url: p.page_url,
                external_url: p.external_url,
                new_tab: p.new_tab,
                completion_requirement: completion(p.completion_requirement_type, p.min_score)?,
                ..NewModuleItem::new(p.title, p.kind)
            };
            client
                .create_module_item(p.course_id, p.module_id, &item)
                .await
                .map(object)
        }
        "update_module_item" => {
            let p: UpdateModuleItemParams = parse(name, arguments)?;
            let update = ModuleItemUpdate {
                title: p.title,
                position: p.position,
                indent: p.indent,
                external_url: p.external_url,
                new_tab: p.new_tab,
                completion_requirement: completion(p.completion_requirement_type, p.min_score)?,
                published: p.published,
            };
            client
                .update_module_item(p.course_id, p.module_id, p.item_id, &update)
                .await
                .map(object)
        }
        "delete_module_item" => {
            let p: ModuleItemParams = parse(name, arguments)?;
            client
                .delete_module_item(p.course_id, p.module_id, p.item_id)
                .await
                .map(object)
        }

        // Pages
        "list_pages" => {
            let p: ListPagesParams = parse(name, arguments)?;
            client
                .list_pages(
                    p.course_id,
                    p.search_term.as_deref(),
                    pagination(p.first_page_only),
                )
                .await
                .map(Value::Array)
        }
        "get_page" => {
            let p: PageParams = parse(name, arguments)?;
            client.get_page(p.course_id, &p.page_url).await.map(object)
        }
        "create_page" => {
            let p: CreatePageParams = parse(name, arguments)?;
            let page = NewPage {
                title: p.title,
                body: p.body,
                editing_roles: p.editing_roles,
                published: p.published,
                front_page: p.front_page,
            };
            client.create_page(p.course_id, &page).await.map(object)
        }
        "update_page" => {
            let p: UpdatePageParams = parse(name, arguments)?;
            let update = PageUpdate {
                title: p.title,
                body: p.body,
                editing_roles: p.editing_roles,
                published: p.published,
                front_page: p.front_page,
            };
            client
                .update_page(p.course_id, &p.page_url, &update)
                .await
                .map(object)
        }
        "delete_page" => {
            let p: PageParams = parse(name, arguments)?;
            client.delete_page(p.course_id, &p.page_url).await.map(object)
        }
        "add_page_to_module" => {
            let p: AddPageToModuleParams = parse(name, arguments)?;
            let placement = PagePlacement {
                title: p.title,
                position: p.position,
                indent: p.indent,
                new_tab: p.new_tab,
            };
            composite::add_page_to_module(client, p.course_id, p.module_id, &p.page_url, &placement)
                .await
                .map(object)
        }
        "create_page_and_add_to_module" => {
            let p: CreatePageAndAddParams = parse(name, arguments)?;
            let page = NewPage {
                title: p.title,
                body: p.body,
                editing_roles: p.editing_roles,
                published: p.published,
                front_page: p.front_page,
            };
            let placement = PagePlacement {
                title: None,
                position: p.module_item_position,
                indent: p.module_item_indent,
                new_tab: p.new_tab,
            };
            let created = composite::create_page_and_add_to_module(
                client,
                p.course_id,
                p.module_id,
                &page,
                &placement,
                cancel,
            )
            .await?;
            serde_json::to_value(created).map_err(|e| {
                CanvasError::UnexpectedResponse {
                    path: format!("courses/{}/pages", p.course_id),
                    message: format!("cannot encode result: {e}"),
                }
            })
        }

        _ => Err(CanvasError::Validation(format!("unknown tool: {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse::<CourseParams>("get_course", json!({ "course_id": 1, "extra": true }))
            .expect_err("unknown field");
        assert!(matches!(err, CanvasError::Validation(_)));
        assert!(err.to_string().contains("get_course"));
    }

    #[test]
    fn ids_accept_strings() {
        let p: ModuleItemParams = parse(
            "get_module_item",
            json!({ "course_id": "1", "module_id": 2, "item_id": "3" }),
        )
        .expect("params");
        assert_eq!(p.item_id.get(), 3);
    }

    #[test]
    fn null_arguments_mean_empty() {
        let p: ListCoursesParams = parse("get_courses", Value::Null).expect("params");
        assert!(!p.first_page_only);
        assert!(parse::<CourseParams>("get_course", Value::Null).is_err());
    }

    #[test]
    fn module_item_params_use_canvas_names() {
        let p: CreateModuleItemParams = parse(
            "create_module_item",
            json!({
                "course_id": 1,
                "module_id": 2,
                "title": "Quiz 1",
                "type": "Quiz",
                "content_id": "55",
                "completion_requirement_type": "min_score",
                "min_score": 8
            }),
        )
        .expect("params");
        assert_eq!(p.kind, ModuleItemType::Quiz);
        let requirement = completion(p.completion_requirement_type, p.min_score)
            .expect("valid")
            .expect("present");
        assert_eq!(requirement.min_score(), Some(8.0));

        assert!(parse::<CreateModuleItemParams>(
            "create_module_item",
            json!({ "course_id": 1, "module_id": 2, "title": "x", "type": "Video" })
        )
        .is_err());
    }

    #[test]
    fn min_score_without_requirement_type_is_rejected() {
        let p: UpdateModuleItemParams = parse(
            "update_module_item",
            json!({ "course_id": 1, "module_id": 2, "item_id": 3, "min_score": 5 }),
        )
        .expect("params");
        let err = completion(p.completion_requirement_type, p.min_score)
            .expect_err("score without type");
        assert!(matches!(err, CanvasError::Validation(_)));
        assert!(err.to_string().contains("completion_requirement_type"));

        assert!(completion(None, None).expect("absent").is_none());
    }

    #[test]
    fn create_page_and_add_defaults_to_published() {
        let p: CreatePageAndAddParams = parse(
            "create_page_and_add_to_module",
            json!({ "course_id": 1, "module_id": 2, "title": "Intro", "body": "" }),
        )
        .expect("params");
        assert_eq!(p.published, Some(true));
    }

    #[test]
    fn numeric_page_url_is_rejected() {
        let err = parse::<PageParams>("get_page", json!({ "course_id": 1, "page_url": "12" }))
            .expect_err("numeric slug");
        assert!(err.to_string().contains("slug"));
    }
}
