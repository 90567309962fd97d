//! Tool definitions advertised by `tools/list`.

use canvas_lms_client::resources::{CompletionRequirementType, EditingRoles, ModuleItemType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// MCP tool definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Input schema (JSON Schema).
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl Tool {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

fn id(description: &str) -> Value {
    json!({
        "type": ["integer", "string"],
        "description": format!("{description} (positive integer, or a string of digits)")
    })
}

fn text(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn flag(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

fn position(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 1, "description": description })
}

fn indent() -> Value {
    json!({ "type": "integer", "minimum": 0, "description": "Indentation level" })
}

fn slug() -> Value {
    text("Page URL slug, e.g. 'week-1-overview' (not a numeric page id)")
}

fn first_page_only() -> Value {
    flag("Return only the first page of results instead of following pagination")
}

fn editing_roles() -> Value {
    text(&format!(
        "Comma-separated roles allowed to edit: {}",
        EditingRoles::ALLOWED.join(", ")
    ))
}

fn completion_properties(properties: &mut Map<String, Value>) {
    properties.insert(
        "completion_requirement_type".to_string(),
        json!({
            "type": "string",
            "enum": CompletionRequirementType::NAMES,
            "description": "What a student must do to complete the item"
        }),
    );
    properties.insert(
        "min_score".to_string(),
        json!({
            "type": "number",
            "minimum": 0,
            "description": "Minimum score; required with completion_requirement_type 'min_score'"
        }),
    );
}

fn object_schema(properties: Vec<(&str, Value)>, required: &[&str]) -> Value {
    let properties: Map<String, Value> = properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn with_completion(mut schema: Value) -> Value {
    if let Some(properties) = schema
        .get_mut("properties")
        .and_then(Value::as_object_mut)
    {
        completion_properties(properties);
    }
    schema
}

/// Every tool, in listing order.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn tool_definitions() -> Vec<Tool> {
    let item_types: Vec<&str> = ModuleItemType::ALL.iter().map(|t| t.as_str()).collect();

    vec![
        // Courses
        Tool::new(
            "get_courses",
            "List the courses visible to the configured Canvas user",
            object_schema(vec![("first_page_only", first_page_only())], &[]),
        ),
        Tool::new(
            "get_course",
            "Get a course by id",
            object_schema(vec![("course_id", id("Course id"))], &["course_id"]),
        ),
        Tool::new(
            "create_course",
            "Create a course under an account",
            object_schema(
                vec![
                    (
                        "account_id",
                        json!({
                            "type": ["integer", "string"],
                            "description": "Account id, or 'self' for the user's root account"
                        }),
                    ),
                    ("name", text("Course name")),
                    ("course_code", text("Course code, e.g. 'BIO-101'")),
                    ("sis_course_id", text("SIS id for the course")),
                ],
                &["account_id", "name"],
            ),
        ),
        // Sections
        Tool::new(
            "create_section",
            "Create a section in a course",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("section_name", text("Section name")),
                    ("sis_section_id", text("SIS id for the section")),
                ],
                &["course_id", "section_name"],
            ),
        ),
        Tool::new(
            "list_sections",
            "List the sections of a course",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("first_page_only", first_page_only()),
                ],
                &["course_id"],
            ),
        ),
        Tool::new(
            "get_section",
            "Get a section by id",
            object_schema(vec![("section_id", id("Section id"))], &["section_id"]),
        ),
        Tool::new(
            "update_section",
            "Rename a section",
            object_schema(
                vec![
                    ("section_id", id("Section id")),
                    ("section_name", text("New section name")),
                ],
                &["section_id"],
            ),
        ),
        Tool::new(
            "delete_section",
            "Delete a section",
            object_schema(vec![("section_id", id("Section id"))], &["section_id"]),
        ),
        Tool::new(
            "cross_list_section",
            "Move a section into a different course (cross-listing)",
            object_schema(
                vec![
                    ("section_id", id("Section id")),
                    ("new_course_id", id("Course to move the section into")),
                ],
                &["section_id", "new_course_id"],
            ),
        ),
        // Modules
        Tool::new(
            "list_modules",
            "List the modules of a course in course order",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("first_page_only", first_page_only()),
                ],
                &["course_id"],
            ),
        ),
        Tool::new(
            "get_module",
            "Get a module by id",
            object_schema(
                vec![("course_id", id("Course id")), ("module_id", id("Module id"))],
                &["course_id", "module_id"],
            ),
        ),
        Tool::new(
            "create_module",
            "Create a module in a course",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("name", text("Module name")),
                    ("position", position("Position among the course's modules")),
                    ("unlock_at", text("Unlock date (ISO 8601)")),
                    ("require_sequential_progress", flag("Require items to be completed in order")),
                    (
                        "prerequisite_module_ids",
                        json!({
                            "type": "array",
                            "items": { "type": ["integer", "string"] },
                            "description": "Modules that must be completed first"
                        }),
                    ),
                    ("publish_final_grade", flag("Publish the final grade on completion")),
                ],
                &["course_id", "name"],
            ),
        ),
        Tool::new(
            "update_module",
            "Update a module; omitted fields are left unchanged",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("module_id", id("Module id")),
                    ("name", text("New module name")),
                    ("position", position("New position")),
                    ("unlock_at", text("New unlock date (ISO 8601)")),
                    ("require_sequential_progress", flag("Require items to be completed in order")),
                    (
                        "prerequisite_module_ids",
                        json!({
                            "type": "array",
                            "items": { "type": ["integer", "string"] },
                            "description": "Replacement prerequisites; an empty list clears them"
                        }),
                    ),
                    ("publish_final_grade", flag("Publish the final grade on completion")),
                    ("published", flag("Publish or unpublish the module")),
                ],
                &["course_id", "module_id"],
            ),
        ),
        Tool::new(
            "delete_module",
            "Delete a module",
            object_schema(
                vec![("course_id", id("Course id")), ("module_id", id("Module id"))],
                &["course_id", "module_id"],
            ),
        ),
        // Module items
        Tool::new(
            "list_module_items",
            "List the items of a module in module order",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("module_id", id("Module id")),
                    ("first_page_only", first_page_only()),
                ],
                &["course_id", "module_id"],
            ),
        ),
        Tool::new(
            "get_module_item",
            "Get a module item by id",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("module_id", id("Module id")),
                    ("item_id", id("Module item id")),
                ],
                &["course_id", "module_id", "item_id"],
            ),
        ),
        Tool::new(
            "create_module_item",
            "Add an item to a module. content_id is required except for Page, SubHeader and \
             ExternalUrl items; Page items need page_url; ExternalUrl and ExternalTool items \
             need external_url",
            with_completion(object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("module_id", id("Module id")),
                    ("title", text("Item title")),
                    (
                        "type",
                        json!({ "type": "string", "enum": item_types, "description": "Item type" }),
                    ),
                    ("content_id", id("Id of the referenced content")),
                    ("position", position("Position in the module")),
                    ("indent", indent()),
                    ("page_url", slug()),
                    ("external_url", text("Target URL for ExternalUrl and ExternalTool items")),
                    ("new_tab", flag("Open in a new tab")),
                ],
                &["course_id", "module_id", "title", "type"],
            )),
        ),
        Tool::new(
            "update_module_item",
            "Update a module item; omitted fields are left unchanged",
            with_completion(object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("module_id", id("Module id")),
                    ("item_id", id("Module item id")),
                    ("title", text("New title")),
                    ("position", position("New position")),
                    ("indent", indent()),
                    ("external_url", text("New external URL")),
                    ("new_tab", flag("Open in a new tab")),
                    ("published", flag("Publish or unpublish the item")),
                ],
                &["course_id", "module_id", "item_id"],
            )),
        ),
        Tool::new(
            "delete_module_item",
            "Remove an item from a module",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("module_id", id("Module id")),
                    ("item_id", id("Module item id")),
                ],
                &["course_id", "module_id", "item_id"],
            ),
        ),
        // Pages
        Tool::new(
            "list_pages",
            "List the pages of a course, optionally filtered by title",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("search_term", text("Only pages whose title contains this term")),
                    ("first_page_only", first_page_only()),
                ],
                &["course_id"],
            ),
        ),
        Tool::new(
            "get_page",
            "Get a page, including its body",
            object_schema(
                vec![("course_id", id("Course id")), ("page_url", slug())],
                &["course_id", "page_url"],
            ),
        ),
        Tool::new(
            "create_page",
            "Create a page; the response carries the assigned slug in 'url'",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("title", text("Page title")),
                    ("body", text("Page content (HTML)")),
                    ("editing_roles", editing_roles()),
                    ("published", flag("Publish the page")),
                    ("front_page", flag("Make this the course front page")),
                ],
                &["course_id", "title", "body"],
            ),
        ),
        Tool::new(
            "update_page",
            "Update a page; omitted fields are left unchanged",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("page_url", slug()),
                    ("title", text("New title")),
                    ("body", text("New content (HTML)")),
                    ("editing_roles", editing_roles()),
                    ("published", flag("Publish or unpublish the page")),
                    ("front_page", flag("Make this the course front page")),
                ],
                &["course_id", "page_url"],
            ),
        ),
        Tool::new(
            "delete_page",
            "Delete a page",
            object_schema(
                vec![("course_id", id("Course id")), ("page_url", slug())],
                &["course_id", "page_url"],
            ),
        ),
        Tool::new(
            "add_page_to_module",
            "Add an existing page to a module; the item title defaults to the page title",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("module_id", id("Module id")),
                    ("page_url", slug()),
                    ("title", text("Item title")),
                    ("position", position("Position in the module")),
                    ("indent", indent()),
                    ("new_tab", flag("Open in a new tab")),
                ],
                &["course_id", "module_id", "page_url"],
            ),
        ),
        Tool::new(
            "create_page_and_add_to_module",
            "Create a page and add it to a module. If the page is created but adding it fails, \
             the error is a partial_failure that carries the created page's slug; the page is \
             not deleted",
            object_schema(
                vec![
                    ("course_id", id("Course id")),
                    ("module_id", id("Module id")),
                    ("title", text("Page title, also used as the item title")),
                    ("body", text("Page content (HTML)")),
                    ("editing_roles", editing_roles()),
                    ("published", flag("Publish the page (default true)")),
                    ("front_page", flag("Make this the course front page")),
                    ("module_item_position", position("Position in the module")),
                    ("module_item_indent", indent()),
                    ("new_tab", flag("Open in a new tab")),
                ],
                &["course_id", "module_id", "title", "body"],
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::TOOL_NAMES;

    #[test]
    fn definitions_match_dispatch_table() {
        let names: Vec<String> = tool_definitions().into_iter().map(|t| t.name).collect();
        assert_eq!(names, TOOL_NAMES);
    }

    #[test]
    fn every_required_field_is_a_property() {
        for tool in tool_definitions() {
            let schema = &tool.input_schema;
            assert_eq!(schema["type"], "object", "{}", tool.name);
            let properties = schema["properties"].as_object().expect("properties");
            for required in schema["required"].as_array().expect("required") {
                let field = required.as_str().expect("field name");
                assert!(properties.contains_key(field), "{}: {field}", tool.name);
            }
        }
    }

    #[test]
    fn module_item_schema_lists_types_and_requirements() {
        let tools = tool_definitions();
        let create = tools
            .iter()
            .find(|t| t.name == "create_module_item")
            .expect("tool");
        let properties = &create.input_schema["properties"];
        assert_eq!(properties["type"]["enum"].as_array().map(Vec::len), Some(8));
        assert_eq!(
            properties["completion_requirement_type"]["enum"]
                .as_array()
                .map(Vec::len),
            Some(5)
        );
    }

    #[test]
    fn serializes_with_camel_case_schema_key() {
        let value = serde_json::to_value(&tool_definitions()[0]).expect("json");
        assert!(value.get("inputSchema").is_some());
    }
}
