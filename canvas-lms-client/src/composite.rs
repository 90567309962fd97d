//! Multi-step page operations.
//!
//! A page is created (or looked up) first, then a `Page` module item is
//! created pointing at it. Once a page has been created nothing is rolled
//! back: a later failure is reported as [`CanvasError::PartialFailure`]
//! carrying the page, so the caller can retry the attachment or clean up.

use std::fmt;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::CanvasClient;
use crate::error::{CanvasError, CanvasResult};
use crate::ids::{id_field, CanvasId, PageSlug};
use crate::resources::module_items::NewModuleItem;
use crate::resources::pages::NewPage;
use crate::resources::{require_optional_text, require_text, validate_position};
use crate::JsonObject;

const CREATE_AND_ADD: &str = "create_page_and_add_to_module";

/// A page that exists in Canvas as a result of a composite operation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedPage {
    /// Slug Canvas assigned, if the response carried a usable one.
    pub page_url: Option<PageSlug>,
    /// The page as Canvas returned it.
    pub page: JsonObject,
}

impl fmt::Display for CreatedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.page_url {
            Some(slug) => write!(f, "{:?}", slug.as_str()),
            None => f.write_str("(without a slug)"),
        }
    }
}

/// Result of a successful create-and-attach.
#[derive(Debug, Clone, Serialize)]
pub struct PageInModule {
    /// The created page.
    pub page: JsonObject,
    /// The module item pointing at it.
    pub module_item: JsonObject,
}

/// Where and how a page appears in a module.
#[derive(Debug, Clone, Default)]
pub struct PagePlacement {
    /// Item title; defaults to the page title.
    pub title: Option<String>,
    /// 1-based position in the module.
    pub position: Option<u32>,
    /// Indentation level.
    pub indent: Option<u32>,
    /// Open in a new tab.
    pub new_tab: Option<bool>,
}

impl PagePlacement {
    fn validate(&self) -> CanvasResult<()> {
        require_optional_text("title", self.title.as_deref())?;
        validate_position("position", self.position)
    }

    fn item_for(&self, page: &JsonObject, page_url: PageSlug, fallback_title: &str) -> NewModuleItem {
        let title = self.title.clone().unwrap_or_else(|| fallback_title.to_string());
        NewModuleItem {
            content_id: id_field(page, "page_id"),
            position: self.position,
            indent: self.indent,
            new_tab: self.new_tab,
            ..NewModuleItem::page(title, page_url)
        }
    }
}

/// Attach an existing page to a module.
///
/// The page is fetched first, which confirms it exists and supplies the
/// default item title. Returns the created module item.
///
/// # Errors
///
/// Validation errors for a malformed placement, otherwise the first failing
/// request's error. Nothing is created unless the item request succeeds.
#[tracing::instrument(level = "debug", skip(client, placement), fields(page_url = %page_url))]
pub async fn add_page_to_module(
    client: &CanvasClient,
    course_id: CanvasId,
    module_id: CanvasId,
    page_url: &PageSlug,
    placement: &PagePlacement,
) -> CanvasResult<JsonObject> {
    placement.validate()?;

    let page = client.get_page(course_id, page_url).await?;
    let page_title = page
        .get("title")
        .and_then(serde_json::Value::as_str)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(page_url.as_str())
        .to_string();

    let item = placement.item_for(&page, page_url.clone(), &page_title);
    client.create_module_item(course_id, module_id, &item).await
}

/// Create a page, then attach it to a module.
///
/// The page request is never interrupted once sent, so its outcome is always
/// known. Cancellation observed after the page exists but before the item
/// request is sent yields a partial failure whose cause is
/// [`CanvasError::Cancelled`]. Cancellation while the item request is in
/// flight abandons it; the cause is then [`CanvasError::Interrupted`], since
/// Canvas may already have created the item.
///
/// # Errors
///
/// - the page step fails: that error, and no item request is made;
/// - the item step fails or is cancelled: [`CanvasError::PartialFailure`]
///   carrying the created page.
#[tracing::instrument(level = "debug", skip(client, page, placement, cancel), fields(title = %page.title))]
pub async fn create_page_and_add_to_module(
    client: &CanvasClient,
    course_id: CanvasId,
    module_id: CanvasId,
    page: &NewPage,
    placement: &PagePlacement,
    cancel: &CancellationToken,
) -> CanvasResult<PageInModule> {
    require_text("title", &page.title)?;
    placement.validate()?;
    if cancel.is_cancelled() {
        return Err(CanvasError::Cancelled);
    }

    let created = client.create_page(course_id, page).await.map_err(|e| {
        tracing::warn!(error = %e, "page creation failed; nothing was created");
        e
    })?;

    let Some(page_url) = PageSlug::from_page(&created) else {
        let cause = CanvasError::unexpected(
            format!("courses/{course_id}/pages"),
            "created page has no usable `url` slug",
        );
        return Err(partial(None, created, cause));
    };
    tracing::info!(%page_url, "page created");

    if cancel.is_cancelled() {
        return Err(partial(Some(page_url), created, CanvasError::Cancelled));
    }

    let item = placement.item_for(&created, page_url.clone(), &page.title);
    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CanvasError::Interrupted {
            path: format!("courses/{course_id}/modules/{module_id}/items"),
        }),
        result = client.create_module_item(course_id, module_id, &item) => result,
    };

    match outcome {
        Ok(module_item) => {
            tracing::info!(%page_url, "page attached to module");
            Ok(PageInModule {
                page: created,
                module_item,
            })
        }
        Err(cause) => Err(partial(Some(page_url), created, cause)),
    }
}

fn partial(page_url: Option<PageSlug>, page: JsonObject, cause: CanvasError) -> CanvasError {
    tracing::warn!(
        page_url = page_url.as_ref().map_or("", PageSlug::as_str),
        error = %cause,
        "page was created but attaching it to the module did not complete"
    );
    CanvasError::PartialFailure {
        operation: CREATE_AND_ADD,
        completed: Box::new(CreatedPage { page_url, page }),
        cause: Box::new(cause),
    }
}
