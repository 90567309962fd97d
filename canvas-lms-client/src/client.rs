//! Authenticated HTTP access to the Canvas REST API.
//!
//! Every request carries the bearer token, including followed pagination
//! links. Nothing is retried and nothing is cached.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use metrics::{counter, histogram};
use reqwest::header::LINK;
use reqwest::{Client, Method, Response};
use serde_json::{Map, Value};
use url::Url;

use crate::credentials::{ApiToken, Credentials};
use crate::error::{CanvasError, CanvasResult, ConfigError};
use crate::link;
use crate::JsonObject;

/// Page size requested from list endpoints.
pub const PER_PAGE: u32 = 100;

const API_REQUESTS_TOTAL: &str = "canvas_lms_api_requests_total";
const API_REQUEST_DURATION: &str = "canvas_lms_api_request_duration_seconds";

/// How many pages of a collection to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pagination {
    /// Follow every `rel="next"` link.
    #[default]
    All,
    /// Stop after the first page.
    FirstPage,
}

/// Transport settings for [`CanvasClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("canvas-lms-mcp/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A path relative to the API base URL, built from segments.
///
/// Each segment is percent-encoded when the URL is assembled, so slugs and ids
/// can never escape their position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    segments: Vec<String>,
}

impl ApiPath {
    /// Start a path.
    #[must_use]
    pub fn new(first: impl fmt::Display) -> Self {
        Self {
            segments: vec![first.to_string()],
        }
    }

    /// Append a segment.
    #[must_use]
    pub fn push(mut self, segment: impl fmt::Display) -> Self {
        self.segments.push(segment.to_string());
        self
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Canvas REST client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct CanvasClient {
    inner: Arc<InnerClient>,
}

#[derive(Debug)]
struct InnerClient {
    http: Client,
    base: Url,
    token: ApiToken,
}

/// One decoded response plus its pagination link.
struct RawPage {
    body: Value,
    next: Option<String>,
}

impl CanvasClient {
    /// Create a client with default options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(credentials: Credentials) -> Result<Self, ConfigError> {
        Self::with_options(credentials, &ClientOptions::default())
    }

    /// Create a client with explicit transport options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn with_options(
        credentials: Credentials,
        options: &ClientOptions,
    ) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                base: credentials.base_url().clone(),
                token: credentials.api_token().clone(),
            }),
        })
    }

    /// The API base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Resolve an API path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL cannot carry a path.
    pub fn url_for(&self, path: &ApiPath) -> CanvasResult<Url> {
        let mut url = self.inner.base.clone();
        url.path_segments_mut()
            .map_err(|()| ConfigError::InvalidUrl {
                url: self.inner.base.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .extend(&path.segments);
        Ok(url)
    }

    /// Issue one request and decode its JSON body.
    ///
    /// An empty success body decodes to `{}`. Pagination links are ignored;
    /// use [`CanvasClient::list`] for collections.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Transport`] if Canvas cannot be reached,
    /// [`CanvasError::Api`] for non-success statuses and
    /// [`CanvasError::UnexpectedResponse`] if a success body is not JSON.
    #[tracing::instrument(level = "debug", skip_all, fields(method = %method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &ApiPath,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> CanvasResult<Value> {
        let url = self.url_for(path)?;
        let page = self
            .execute(method, url, &path.to_string(), query, body)
            .await?;
        Ok(page.body)
    }

    /// Stream the pages of a collection, following `rel="next"` links lazily.
    ///
    /// `query` is sent with the first request only; Canvas carries it into
    /// its next links. A next link to a different origin is refused.
    pub fn pages<'a>(
        &'a self,
        path: &'a ApiPath,
        query: Vec<(String, String)>,
    ) -> impl Stream<Item = CanvasResult<Vec<Value>>> + 'a {
        try_stream! {
            let path_text = path.to_string();
            let mut url = self.url_for(path)?;
            let mut query = Some(query);

            loop {
                let first_query = query.take().unwrap_or_default();
                let page = self
                    .execute(Method::GET, url.clone(), &path_text, &first_query, None)
                    .await?;
                let items = expect_array(&path_text, page.body)?;
                yield items;

                match page.next {
                    Some(next) => url = self.follow(&path_text, &url, &next)?,
                    None => break,
                }
            }
        }
    }

    /// Fetch a collection and concatenate its pages in order.
    ///
    /// # Errors
    ///
    /// Fails with the first error any page produces; partial pages are discarded.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path, ?pagination))]
    pub async fn list(
        &self,
        path: &ApiPath,
        mut query: Vec<(String, String)>,
        pagination: Pagination,
    ) -> CanvasResult<Vec<Value>> {
        query.push(("per_page".to_string(), PER_PAGE.to_string()));

        let pages = self.pages(path, query);
        futures::pin_mut!(pages);

        let mut items = Vec::new();
        let mut page_count = 0_usize;
        while let Some(page) = pages.try_next().await? {
            page_count += 1;
            items.extend(page);
            if pagination == Pagination::FirstPage {
                break;
            }
        }
        tracing::debug!(pages = page_count, items = items.len(), "collection fetched");
        Ok(items)
    }

    pub(crate) async fn get_object(&self, path: &ApiPath) -> CanvasResult<JsonObject> {
        self.send_object(Method::GET, path, None).await
    }

    pub(crate) async fn send_object(
        &self,
        method: Method,
        path: &ApiPath,
        body: Option<&Value>,
    ) -> CanvasResult<JsonObject> {
        match self.request(method, path, &[], body).await? {
            Value::Object(object) => Ok(object),
            other => Err(CanvasError::unexpected(
                path,
                format!("expected a JSON object, got {}", json_type(&other)),
            )),
        }
    }

    fn follow(&self, path: &str, current: &Url, next: &str) -> CanvasResult<Url> {
        let next_url = current
            .join(next)
            .map_err(|e| CanvasError::unexpected(path, format!("invalid next link {next:?}: {e}")))?;
        if next_url.origin() != self.inner.base.origin() {
            return Err(CanvasError::unexpected(
                path,
                format!(
                    "refusing to follow next link to a different origin: {}",
                    next_url.origin().ascii_serialization()
                ),
            ));
        }
        Ok(next_url)
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> CanvasResult<RawPage> {
        let mut builder = self
            .inner
            .http
            .request(method.clone(), url)
            .bearer_auth(self.inner.token.expose());
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let result = builder.send().await;
        let elapsed = started.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                record_request(&method, "error", elapsed);
                tracing::warn!(%method, path, error = %source, "Canvas request failed");
                return Err(CanvasError::Transport {
                    path: path.to_string(),
                    source,
                });
            }
        };

        let status = response.status();
        record_request(&method, status_class(status.as_u16()), elapsed);
        tracing::debug!(%method, path, status = status.as_u16(), elapsed_secs = elapsed, "Canvas response");

        read_response(path, response).await
    }
}

async fn read_response(path: &str, response: Response) -> CanvasResult<RawPage> {
    let status = response.status();
    let next = response
        .headers()
        .get(LINK)
        .and_then(|value| value.to_str().ok())
        .and_then(link::parse_next)
        .map(str::to_owned);

    let bytes = response
        .bytes()
        .await
        .map_err(|source| CanvasError::Transport {
            path: path.to_string(),
            source,
        })?;

    if !status.is_success() {
        let errors = error_messages(&bytes);
        let message = if errors.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            errors.join("; ")
        };
        return Err(CanvasError::Api {
            status: status.as_u16(),
            message,
            errors,
            path: path.to_string(),
        });
    }

    let body = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(&bytes).map_err(|e| {
            CanvasError::unexpected(path, format!("response body is not valid JSON: {e}"))
        })?
    };

    Ok(RawPage { body, next })
}

/// Collect the human-readable messages from a Canvas error body.
fn error_messages(body: &[u8]) -> Vec<String> {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return Vec::new();
    };

    let mut messages = Vec::new();
    match value.get("errors") {
        Some(Value::Array(items)) => {
            for item in items {
                push_message(item, None, &mut messages);
            }
        }
        Some(Value::Object(map)) => {
            if let Some(message) = map.get("message").and_then(Value::as_str) {
                messages.push(message.to_string());
            } else {
                for (field, detail) in map {
                    match detail {
                        Value::Array(items) => {
                            for item in items {
                                push_message(item, Some(field), &mut messages);
                            }
                        }
                        other => push_message(other, Some(field), &mut messages),
                    }
                }
            }
        }
        Some(Value::String(message)) => messages.push(message.clone()),
        _ => {}
    }

    if messages.is_empty() {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            messages.push(message.to_string());
        }
    }
    messages
}

fn push_message(item: &Value, field: Option<&str>, out: &mut Vec<String>) {
    let text = match item {
        Value::String(text) => Some(text.as_str()),
        Value::Object(object) => object.get("message").and_then(Value::as_str),
        _ => None,
    };
    if let Some(text) = text {
        out.push(match field {
            Some(field) => format!("{field}: {text}"),
            None => text.to_string(),
        });
    }
}

fn expect_array(path: &str, body: Value) -> CanvasResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        other => Err(CanvasError::unexpected(
            path,
            format!("expected a JSON array, got {}", json_type(&other)),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

fn record_request(method: &Method, status: &'static str, duration_secs: f64) {
    counter!(
        API_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!(API_REQUEST_DURATION, "method" => method.to_string()).record(duration_secs);
}
