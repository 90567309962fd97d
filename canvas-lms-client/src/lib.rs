//! # Canvas LMS client
//!
//! Typed access to the parts of the Canvas LMS REST API that shape a course:
//! courses, sections, modules, module items and pages.
//!
//! ## Layers
//!
//! - [`credentials`] resolves the API base URL and token from the environment or a `.env` file
//! - [`client`] issues authenticated requests and walks `Link`-header pagination
//! - [`resources`] maps each resource's operations onto Canvas endpoints
//! - [`composite`] sequences multi-step operations and reports partial failure
//!
//! Response bodies are returned as ordered JSON objects so fields this crate
//! does not model pass through untouched.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod composite;
pub mod credentials;
pub mod error;
pub mod ids;
pub mod link;
pub mod resources;

pub use client::{ApiPath, CanvasClient, ClientOptions, Pagination};
pub use composite::{CreatedPage, PageInModule, PagePlacement};
pub use credentials::{CredentialResolver, Credentials};
pub use error::{CanvasError, CanvasResult, ConfigError, ErrorKind};
pub use ids::{AccountRef, CanvasId, PageSlug};
pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;

/// A Canvas resource representation, fields in the order Canvas sent them.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
