//! Strongly typed identifiers.
//!
//! Canvas resources are mostly addressed by positive integer ids, except pages,
//! which are addressed by a URL-safe slug. Parent ids are always passed
//! explicitly; nothing here infers them from a response.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Error as _, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CanvasError, CanvasResult};
use crate::JsonObject;

/// A Canvas numeric id (course, section, module, module item, account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanvasId(u64);

impl CanvasId {
    /// Wrap a raw id.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for zero.
    pub fn new(raw: u64) -> CanvasResult<Self> {
        if raw == 0 {
            return Err(CanvasError::validation("ids must be positive integers"));
        }
        Ok(Self(raw))
    }

    /// The raw value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CanvasId {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let raw = trimmed.parse::<u64>().map_err(|_| {
            CanvasError::validation(format!("expected a numeric Canvas id, got {trimmed:?}"))
        })?;
        Self::new(raw)
    }
}

/// An id as it may arrive in tool arguments: a JSON number or a string.
enum RawId {
    Number(u64),
    Text(String),
}

struct RawIdVisitor;

impl Visitor<'_> for RawIdVisitor {
    type Value = RawId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a positive integer id or a string containing one")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawId, E> {
        Ok(RawId::Number(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawId, E> {
        u64::try_from(v)
            .map(RawId::Number)
            .map_err(|_| E::custom(format!("ids must be positive integers, got {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawId, E> {
        Ok(RawId::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawId, E> {
        Ok(RawId::Text(v))
    }
}

impl<'de> Deserialize<'de> for CanvasId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match deserializer.deserialize_any(RawIdVisitor)? {
            RawId::Number(n) => Self::new(n),
            RawId::Text(s) => s.parse(),
        }
        .map_err(|e| D::Error::custom(e.into_message()))
    }
}

/// The account a course is created under: a numeric id or the caller's own account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRef {
    /// A specific account id.
    Id(CanvasId),
    /// `self`, the root account of the token's user.
    Current,
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Current => f.write_str("self"),
        }
    }
}

impl FromStr for AccountRef {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "self" {
            Ok(Self::Current)
        } else {
            s.parse().map(Self::Id)
        }
    }
}

impl<'de> Deserialize<'de> for AccountRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match deserializer.deserialize_any(RawIdVisitor)? {
            RawId::Number(n) => CanvasId::new(n).map(Self::Id),
            RawId::Text(s) => s.parse(),
        }
        .map_err(|e| D::Error::custom(e.into_message()))
    }
}

/// A page's URL slug, e.g. `course-syllabus`.
///
/// A full page URL is accepted and reduced to its last path segment. Purely
/// numeric values are rejected: they are page ids, which page endpoints do
/// not take in this position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PageSlug(String);

impl PageSlug {
    /// Parse and validate a slug.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the value is empty, contains
    /// whitespace, or is a numeric id.
    pub fn parse(raw: &str) -> CanvasResult<Self> {
        let trimmed = raw.trim();
        let without_suffix = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let slug = without_suffix.rsplit('/').next().unwrap_or_default();

        if slug.is_empty() {
            return Err(CanvasError::validation(format!(
                "page_url must be a page slug, got {raw:?}"
            )));
        }
        if slug.chars().any(char::is_whitespace) {
            return Err(CanvasError::validation(format!(
                "page_url {slug:?} is not a slug (contains whitespace)"
            )));
        }
        if slug.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CanvasError::validation(format!(
                "page_url {slug:?} looks like a numeric page id; pages are addressed by slug"
            )));
        }
        Ok(Self(slug.to_string()))
    }

    /// The slug text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the slug Canvas assigned to a page representation (its `url` field).
    #[must_use]
    pub fn from_page(page: &JsonObject) -> Option<Self> {
        page.get("url")
            .and_then(Value::as_str)
            .and_then(|url| Self::parse(url).ok())
    }
}

impl fmt::Display for PageSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PageSlug {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for PageSlug {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|e| D::Error::custom(e.into_message()))
    }
}

/// Read a numeric id field (e.g. `course_id`) from a Canvas representation.
#[must_use]
pub fn id_field(object: &JsonObject, key: &str) -> Option<CanvasId> {
    match object.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|raw| CanvasId::new(raw).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canvas_id_accepts_numbers_and_numeric_strings() {
        let from_number: CanvasId = serde_json::from_value(json!(42)).expect("number");
        let from_string: CanvasId = serde_json::from_value(json!(" 42 ")).expect("string");
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.to_string(), "42");
    }

    #[test]
    fn canvas_id_rejects_bad_shapes() {
        for bad in [json!(0), json!(-3), json!("abc"), json!(1.5), json!(null), json!("")] {
            assert!(
                serde_json::from_value::<CanvasId>(bad.clone()).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn account_ref_accepts_self() {
        let current: AccountRef = serde_json::from_value(json!("self")).expect("self");
        assert_eq!(current, AccountRef::Current);
        assert_eq!(current.to_string(), "self");

        let id: AccountRef = serde_json::from_value(json!(7)).expect("id");
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn page_slug_validation() {
        assert_eq!(PageSlug::parse("week-1-intro").expect("slug").as_str(), "week-1-intro");
        assert_eq!(
            PageSlug::parse("https://canvas.example.edu/courses/1/pages/syllabus?x=1")
                .expect("url")
                .as_str(),
            "syllabus"
        );
        assert_eq!(PageSlug::parse("pages/overview/").expect("trailing").as_str(), "overview");

        assert!(PageSlug::parse("").is_err());
        assert!(PageSlug::parse("   ").is_err());
        assert!(PageSlug::parse("12345").is_err());
        assert!(PageSlug::parse("has space").is_err());
        assert!(serde_json::from_value::<PageSlug>(json!(12)).is_err());
    }

    #[test]
    fn id_field_reads_numbers_and_strings() {
        let object = json!({ "course_id": 9, "sis": "11", "name": "x" });
        let object = object.as_object().expect("object");
        assert_eq!(id_field(object, "course_id").map(CanvasId::get), Some(9));
        assert_eq!(id_field(object, "sis").map(CanvasId::get), Some(11));
        assert!(id_field(object, "name").is_none());
        assert!(id_field(object, "missing").is_none());
    }
}
