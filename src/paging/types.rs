//! Paging types
//!
//! Pages, the initial state a paged listing starts from, and the options
//! that say where items and continuation tokens live in a response.

use super::strategies::ContinuationStrategy;
use crate::error::{Error, Result};
use crate::types::{HttpRequest, HttpResponse, JsonValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Default location of the item collection in a response body
pub const DEFAULT_ITEMS_LOCATION: &str = "value";

/// Default location of the continuation token in a response body
pub const DEFAULT_CONTINUATION_TOKEN_LOCATION: &str = "nextLink";

/// Parses a raw response into the domain object items and tokens are read from
pub type DeserializeFn = Arc<dyn Fn(&HttpResponse) -> Result<JsonValue> + Send + Sync>;

/// Default deserializer: the body is JSON
pub fn json_deserializer() -> DeserializeFn {
    Arc::new(|response: &HttpResponse| response.body_json::<JsonValue>())
}

// ============================================================================
// Page
// ============================================================================

/// One fetched page: its items and the token for the page after it
///
/// A page without a continuation token is the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Token for the next page, `None` on the last page
    pub continuation_token: Option<String>,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, continuation_token: Option<String>) -> Self {
        Self {
            items,
            continuation_token,
        }
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether no page follows this one
    pub fn is_last(&self) -> bool {
        self.continuation_token.is_none()
    }

    /// Iterate over the items
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ============================================================================
// Initial State
// ============================================================================

/// What the first page comes from
#[derive(Debug, Clone)]
pub enum InitialState {
    /// A request that has not been sent yet
    Request(HttpRequest),
    /// A response that was already fetched; the first page costs no request
    Response(HttpResponse),
}

impl InitialState {
    /// The request follow-up requests are derived from
    pub fn template(&self) -> &HttpRequest {
        match self {
            Self::Request(request) => request,
            Self::Response(response) => &response.request,
        }
    }
}

impl From<HttpRequest> for InitialState {
    fn from(request: HttpRequest) -> Self {
        Self::Request(request)
    }
}

impl From<HttpResponse> for InitialState {
    fn from(response: HttpResponse) -> Self {
        Self::Response(response)
    }
}

// ============================================================================
// Token Location
// ============================================================================

/// Where the continuation token is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLocation {
    /// Dot path into the deserialized body (e.g. `nextLink`, `meta.next`)
    Body(String),
    /// A response header
    Header(String),
    /// An RFC 5988 `Link` header entry with the given rel
    LinkHeader {
        /// Rel value to follow (usually "next")
        rel: String,
    },
}

impl Default for TokenLocation {
    fn default() -> Self {
        Self::Body(DEFAULT_CONTINUATION_TOKEN_LOCATION.to_string())
    }
}

impl TokenLocation {
    /// Token in a body field
    pub fn body(path: impl Into<String>) -> Self {
        Self::Body(path.into())
    }

    /// Token in a response header
    pub fn header(name: impl Into<String>) -> Self {
        Self::Header(name.into())
    }

    /// Token in the `Link` header
    pub fn link_header(rel: impl Into<String>) -> Self {
        Self::LinkHeader { rel: rel.into() }
    }

    /// Read the token. Null, absent and empty values all mean "no more pages".
    pub fn extract(&self, body: &JsonValue, response: &HttpResponse) -> Result<Option<String>> {
        let token = match self {
            Self::Body(path) => match value_at_path(body, path) {
                None | Some(JsonValue::Null) => None,
                Some(JsonValue::String(s)) => Some(s.clone()),
                Some(JsonValue::Number(n)) => Some(n.to_string()),
                Some(other) => {
                    return Err(Error::decode(format!(
                        "continuation token at '{path}' is not a string: {other}"
                    )))
                }
            },
            Self::Header(name) => response.header_str(name).map(str::to_string),
            Self::LinkHeader { rel } => response
                .header_str("link")
                .and_then(|header| parse_link_header(header, rel)),
        };

        Ok(token.filter(|t| !t.is_empty()))
    }
}

// ============================================================================
// Options
// ============================================================================

/// Everything that controls how a listing is paged, apart from I/O
#[derive(Debug, Clone)]
pub struct PagingOptions {
    /// How the token is carried into the next request
    pub strategy: ContinuationStrategy,
    /// Where the token is read from
    pub continuation_token_location: TokenLocation,
    /// Dot path to the item array in the deserialized body
    pub items_location: String,
    /// Base that relative next links resolve against
    pub endpoint: Option<Url>,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            strategy: ContinuationStrategy::default(),
            continuation_token_location: TokenLocation::default(),
            items_location: DEFAULT_ITEMS_LOCATION.to_string(),
            endpoint: None,
        }
    }
}

impl PagingOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the continuation strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: ContinuationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set where the token is read from
    #[must_use]
    pub fn with_token_location(mut self, location: TokenLocation) -> Self {
        self.continuation_token_location = location;
        self
    }

    /// Set where the items are read from
    #[must_use]
    pub fn with_items_location(mut self, path: impl Into<String>) -> Self {
        self.items_location = path.into();
        self
    }

    /// Set the base for relative next links
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

// ============================================================================
// Extraction helpers
// ============================================================================

/// Read the item array at `path`. Absent or null means no items.
pub(crate) fn extract_items<T: DeserializeOwned>(body: &JsonValue, path: &str) -> Result<Vec<T>> {
    match value_at_path(body, path) {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| {
                T::deserialize(item)
                    .map_err(|e| Error::decode(format!("Failed to deserialize item: {e}")))
            })
            .collect(),
        Some(other) => Err(Error::decode(format!(
            "expected an array of items at '{path}', found {}",
            json_type(other)
        ))),
    }
}

/// Walk a simple dot path (`a.b.c`, optional `$.` prefix). Empty path or `$` is the root.
pub(crate) fn value_at_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        match current {
            JsonValue::Object(map) => current = map.get(part)?,
            JsonValue::Array(arr) => current = arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        }
    }
    Some(current)
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Parse a Link header and extract the URL for the given rel
///
/// Link header format: `<url>; rel="next", <url>; rel="prev"`. URLs may
/// contain commas, so entries are located by their `<...>` reference rather
/// than by splitting on `,`.
fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    let mut rest = header;

    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let end = after.find('>')?;
        let url = &after[..end];

        // Params run up to the next URL reference
        let tail = &after[end + 1..];
        let params_end = tail.find('<').unwrap_or(tail.len());
        let params = tail[..params_end].trim().trim_end_matches(',');
        rest = &tail[params_end..];

        let rel = params
            .split(';')
            .filter_map(|param| param.trim().strip_prefix("rel="))
            .map(|r| r.trim_matches('"').trim_matches('\''))
            .next();

        // rel may hold several space-separated relation types
        if rel.is_some_and(|r| r.split_whitespace().any(|r| r == target_rel)) {
            return Some(url.to_string());
        }
    }

    None
}
