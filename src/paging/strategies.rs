//! Continuation strategies
//!
//! Each strategy turns a continuation token into the request for the next
//! page. Strategies never perform I/O and never modify the template request;
//! they always return a fresh value.

use crate::error::{Error, Result};
use crate::types::HttpRequest;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use url::Url;

/// Caller-supplied builder for the next request
pub type NextRequestFn = Arc<dyn Fn(&str) -> Result<HttpRequest> + Send + Sync>;

/// How the continuation token is carried into the next request
#[derive(Clone, Default)]
pub enum ContinuationStrategy {
    /// The token is a URL (absolute or relative) to GET next
    ///
    /// Relative tokens resolve against the configured endpoint, or against
    /// the template request URL when no endpoint is set. Headers are carried
    /// over from the template, the body is dropped.
    #[default]
    NextLink,

    /// The token is sent in a request header
    ///
    /// Every other field of the template request is carried over unchanged.
    RequestHeader {
        /// Header that receives the token
        header_name: HeaderName,
    },

    /// The caller builds the next request from the token
    Callback(NextRequestFn),
}

impl ContinuationStrategy {
    /// Follow next-link URLs
    pub fn next_link() -> Self {
        Self::NextLink
    }

    /// Send the token in the given request header
    pub fn request_header(header_name: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|e| Error::invalid_header(header_name, e.to_string()))?;
        Ok(Self::RequestHeader { header_name })
    }

    /// Build the next request with a callback
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<HttpRequest> + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(f))
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::NextLink => "next_link",
            Self::RequestHeader { .. } => "request_header",
            Self::Callback(_) => "callback",
        }
    }

    /// Build the request for the page that follows `continuation_token`
    ///
    /// `template` is the request that fetched the first page.
    pub fn build_next_request(
        &self,
        template: &HttpRequest,
        endpoint: Option<&Url>,
        continuation_token: &str,
    ) -> Result<HttpRequest> {
        match self {
            Self::NextLink => {
                let url = resolve_next_link(endpoint.unwrap_or(&template.url), continuation_token)?;
                trace!("Next link resolved to {}", url);

                let mut request = HttpRequest::new(Method::GET, url);
                request.headers = template.headers.clone();
                Ok(request)
            }
            Self::RequestHeader { header_name } => {
                let value = HeaderValue::from_str(continuation_token).map_err(|e| {
                    Error::invalid_continuation(
                        continuation_token,
                        format!("not a valid value for header '{header_name}': {e}"),
                    )
                })?;
                trace!("Setting continuation header {}", header_name);

                let mut request = template.clone();
                request.headers.insert(header_name.clone(), value);
                Ok(request)
            }
            Self::Callback(f) => f(continuation_token),
        }
    }
}

impl fmt::Debug for ContinuationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NextLink => f.write_str("NextLink"),
            Self::RequestHeader { header_name } => f
                .debug_struct("RequestHeader")
                .field("header_name", header_name)
                .finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Resolve a next-link token into an http(s) URL
fn resolve_next_link(base: &Url, token: &str) -> Result<Url> {
    if token.trim().is_empty() {
        return Err(Error::invalid_continuation(token, "empty next link"));
    }

    let url = base
        .join(token)
        .map_err(|e| Error::invalid_continuation(token, e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::invalid_continuation(
            token,
            format!("unsupported scheme '{scheme}'"),
        )),
    }
}
