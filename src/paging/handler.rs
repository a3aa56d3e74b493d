//! Paging method handler
//!
//! Runs one "get next page" cycle: build the request, send it through the
//! transport, then turn the raw response into a [`Page`].

use super::types::{extract_items, DeserializeFn, InitialState, Page, PagingOptions};
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::types::{HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared, immutable configuration of a paged listing
///
/// Holds no iteration state, so any number of page iterators can be driven
/// from one handler.
pub struct PagingMethodHandler<T> {
    transport: Arc<dyn Transport>,
    deserialize: DeserializeFn,
    initial_state: InitialState,
    options: PagingOptions,
    _item: PhantomData<fn() -> T>,
}

impl<T> PagingMethodHandler<T> {
    /// Create a handler
    pub fn new(
        transport: Arc<dyn Transport>,
        deserialize: DeserializeFn,
        initial_state: InitialState,
        options: PagingOptions,
    ) -> Self {
        Self {
            transport,
            deserialize,
            initial_state,
            options,
            _item: PhantomData,
        }
    }

    /// The state the first page comes from
    pub fn initial_state(&self) -> &InitialState {
        &self.initial_state
    }

    /// Paging options
    pub fn options(&self) -> &PagingOptions {
        &self.options
    }

    /// Build the request for the page that follows `continuation_token`
    pub fn next_request(&self, continuation_token: &str) -> Result<HttpRequest> {
        self.options.strategy.build_next_request(
            self.initial_state.template(),
            self.options.endpoint.as_ref(),
            continuation_token,
        )
    }
}

impl<T: DeserializeOwned> PagingMethodHandler<T> {
    /// Fetch the raw response for the page at `continuation_token`
    ///
    /// `None` means the first page: the initial request is sent as-is, or the
    /// initial response is returned without any I/O. Transport failures and
    /// callback failures come back as [`Error::Fetch`] carrying
    /// `continuation_token`; a token the strategy rejects outright is
    /// [`Error::InvalidContinuation`].
    pub async fn get_next(&self, continuation_token: Option<&str>) -> Result<HttpResponse> {
        let request = match (continuation_token, &self.initial_state) {
            (None, InitialState::Response(response)) => {
                debug!("Using initial response for first page");
                return Ok(response.clone());
            }
            (None, InitialState::Request(request)) => request.clone(),
            (Some(token), _) => self.next_request(token).map_err(|e| match e {
                Error::InvalidContinuation { .. } => e,
                e => Error::fetch(Some(token.to_string()), e),
            })?,
        };

        debug!(
            "Requesting page: {} {} ({})",
            request.method,
            request.url,
            self.options.strategy.name()
        );

        self.transport.send(request).await.map_err(|e| {
            warn!(
                "Page request failed, resume from {:?}: {}",
                continuation_token, e
            );
            Error::fetch(continuation_token.map(str::to_string), e)
        })
    }

    /// Turn a raw response into a page
    pub fn extract_data(&self, response: &HttpResponse) -> Result<Page<T>> {
        let body = (self.deserialize)(response)?;
        let items = extract_items(&body, &self.options.items_location)?;
        let continuation_token = self
            .options
            .continuation_token_location
            .extract(&body, response)?;

        debug!(
            "Extracted page: {} items, has next: {}",
            items.len(),
            continuation_token.is_some()
        );
        Ok(Page::new(items, continuation_token))
    }

    /// One full fetch + extract cycle
    ///
    /// Extraction failures are wrapped in [`Error::Extract`] with the same
    /// token so they can be resumed like fetch failures.
    pub async fn fetch_page(&self, continuation_token: Option<&str>) -> Result<Page<T>> {
        let response = self.get_next(continuation_token).await?;
        self.extract_data(&response)
            .map_err(|e| Error::extract(continuation_token.map(str::to_string), e))
    }
}

impl<T> std::fmt::Debug for PagingMethodHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagingMethodHandler")
            .field("initial_state", &self.initial_state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
