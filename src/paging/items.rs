//! Item-level view over a paged listing

use super::handler::PagingMethodHandler;
use super::pager::PageIterator;
use super::strategies::ContinuationStrategy;
use super::types::{
    json_deserializer, DeserializeFn, InitialState, PagingOptions, TokenLocation,
};
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::types::{HttpResponse, JsonValue};
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Flat, lazy sequence of items across all pages
///
/// Nothing is fetched until the first item is pulled. Items come out in page
/// order, then in-page order. [`ItemPaged::by_page`] gives a page-level view
/// over the same configuration with its own, independent progress.
///
/// ```rust,ignore
/// let mut items = ItemPaged::<Product>::builder(client, request)
///     .strategy(ContinuationStrategy::next_link())
///     .build();
///
/// while let Some(item) = items.next_item().await {
///     let product = item?;
/// }
/// ```
pub struct ItemPaged<T> {
    handler: Arc<PagingMethodHandler<T>>,
    resume_from: Option<String>,
    pages: Option<PageIterator<T>>,
    current: std::vec::IntoIter<T>,
}

impl<T: DeserializeOwned> ItemPaged<T> {
    /// Create an item iterator with the JSON deserializer
    pub fn new(
        transport: impl Transport + 'static,
        initial_state: impl Into<InitialState>,
        options: PagingOptions,
    ) -> Self {
        Self::builder(transport, initial_state).options(options).build()
    }

    /// Start building an item iterator
    pub fn builder(
        transport: impl Transport + 'static,
        initial_state: impl Into<InitialState>,
    ) -> ItemPagedBuilder<T> {
        ItemPagedBuilder::new(Arc::new(transport), initial_state.into())
    }

    /// Pull the next item
    ///
    /// Fetches the next page when the current one is used up. Page errors are
    /// returned unchanged and do not end the sequence; `None` is the end.
    pub async fn next_item(&mut self) -> Option<Result<T>> {
        loop {
            if let Some(item) = self.current.next() {
                return Some(Ok(item));
            }

            let handler = &self.handler;
            let resume_from = &mut self.resume_from;
            let pages = self
                .pages
                .get_or_insert_with(|| PageIterator::new(Arc::clone(handler), resume_from.take()));

            match pages.next_page().await? {
                Ok(page) => self.current = page.items.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// Page-level view over the same listing
    ///
    /// Without a token the pages start from the initial state; with one they
    /// start at the page it points to, and no earlier page is fetched. The
    /// returned iterator does not share progress with this one.
    pub fn by_page(&self, continuation_token: Option<String>) -> PageIterator<T> {
        PageIterator::new(Arc::clone(&self.handler), continuation_token)
    }

    /// Token of the page after the one currently being drained
    ///
    /// Items still buffered from the current page are not covered by it.
    pub fn continuation_token(&self) -> Option<&str> {
        match &self.pages {
            Some(pages) => pages.continuation_token(),
            None => self.resume_from.as_deref(),
        }
    }

    /// Items fetched but not yet pulled
    pub fn buffered(&self) -> usize {
        self.current.len()
    }

    /// Collect every remaining item, stopping at the first error
    pub async fn collect_all(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await {
            items.push(item?);
        }
        Ok(items)
    }

    /// Take up to `n` items
    pub async fn take(&mut self, n: usize) -> Result<Vec<T>> {
        let mut items = Vec::with_capacity(n);
        for _ in 0..n {
            match self.next_item().await {
                Some(item) => items.push(item?),
                None => break,
            }
        }
        Ok(items)
    }

    /// Turn into a `Stream` of items
    ///
    /// Errors are yielded as items. A retryable error (a transient transport
    /// failure) does not end the stream and the next poll retries the same
    /// page. Any other error is the last item, since pulling again would
    /// fail the same way.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> + Send
    where
        T: Send,
    {
        stream::unfold(Some(self), |items| async move {
            let mut items = items?;
            let next = items.next_item().await?;
            let keep_going = next.as_ref().map_or_else(Error::is_retryable, |_| true);
            Some((next, keep_going.then_some(items)))
        })
    }
}

impl<T> std::fmt::Debug for ItemPaged<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemPaged")
            .field("strategy", &self.handler.options().strategy)
            .field("pages", &self.pages)
            .field("buffered", &self.current.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ItemPaged`]
pub struct ItemPagedBuilder<T> {
    transport: Arc<dyn Transport>,
    initial_state: InitialState,
    deserialize: DeserializeFn,
    options: PagingOptions,
    continuation_token: Option<String>,
    _item: std::marker::PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ItemPagedBuilder<T> {
    fn new(transport: Arc<dyn Transport>, initial_state: InitialState) -> Self {
        Self {
            transport,
            initial_state,
            deserialize: json_deserializer(),
            options: PagingOptions::default(),
            continuation_token: None,
            _item: std::marker::PhantomData,
        }
    }

    /// Replace all paging options
    #[must_use]
    pub fn options(mut self, options: PagingOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the continuation strategy
    #[must_use]
    pub fn strategy(mut self, strategy: ContinuationStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    /// Set where the continuation token is read from
    #[must_use]
    pub fn continuation_token_location(mut self, location: TokenLocation) -> Self {
        self.options.continuation_token_location = location;
        self
    }

    /// Set the dot path of the item array
    #[must_use]
    pub fn items_location(mut self, path: impl Into<String>) -> Self {
        self.options.items_location = path.into();
        self
    }

    /// Set the base for relative next links
    #[must_use]
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.options.endpoint = Some(endpoint);
        self
    }

    /// Use a custom deserializer instead of parsing the body as JSON
    #[must_use]
    pub fn deserialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&HttpResponse) -> Result<JsonValue> + Send + Sync + 'static,
    {
        self.deserialize = Arc::new(f);
        self
    }

    /// Resume from a previously observed token instead of the initial state
    #[must_use]
    pub fn continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// Build the item iterator
    pub fn build(self) -> ItemPaged<T> {
        let handler = PagingMethodHandler::new(
            self.transport,
            self.deserialize,
            self.initial_state,
            self.options,
        );

        ItemPaged {
            handler: Arc::new(handler),
            resume_from: self.continuation_token,
            pages: None,
            current: Vec::new().into_iter(),
        }
    }

    /// Build a page iterator instead of an item iterator
    pub fn build_pages(self) -> PageIterator<T> {
        let continuation_token = self.continuation_token.clone();
        let items = self.build();
        items.by_page(continuation_token)
    }
}
