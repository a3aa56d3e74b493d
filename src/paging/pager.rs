//! Page iterator
//!
//! A single-pass, pull-driven sequence of pages.
//!
//! ```text
//! NotStarted ──pull──▶ (fetching) ──ok──▶ HasPage(token) ──pull──▶ (fetching) ──▶ ...
//!                           │                   │
//!                          err                token = None, pull
//!                           ▼                   ▼
//!               unchanged, error returned    Exhausted
//! ```
//!
//! The fetch happens inside `next_page().await`; state is written only once
//! that cycle has succeeded. A failed or cancelled pull leaves the iterator
//! where it was, so the next pull retries the same token.

use super::handler::PagingMethodHandler;
use super::types::Page;
use crate::error::{Error, Result};
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PagerState {
    /// Nothing fetched yet; the first pull uses the initial state
    NotStarted,
    /// The last pull delivered a page; `None` means it was the last one
    HasPage(Option<String>),
    /// End of sequence reached
    Exhausted,
}

/// Lazy sequence of pages
pub struct PageIterator<T> {
    handler: Arc<PagingMethodHandler<T>>,
    state: PagerState,
    pages_fetched: usize,
}

impl<T: DeserializeOwned> PageIterator<T> {
    /// Create an iterator over `handler`
    ///
    /// With a `continuation_token`, iteration resumes at the page that token
    /// points to and the initial request is never sent.
    pub fn new(handler: Arc<PagingMethodHandler<T>>, continuation_token: Option<String>) -> Self {
        let state = match continuation_token {
            Some(token) => PagerState::HasPage(Some(token)),
            None => PagerState::NotStarted,
        };

        Self {
            handler,
            state,
            pages_fetched: 0,
        }
    }

    /// Pull the next page
    ///
    /// Returns `None` once the sequence is over; every later call returns
    /// `None` too. An error does not end the sequence: calling again retries
    /// with the same continuation token.
    pub async fn next_page(&mut self) -> Option<Result<Page<T>>> {
        let token = match &self.state {
            PagerState::NotStarted => None,
            PagerState::HasPage(Some(token)) => Some(token.clone()),
            PagerState::HasPage(None) => {
                debug!("Paging complete after {} pages", self.pages_fetched);
                self.state = PagerState::Exhausted;
                return None;
            }
            PagerState::Exhausted => return None,
        };

        match self.handler.fetch_page(token.as_deref()).await {
            Ok(page) => {
                self.state = PagerState::HasPage(page.continuation_token.clone());
                self.pages_fetched += 1;
                Some(Ok(page))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Token to resume from to get the pages this iterator has not yet yielded
    ///
    /// `None` before the first page (start over) and after the last one.
    pub fn continuation_token(&self) -> Option<&str> {
        match &self.state {
            PagerState::HasPage(token) => token.as_deref(),
            PagerState::NotStarted | PagerState::Exhausted => None,
        }
    }

    /// Whether no further page will be fetched
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self.state,
            PagerState::HasPage(None) | PagerState::Exhausted
        )
    }

    /// Number of pages successfully yielded so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Collect every remaining page, stopping at the first error
    pub async fn collect_all(&mut self) -> Result<Vec<Page<T>>> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await {
            pages.push(page?);
        }
        Ok(pages)
    }

    /// Turn into a `Stream` of pages
    ///
    /// Errors are yielded as items. Only retryable errors keep the stream
    /// going; anything else would fail the same way on every poll, so it
    /// ends the stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page<T>>> + Send
    where
        T: Send,
    {
        stream::unfold(Some(self), |pager| async move {
            let mut pager = pager?;
            let next = pager.next_page().await?;
            let keep_going = next.as_ref().map_or_else(Error::is_retryable, |_| true);
            Some((next, keep_going.then_some(pager)))
        })
    }
}

impl<T> std::fmt::Debug for PageIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageIterator")
            .field("state", &self.state)
            .field("pages_fetched", &self.pages_fetched)
            .finish_non_exhaustive()
    }
}
