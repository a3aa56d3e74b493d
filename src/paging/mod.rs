//! Paging module
//!
//! Presents a paginated HTTP listing as a lazy sequence of items or pages.
//!
//! # Overview
//!
//! - `ContinuationStrategy` - how a continuation token becomes the next request
//!   (next link, request header or callback)
//! - `PagingMethodHandler` - one fetch + extract cycle
//! - `PageIterator` - lazy sequence of pages, resumable from a token
//! - `ItemPaged` - lazy sequence of items across all pages
//!
//! A failed page fetch never advances the iteration state. The error carries
//! the continuation token that was in effect, and pulling again retries it.

mod handler;
mod items;
mod pager;
mod strategies;
mod types;

pub use handler::PagingMethodHandler;
pub use items::{ItemPaged, ItemPagedBuilder};
pub use pager::PageIterator;
pub use strategies::{ContinuationStrategy, NextRequestFn};
pub use types::{
    json_deserializer, DeserializeFn, InitialState, Page, PagingOptions, TokenLocation,
    DEFAULT_CONTINUATION_TOKEN_LOCATION, DEFAULT_ITEMS_LOCATION,
};
