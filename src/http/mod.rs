//! HTTP module
//!
//! The I/O boundary of the paging engine.
//!
//! # Overview
//!
//! - `Transport` - anything that can send an `HttpRequest` and return an `HttpResponse`
//! - `transport_fn` - adapt an async closure into a `Transport`
//! - `HttpClient` - a `Transport` backed by reqwest

mod client;
mod transport;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use transport::{transport_fn, Transport, TransportFn};
