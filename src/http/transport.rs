//! Transport abstraction
//!
//! The paging engine never talks to the network itself. It hands each
//! request to a `Transport` and gets a raw response back.

use crate::error::Result;
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Sends a single request and returns the raw response
///
/// Implementations decide what counts as failure. Errors are propagated to
/// the page iterator, which attaches the continuation token in effect.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).send(request).await
    }
}

/// A `Transport` built from an async closure, see [`transport_fn`]
#[derive(Clone)]
pub struct TransportFn<F> {
    f: F,
}

/// Adapt an async closure into a `Transport`
///
/// ```rust,ignore
/// let transport = transport_fn(|request: HttpRequest| async move {
///     Ok(HttpResponse::json(request, &json!({ "value": [] })))
/// });
/// ```
pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse>> + Send,
{
    TransportFn { f }
}

#[async_trait]
impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse>> + Send,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (self.f)(request).await
    }
}

impl<F> std::fmt::Debug for TransportFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportFn").finish_non_exhaustive()
    }
}
