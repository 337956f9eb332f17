//! Resource read handler plumbing, mirroring [`super::prompt`].
//!
//! A resource handler answers a single `resources/read` call for one
//! registered URI (or URI template). [`ResourceReadContext`] carries the
//! requested URI plus the ambient [`RequestContext`].

use std::future::Future;

use futures::future::BoxFuture;

use crate::{
    RoleServer,
    model::ReadResourceResult,
    service::RequestContext,
};

/// Context for a single `resources/read` dispatch.
pub struct ResourceReadContext<'a, S> {
    pub server: &'a S,
    pub uri: String,
    pub context: RequestContext<RoleServer>,
}

impl<'a, S> ResourceReadContext<'a, S> {
    pub fn new(server: &'a S, uri: String, context: RequestContext<RoleServer>) -> Self {
        Self {
            server,
            uri,
            context,
        }
    }

    pub async fn invoke<H>(self, handler: H) -> Result<ReadResourceResult, crate::Error>
    where
        H: ReadResourceHandler<S>,
        S: 'a,
    {
        handler.handle(self).await
    }
}

/// Trait for handling a single resource's `resources/read`.
pub trait ReadResourceHandler<S> {
    fn handle<'a>(
        self,
        context: ResourceReadContext<'a, S>,
    ) -> BoxFuture<'a, Result<ReadResourceResult, crate::Error>>
    where
        S: 'a;
}

/// Type-erased, cloned-per-call resource read implementation.
pub type DynReadResourceHandler<S> = dyn for<'a> Fn(ResourceReadContext<'a, S>) -> BoxFuture<'a, Result<ReadResourceResult, crate::Error>>
    + Send
    + Sync;

/// Plain async fn: `async fn(&S, uri: String) -> Result<ReadResourceResult, E>`.
impl<S, F, Fut, E> ReadResourceHandler<S> for F
where
    S: Send + Sync + 'static,
    F: FnOnce(&S, String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<ReadResourceResult, E>> + Send,
    E: Into<crate::Error>,
{
    fn handle<'a>(
        self,
        context: ResourceReadContext<'a, S>,
    ) -> BoxFuture<'a, Result<ReadResourceResult, crate::Error>>
    where
        S: 'a,
    {
        Box::pin(async move { (self)(context.server, context.uri).await.map_err(Into::into) })
    }
}
