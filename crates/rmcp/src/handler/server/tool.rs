//! Call-tool handler plumbing: turns ordinary functions into tool implementations.
//!
//! A tool handler is any function of the shape `Fn(&S, ..extractors..) -> impl
//! IntoCallToolResult`, sync or async. [`ToolCallContext`] carries the inbound
//! [`CallToolRequestParam`] plus the ambient [`RequestContext`], and
//! [`CallToolHandler`] is implemented for the handful of shapes the
//! `#[tool]`/`#[tool_router]` macros (see `rmcp-macros`) generate.

use std::{borrow::Cow, future::Future};

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;

pub use crate::handler::server::common::{
    cached_schema_for_output, cached_schema_for_type, schema_for_output, schema_for_type,
};
use crate::{
    ErrorData,
    handler::server::common::AsRequestContext,
    handler::server::wrapper::{Json, Parameters},
    model::{CallToolRequestParam, CallToolResult, Content, JsonObject},
    service::{RequestContext, RoleServer},
};

/// Context handed to a tool handler: the raw call parameters plus the
/// ambient request context (peer, extensions, cancellation token, ...).
pub struct ToolCallContext<'a, S> {
    service: &'a S,
    name: Cow<'static, str>,
    arguments: Option<JsonObject>,
    request_context: RequestContext<RoleServer>,
}

impl<'a, S> ToolCallContext<'a, S> {
    pub fn new(
        service: &'a S,
        params: CallToolRequestParam,
        request_context: RequestContext<RoleServer>,
    ) -> Self {
        Self {
            service,
            name: params.name,
            arguments: params.arguments,
            request_context,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &'a S {
        self.service
    }

    pub fn request_context(&self) -> &RequestContext<RoleServer> {
        &self.request_context
    }
}

impl<S> AsRequestContext for ToolCallContext<'_, S> {
    fn as_request_context(&self) -> &RequestContext<RoleServer> {
        &self.request_context
    }

    fn as_request_context_mut(&mut self) -> &mut RequestContext<RoleServer> {
        &mut self.request_context
    }
}

impl<'a, S> ToolCallContext<'a, S>
where
    S: Send + Sync + 'static,
{
    /// Run `call` against this context, consuming it.
    pub fn invoke<C, A>(self, call: C) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + 'a
    where
        C: CallToolHandler<S, A> + Send + 'a,
        A: 'a,
    {
        let mut context = self;
        async move { call.call(&mut context).await }
    }
}

/// A type-erased, cloned-per-call tool implementation.
pub type DynCallToolHandler<S> =
    dyn for<'a> Fn(ToolCallContext<'a, S>) -> BoxFuture<'a, Result<CallToolResult, ErrorData>>
        + Send
        + Sync;

/// Implemented by anything that can respond to a single tool call.
///
/// `A` is a marker type parameter distinguishing the different call shapes
/// (plain, with parsed parameters, returning `Json<T>`, ...), mirroring the
/// way [`crate::handler::server::prompt::GetPromptHandler`] disambiguates
/// prompt handler shapes.
pub trait CallToolHandler<S, A>: Sized {
    fn call(
        self,
        context: &mut ToolCallContext<'_, S>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send;
}

/// Converts a handler's return value into a [`CallToolResult`].
pub trait IntoCallToolResult {
    fn into_call_tool_result(self) -> Result<CallToolResult, ErrorData>;
}

impl IntoCallToolResult for CallToolResult {
    fn into_call_tool_result(self) -> Result<CallToolResult, ErrorData> {
        Ok(self)
    }
}

impl<T> IntoCallToolResult for Json<T>
where
    T: serde::Serialize,
{
    fn into_call_tool_result(self) -> Result<CallToolResult, ErrorData> {
        let content = Content::json(&self.0)?;
        let value = serde_json::to_value(&self.0)
            .map_err(|e| ErrorData::internal_error(format!("failed to serialize output: {e}"), None))?;
        let mut result = CallToolResult::success(vec![content]);
        result.structured_content = Some(value);
        Ok(result)
    }
}

impl IntoCallToolResult for String {
    fn into_call_tool_result(self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text(self)]))
    }
}

impl IntoCallToolResult for () {
    fn into_call_tool_result(self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![]))
    }
}

fn parse_arguments<T: DeserializeOwned>(arguments: Option<JsonObject>) -> Result<T, ErrorData> {
    let value = serde_json::Value::Object(arguments.unwrap_or_default());
    serde_json::from_value(value)
        .map_err(|e| ErrorData::invalid_params(format!("invalid tool arguments: {e}"), None))
}

/// Plain synchronous handler: `fn(&S, Parameters<P>) -> Result<R, E>`.
impl<S, F, P, R, E> CallToolHandler<S, (Parameters<P>,)> for F
where
    S: Send + Sync + 'static,
    F: Fn(&S, Parameters<P>) -> Result<R, E> + Send + Sync,
    P: DeserializeOwned + Send,
    R: IntoCallToolResult,
    E: Into<ErrorData>,
{
    fn call(
        self,
        context: &mut ToolCallContext<'_, S>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send {
        let service = context.service;
        let arguments = context.arguments.clone();
        async move {
            let params: P = parse_arguments(arguments)?;
            (self)(service, Parameters(params))
                .map_err(Into::into)
                .and_then(IntoCallToolResult::into_call_tool_result)
        }
    }
}

/// Handler returning a boxed future borrowing from `&S` (the shape
/// `async_tool_wrapper` in `router::tool::tool_traits` produces).
impl<S, F, P, R, E> CallToolHandler<S, BoxFutureMarker<P>> for F
where
    S: Send + Sync + 'static,
    F: for<'s> Fn(
            &'s S,
            Parameters<P>,
        ) -> BoxFuture<'s, Result<R, E>>
        + Send
        + Sync,
    P: DeserializeOwned + Send,
    R: IntoCallToolResult,
    E: Into<ErrorData>,
{
    fn call(
        self,
        context: &mut ToolCallContext<'_, S>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send {
        let service = context.service;
        let arguments = context.arguments.clone();
        async move {
            let params: P = parse_arguments(arguments)?;
            let out = (self)(service, Parameters(params)).await.map_err(Into::into)?;
            out.into_call_tool_result()
        }
    }
}

pub struct BoxFutureMarker<P>(std::marker::PhantomData<P>);

/// No-argument handler: `fn(&S) -> Result<R, E>`.
impl<S, F, R, E> CallToolHandler<S, ()> for F
where
    S: Send + Sync + 'static,
    F: Fn(&S) -> Result<R, E> + Send + Sync,
    R: IntoCallToolResult,
    E: Into<ErrorData>,
{
    fn call(
        self,
        context: &mut ToolCallContext<'_, S>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send {
        let service = context.service;
        async move { (self)(service).map_err(Into::into)?.into_call_tool_result() }
    }
}
