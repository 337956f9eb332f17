//! Wire-level plumbing: the [`Transport`] trait the session kernel
//! (`crate::service`) drives, the [`IntoTransport`] conversion that lets
//! `serve`/`serve_with_ct` accept anything transport-shaped, and the
//! concrete transport implementations (stdio, child process, SSE,
//! Streamable HTTP).

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::{Sink, SinkExt, Stream, StreamExt, future::BoxFuture};
use tokio::sync::Mutex as AsyncMutex;

use crate::{
    model::{RxJsonRpcMessage, TxJsonRpcMessage},
    service::ServiceRole,
};

pub mod common;
pub mod worker;

#[cfg(feature = "transport-async-rw")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport-async-rw")))]
pub mod async_rw;
#[cfg(feature = "transport-child-process")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport-child-process")))]
pub mod child_process;
#[cfg(feature = "transport-io")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport-io")))]
pub mod io;

#[cfg(feature = "transport-sse-client")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport-sse-client")))]
pub mod sse_client;
#[cfg(feature = "transport-sse-server")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport-sse-server")))]
pub mod sse_server;
#[cfg(feature = "transport-streamable-http-client")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport-streamable-http-client")))]
pub mod streamable_http_client;
#[cfg(feature = "transport-streamable-http-server")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport-streamable-http-server")))]
pub mod streamable_http_server;

pub use worker::{Worker, WorkerContext, WorkerQuitReason, WorkerTransport};

/// The asynchronous duplex a running [`crate::service::Service`] is driven
/// over: push outbound messages with [`Transport::send`], pull inbound ones
/// with [`Transport::receive`].
///
/// Blanket-implemented for any `(Sink, Stream)` pair with compatible item
/// types, so most transports only need to implement [`IntoTransport`] and
/// hand back such a pair.
pub trait Transport<R: ServiceRole> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(
        &mut self,
        item: TxJsonRpcMessage<R>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn receive(&mut self) -> impl Future<Output = Option<RxJsonRpcMessage<R>>> + Send;

    /// Best-effort shutdown. The default no-op is correct for transports
    /// that tear themselves down on drop.
    fn close(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async { Ok(()) }
    }
}

impl<R, Si, St> Transport<R> for (Si, St)
where
    R: ServiceRole,
    Si: Sink<TxJsonRpcMessage<R>> + Unpin + Send,
    St: Stream<Item = RxJsonRpcMessage<R>> + Unpin + Send,
    Si::Error: std::error::Error + Send + Sync + 'static,
{
    type Error = Si::Error;

    async fn send(&mut self, item: TxJsonRpcMessage<R>) -> Result<(), Self::Error> {
        self.0.send(item).await
    }

    async fn receive(&mut self) -> Option<RxJsonRpcMessage<R>> {
        self.1.next().await
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.0.close().await
    }
}

/// Converts a value into the `(Sink, Stream)` pair a [`Transport`]
/// implementation drives.
///
/// `A` is a marker type parameter with no other purpose than disambiguating
/// overlapping blanket implementations (a plain `(Sink, Stream)` pair, a
/// [`worker::WorkerTransport`], a type that is already a whole [`Transport`])
/// - callers almost never name it, it's inferred from the transport's
/// concrete type.
pub trait IntoTransport<R: ServiceRole, E, A>: Send + 'static
where
    E: std::error::Error + Send + Sync + 'static,
{
    type Sink: Sink<TxJsonRpcMessage<R>, Error = E> + Send + 'static;
    type Stream: Stream<Item = RxJsonRpcMessage<R>> + Send + 'static;

    fn into_transport(self) -> (Self::Sink, Self::Stream);
}

impl<R, Si, St, E> IntoTransport<R, E, (Si, St)> for (Si, St)
where
    R: ServiceRole,
    Si: Sink<TxJsonRpcMessage<R>, Error = E> + Send + 'static,
    St: Stream<Item = RxJsonRpcMessage<R>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Sink = Si;
    type Stream = St;

    fn into_transport(self) -> (Self::Sink, Self::Stream) {
        self
    }
}

/// Marker selecting the blanket [`IntoTransport`] impl for a type that
/// already implements [`Transport`] directly (rather than being a
/// `(Sink, Stream)` pair) - `M::Transport` in
/// `streamable_http_server::session::SessionManager` is the motivating case.
pub struct TransportAdapterIdentity;

impl<R, T, E> IntoTransport<R, E, TransportAdapterIdentity> for T
where
    R: ServiceRole,
    T: Transport<R, Error = E> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Sink = IdentitySink<R, T>;
    type Stream = IdentityStream<R, T>;

    fn into_transport(self) -> (Self::Sink, Self::Stream) {
        let inner = Arc::new(AsyncMutex::new(self));
        (
            IdentitySink {
                inner: inner.clone(),
                pending: None,
            },
            IdentityStream {
                inner,
                pending: None,
            },
        )
    }
}

/// Sink half of a split [`Transport`], produced by the
/// [`TransportAdapterIdentity`] blanket impl. Mirrors
/// [`worker::WorkerSink`]'s pending-future pattern since [`Transport::send`]
/// is async but [`Sink::start_send`] is not.
pub struct IdentitySink<R: ServiceRole, T: Transport<R>> {
    inner: Arc<AsyncMutex<T>>,
    pending: Option<BoxFuture<'static, Result<(), T::Error>>>,
}

impl<R, T> Sink<TxJsonRpcMessage<R>> for IdentitySink<R, T>
where
    R: ServiceRole,
    T: Transport<R> + Send + 'static,
{
    type Error = T::Error;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let this = self.get_mut();
        match this.pending.as_mut() {
            Some(fut) => {
                let result = std::task::ready!(fut.as_mut().poll(cx));
                this.pending = None;
                Poll::Ready(result)
            }
            None => Poll::Ready(Ok(())),
        }
    }

    fn start_send(self: Pin<&mut Self>, item: TxJsonRpcMessage<R>) -> Result<(), Self::Error> {
        let this = self.get_mut();
        let inner = this.inner.clone();
        this.pending = Some(Box::pin(async move { inner.lock().await.send(item).await }));
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.poll_ready(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.poll_flush(cx)
    }
}

/// Stream half of a split [`Transport`], produced by the
/// [`TransportAdapterIdentity`] blanket impl.
pub struct IdentityStream<R: ServiceRole, T: Transport<R>> {
    inner: Arc<AsyncMutex<T>>,
    pending: Option<BoxFuture<'static, Option<RxJsonRpcMessage<R>>>>,
}

impl<R, T> Stream for IdentityStream<R, T>
where
    R: ServiceRole,
    T: Transport<R> + Send + 'static,
{
    type Item = RxJsonRpcMessage<R>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let fut = this.pending.get_or_insert_with(|| {
            let inner = this.inner.clone();
            Box::pin(async move { inner.lock().await.receive().await })
        });
        let result = std::task::ready!(fut.as_mut().poll(cx));
        this.pending = None;
        Poll::Ready(result)
    }
}

/// A single inbound message served without a background worker or a real
/// socket: `receive` yields it once, `send` forwards every outbound message
/// into an mpsc channel the caller drains. Used by the Streamable HTTP
/// server's stateless mode, where each POST is a fully self-contained
/// request/response round trip with no session to keep alive.
pub struct OneshotTransport<R: ServiceRole> {
    message: Option<RxJsonRpcMessage<R>>,
    sender: tokio::sync::mpsc::Sender<TxJsonRpcMessage<R>>,
}

impl<R: ServiceRole> OneshotTransport<R> {
    pub fn new(
        message: RxJsonRpcMessage<R>,
    ) -> (Self, tokio::sync::mpsc::Receiver<TxJsonRpcMessage<R>>) {
        let (sender, receiver) = tokio::sync::mpsc::channel(16);
        (
            Self {
                message: Some(message),
                sender,
            },
            receiver,
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("oneshot transport's receiver has been dropped")]
pub struct OneshotTransportError;

impl<R: ServiceRole> Transport<R> for OneshotTransport<R> {
    type Error = OneshotTransportError;

    async fn send(&mut self, item: TxJsonRpcMessage<R>) -> Result<(), Self::Error> {
        self.sender
            .send(item)
            .await
            .map_err(|_| OneshotTransportError)
    }

    async fn receive(&mut self) -> Option<RxJsonRpcMessage<R>> {
        self.message.take()
    }
}

/// A type-erased transport error, carrying the concrete transport's type
/// name purely for diagnostics (`T` is never stored, only named).
#[derive(Debug)]
pub struct DynamicTransportError {
    transport_type: &'static str,
    error: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl DynamicTransportError {
    pub fn new<T: 'static, E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self {
            transport_type: std::any::type_name::<T>(),
            error: Box::new(error),
        }
    }
}

impl std::fmt::Display for DynamicTransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.transport_type, self.error)
    }
}

impl std::error::Error for DynamicTransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}
