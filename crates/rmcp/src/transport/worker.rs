//! Bridges a [`Worker`] that owns a concrete connection (an SSE stream, a
//! Streamable HTTP client session, ...) into the generic [`Sink`]/[`Stream`]
//! pair the session kernel in [`crate::service`] drives.
//!
//! A worker runs as a detached background task; [`WorkerTransport`] is the
//! handle the foreground half holds, split into a [`Sink`] half (to push
//! outbound messages at the worker) and a [`Stream`] half (to read inbound
//! messages the worker produced) via [`crate::transport::IntoTransport`].

use std::{
    borrow::Cow,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::{Sink, Stream, future::BoxFuture};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{
    model::{RxJsonRpcMessage, TxJsonRpcMessage},
    service::ServiceRole,
};

/// One outbound message plus the channel the worker uses to report whether
/// the underlying transport accepted it.
pub struct WorkerSendRequest<W: Worker> {
    pub message: TxJsonRpcMessage<W::Role>,
    pub responder: oneshot::Sender<Result<(), W::Error>>,
}

/// Per-worker tuning. `name` only affects tracing, it has no wire effect.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub name: Option<Arc<str>>,
    pub channel_buffer_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: None,
            channel_buffer_capacity: 16,
        }
    }
}

/// Why a worker's [`Worker::run`] loop exited. Always terminal: the transport
/// handle is torn down once this is observed.
#[derive(Debug)]
pub enum WorkerQuitReason {
    Cancelled,
    HandlerTerminated,
    Fatal {
        error: Cow<'static, str>,
        context: Cow<'static, str>,
    },
}

impl WorkerQuitReason {
    pub fn fatal(error: impl Into<Cow<'static, str>>, context: impl Into<Cow<'static, str>>) -> Self {
        WorkerQuitReason::Fatal {
            error: error.into(),
            context: context.into(),
        }
    }

    /// Curried form of [`Self::fatal`] for use as a `map_err` callback.
    pub fn fatal_context<E>(context: &'static str) -> impl Fn(E) -> WorkerQuitReason
    where
        E: std::error::Error,
    {
        move |error| WorkerQuitReason::fatal(error.to_string(), context)
    }
}

impl std::fmt::Display for WorkerQuitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerQuitReason::Cancelled => write!(f, "worker cancelled"),
            WorkerQuitReason::HandlerTerminated => write!(f, "handler terminated"),
            WorkerQuitReason::Fatal { error, context } => {
                write!(f, "fatal error while {context}: {error}")
            }
        }
    }
}

/// The handle passed into [`Worker::run`]: the cancellation signal plus the
/// two channels bridging it to the foreground [`WorkerTransport`].
pub struct WorkerContext<W: Worker> {
    pub cancellation_token: CancellationToken,
    pub from_handler_rx: mpsc::Receiver<WorkerSendRequest<W>>,
    pub to_handler_tx: mpsc::Sender<RxJsonRpcMessage<W::Role>>,
}

impl<W: Worker> WorkerContext<W> {
    pub async fn recv_from_handler(&mut self) -> Result<WorkerSendRequest<W>, WorkerQuitReason> {
        self.from_handler_rx
            .recv()
            .await
            .ok_or(WorkerQuitReason::HandlerTerminated)
    }

    pub async fn send_to_handler(
        &mut self,
        message: RxJsonRpcMessage<W::Role>,
    ) -> Result<(), WorkerQuitReason> {
        self.to_handler_tx
            .send(message)
            .await
            .map_err(|_| WorkerQuitReason::HandlerTerminated)
    }
}

/// A connection owner driven as a background task.
///
/// Implementors own whatever the actual transport is (an HTTP client, an SSE
/// stream, a child process's stdio) and translate it into the JSON-RPC
/// message flow described by `context`.
pub trait Worker: Sized + Send + 'static {
    type Error: std::error::Error + Send + Sync + 'static;
    type Role: ServiceRole;

    /// The error reported to a caller whose message arrived after the worker
    /// had already quit.
    fn err_closed() -> Self::Error;

    /// The error reported when the worker's background task panicked or was
    /// aborted before it could produce a [`WorkerQuitReason`].
    fn err_join(e: tokio::task::JoinError) -> Self::Error;

    fn config(&self) -> WorkerConfig {
        WorkerConfig::default()
    }

    fn run(
        self,
        context: WorkerContext<Self>,
    ) -> impl Future<Output = Result<(), WorkerQuitReason>> + Send;
}

/// The sink half of a [`WorkerTransport`]: forwards outbound messages to the
/// worker task and resolves once the worker has reported whether it was
/// accepted.
pub struct WorkerSink<W: Worker> {
    tx: mpsc::Sender<WorkerSendRequest<W>>,
    pending: Option<BoxFuture<'static, Result<(), W::Error>>>,
}

impl<W: Worker> Sink<TxJsonRpcMessage<W::Role>> for WorkerSink<W> {
    type Error = W::Error;

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

    fn start_send(
        self: Pin<&mut Self>,
        item: TxJsonRpcMessage<W::Role>,
    ) -> Result<(), Self::Error> {
        let this = self.get_mut();
        let tx = this.tx.clone();
        this.pending = Some(Box::pin(async move {
            let (responder, receiver) = oneshot::channel();
            tx.send(WorkerSendRequest {
                message: item,
                responder,
            })
            .await
            .map_err(|_| W::err_closed())?;
            receiver.await.map_err(|_| W::err_closed())?
        }));
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.poll_ready(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.poll_flush(cx)
    }
}

/// The stream half of a [`WorkerTransport`]: yields inbound messages the
/// worker produced. Carries the worker's join handle and cancellation guard
/// so dropping the stream tears the background task down.
pub struct WorkerStream<W: Worker> {
    rx: mpsc::Receiver<RxJsonRpcMessage<W::Role>>,
    _handle: tokio::task::JoinHandle<Result<(), WorkerQuitReason>>,
    _drop_guard: DropGuard,
}

impl<W: Worker> Stream for WorkerStream<W> {
    type Item = RxJsonRpcMessage<W::Role>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// The marker type used to select [`crate::transport::IntoTransport`]'s
/// `WorkerTransport<W>` implementation.
pub struct WorkerTransportMarker<W>(std::marker::PhantomData<W>);

/// The foreground handle for a [`Worker`] spawned as a background task.
///
/// `SseClientTransport<C>` and `StreamableHttpClientTransport<C>` are both
/// type aliases over this.
pub struct WorkerTransport<W: Worker> {
    sink: WorkerSink<W>,
    stream: WorkerStream<W>,
}

impl<W: Worker> WorkerTransport<W> {
    pub fn spawn(worker: W) -> Self {
        let config = worker.config();
        let capacity = config.channel_buffer_capacity.max(1);
        let (to_worker_tx, from_handler_rx) = mpsc::channel(capacity);
        let (to_handler_tx, from_worker_rx) = mpsc::channel(capacity);
        let ct = CancellationToken::new();
        let context = WorkerContext {
            cancellation_token: ct.clone(),
            from_handler_rx,
            to_handler_tx,
        };
        let worker_name = config.name.unwrap_or_else(|| Arc::from("worker"));
        let handle = tokio::spawn(async move {
            let result = worker.run(context).await;
            match &result {
                Ok(()) => tracing::debug!(worker = %worker_name, "worker exited"),
                Err(WorkerQuitReason::Fatal { error, context }) => {
                    tracing::error!(worker = %worker_name, %context, %error, "worker exited with a fatal error")
                }
                Err(reason) => tracing::debug!(worker = %worker_name, %reason, "worker exited"),
            }
            result
        });
        Self {
            sink: WorkerSink {
                tx: to_worker_tx,
                pending: None,
            },
            stream: WorkerStream {
                rx: from_worker_rx,
                _handle: handle,
                _drop_guard: ct.drop_guard(),
            },
        }
    }
}

impl<W: Worker> crate::transport::IntoTransport<W::Role, W::Error, WorkerTransportMarker<W>>
    for WorkerTransport<W>
{
    type Sink = WorkerSink<W>;
    type Stream = WorkerStream<W>;

    fn into_transport(self) -> (Self::Sink, Self::Stream) {
        (self.sink, self.stream)
    }
}
