//! The session kernel: the generic request/response/notification dispatch
//! loop shared by clients and servers, monomorphized per [`ServiceRole`].
//!
//! [`RoleClient`] (`service::client`) and [`RoleServer`] (`service::server`)
//! each pick concrete `Req`/`Resp`/`Not` wire types and drive the init
//! handshake their side of the protocol requires; everything after that -
//! matching responses to outstanding requests, dispatching inbound requests
//! and notifications to a [`Service`] impl, forwarding outbound traffic - is
//! the single [`serve_inner`] loop below.

use std::{collections::HashMap, sync::Arc};

use thiserror::Error;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::model::{AtomicU32RequestIdProvider, ErrorData, Extensions, Meta, RequestId, TxJsonRpcMessage};

#[cfg(feature = "client")]
mod client;
#[cfg(feature = "client")]
pub use client::*;

#[cfg(feature = "server")]
mod server;
#[cfg(feature = "server")]
pub use server::*;

pub use crate::transport::{IntoTransport, Transport};

/// Picks the concrete wire types (and, for the client, the error type its
/// init handshake can fail with) for one side of the protocol. Never
/// implemented outside this crate; [`RoleClient`] and [`RoleServer`] are the
/// two instances.
pub trait ServiceRole: Send + Sync + 'static + std::fmt::Debug + Clone + Copy {
    type Req: std::fmt::Debug + Send + Sync + 'static;
    type Resp: std::fmt::Debug + Send + Sync + 'static;
    type Not: std::fmt::Debug + Send + Sync + 'static;
    type PeerReq: std::fmt::Debug + Send + Sync + 'static;
    type PeerResp: std::fmt::Debug + Send + Sync + 'static;
    type PeerNot: std::fmt::Debug + Send + Sync + 'static;
    type Info: std::fmt::Debug + Send + Sync + 'static;
    type PeerInfo: std::fmt::Debug + Send + Sync + Clone + 'static;
    type InitializeError: std::error::Error + Send + Sync + 'static;
    const IS_CLIENT: bool;

    /// Pulls the in-memory `Extensions` (and through it, a deserialized
    /// `_meta`) out of an inbound request, whichever variant it is.
    fn peer_request_extensions(request: &Self::PeerReq) -> &Extensions;

    /// The request id an inbound `notifications/cancelled` refers to, if
    /// this notification is one.
    fn peer_cancelled_request_id(notification: &Self::PeerNot) -> Option<&RequestId>;
}

/// Hands out ids for this side's outbound requests. `Peer` is generic over
/// this so a future "client-chosen request id" scheme doesn't need to touch
/// the dispatch loop.
pub trait RequestIdProvider: Send + Sync + 'static {
    fn next_request_id(&self) -> RequestId;
}

impl RequestIdProvider for AtomicU32RequestIdProvider {
    fn next_request_id(&self) -> RequestId {
        self.next()
    }
}

/// What a [`Service`] implementation returns when it can't - or refuses to -
/// answer a request or complete a send.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync + 'static>),
    #[error("unexpected response type")]
    UnexpectedResponse,
    #[error("request {0} timed out")]
    Timeout(RequestId),
    #[error("service is closed")]
    TransportClosed,
    #[error("peer returned error: {0:?}")]
    McpError(ErrorData),
    #[error("cancelled")]
    Cancelled,
}

/// Ambient context threaded through a handler while it processes one
/// inbound request: who's asking ([`Self::peer`]), what the request id was
/// (to correlate an async task result, §4.6), a cancellation signal scoped
/// to this one request, and anything a transport attached out of band
/// ([`Self::extensions`]).
pub struct RequestContext<R: ServiceRole> {
    pub ct: CancellationToken,
    pub id: RequestId,
    pub meta: Meta,
    pub extensions: Extensions,
    pub peer: Peer<R>,
}

impl<R: ServiceRole> Clone for RequestContext<R> {
    fn clone(&self) -> Self {
        Self {
            ct: self.ct.clone(),
            id: self.id.clone(),
            meta: self.meta.clone(),
            extensions: self.extensions.clone(),
            peer: self.peer.clone(),
        }
    }
}

/// Ambient context threaded through a handler while it processes one
/// inbound notification. Lighter than [`RequestContext`]: a notification has
/// no id to correlate and nothing waits on its completion.
pub struct NotificationContext<R: ServiceRole> {
    pub peer: Peer<R>,
    pub extensions: Extensions,
    pub meta: Meta,
}

impl<R: ServiceRole> Clone for NotificationContext<R> {
    fn clone(&self) -> Self {
        Self {
            peer: self.peer.clone(),
            extensions: self.extensions.clone(),
            meta: self.meta.clone(),
        }
    }
}

enum PeerSinkMessage<R: ServiceRole> {
    Request(R::Req, RequestId, oneshot::Sender<Result<R::PeerResp, ServiceError>>),
    Notification(R::Not),
}

struct PeerInner<R: ServiceRole> {
    tx: mpsc::Sender<PeerSinkMessage<R>>,
    raw_tx: mpsc::Sender<TxJsonRpcMessage<R>>,
    request_id_provider: Arc<dyn RequestIdProvider>,
    peer_info: Option<R::PeerInfo>,
    pending: RwLock<HashMap<RequestId, oneshot::Sender<Result<R::PeerResp, ServiceError>>>>,
}

/// A cheap, cloneable handle to the other side of a running session.
///
/// Send requests and notifications at it; the background dispatch loop
/// spawned by [`serve_inner`] owns the actual transport and routes replies
/// back to whichever `send_request` call is waiting.
pub struct Peer<R: ServiceRole> {
    inner: Arc<PeerInner<R>>,
}

impl<R: ServiceRole> Clone for Peer<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: ServiceRole> std::fmt::Debug for Peer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer").field("is_client", &R::IS_CLIENT).finish()
    }
}

/// Plumbing shared by [`Peer::send_request`] and the dispatch loop: the
/// receiving half of the two channels `Peer` (and request handlers spawned
/// by the dispatch loop) enqueue outbound traffic on.
pub struct PeerRequester<R: ServiceRole> {
    rx: mpsc::Receiver<PeerSinkMessage<R>>,
    raw_rx: mpsc::Receiver<TxJsonRpcMessage<R>>,
}

impl<R: ServiceRole> Peer<R> {
    pub fn new<P: RequestIdProvider>(
        request_id_provider: P,
        peer_info: Option<R::PeerInfo>,
    ) -> (Self, PeerRequester<R>) {
        Self::new_with_provider(Arc::new(request_id_provider), peer_info)
    }

    pub fn new_with_provider(
        request_id_provider: Arc<dyn RequestIdProvider>,
        peer_info: Option<R::PeerInfo>,
    ) -> (Self, PeerRequester<R>) {
        let (tx, rx) = mpsc::channel(64);
        let (raw_tx, raw_rx) = mpsc::channel(64);
        (
            Self {
                inner: Arc::new(PeerInner {
                    tx,
                    raw_tx,
                    request_id_provider,
                    peer_info,
                    pending: RwLock::new(HashMap::new()),
                }),
            },
            PeerRequester { rx, raw_rx },
        )
    }

    pub fn peer_info(&self) -> Option<&R::PeerInfo> {
        self.inner.peer_info.as_ref()
    }

    pub async fn send_request(&self, request: R::Req) -> Result<R::PeerResp, ServiceError> {
        let id = self.inner.request_id_provider.next_request_id();
        let (tx, rx) = oneshot::channel();
        self.inner
            .tx
            .send(PeerSinkMessage::Request(request, id, tx))
            .await
            .map_err(|_| ServiceError::TransportClosed)?;
        rx.await.map_err(|_| ServiceError::TransportClosed)?
    }

    pub async fn send_notification(&self, notification: R::Not) -> Result<(), ServiceError> {
        self.inner
            .tx
            .send(PeerSinkMessage::Notification(notification))
            .await
            .map_err(|_| ServiceError::TransportClosed)
    }
}

/// The low-level interface the dispatch loop drives: answer an inbound
/// request, observe an inbound notification, describe yourself for the init
/// handshake. [`crate::ClientHandler`]/[`crate::ServerHandler`] are the
/// ergonomic traits most callers implement instead; each has a blanket
/// [`Service`] impl.
pub trait Service<R: ServiceRole>: Send + Sync + 'static {
    fn handle_request(
        &self,
        request: R::PeerReq,
        context: RequestContext<R>,
    ) -> impl Future<Output = Result<R::Resp, ErrorData>> + Send;

    fn handle_notification(
        &self,
        notification: R::PeerNot,
        context: NotificationContext<R>,
    ) -> impl Future<Output = ()> + Send;

    fn get_info(&self) -> R::Info;
}

/// Extension point for starting a [`Service`] over a concrete transport.
/// `serve`/`serve_with_ct` are what most callers reach for;
/// [`crate::RoleClient`]/[`crate::RoleServer`] each provide the impl.
pub trait ServiceExt<R: ServiceRole>: Service<R> + Sized {
    fn serve_with_ct<T, E, A>(
        self,
        transport: T,
        ct: CancellationToken,
    ) -> impl Future<Output = Result<RunningService<R, Self>, E>> + Send
    where
        T: IntoTransport<R, E, A>,
        E: std::error::Error + From<std::io::Error> + Send + Sync + 'static;

    fn serve<T, E, A>(
        self,
        transport: T,
    ) -> impl Future<Output = Result<RunningService<R, Self>, E>> + Send
    where
        T: IntoTransport<R, E, A>,
        E: std::error::Error + From<std::io::Error> + Send + Sync + 'static,
    {
        self.serve_with_ct(transport, CancellationToken::new())
    }
}

/// A [`Service`] currently being driven by a background dispatch task.
/// Dropping this does not stop the task - hold onto [`Self::cancellation_token`]
/// (or call [`Self::cancel`]) for that; `RunningService` is the join handle
/// plus a cheap way to reach the peer.
pub struct RunningService<R: ServiceRole, S> {
    service: Arc<S>,
    peer: Peer<R>,
    ct: CancellationToken,
    handle: tokio::task::JoinHandle<Result<(), ServiceError>>,
    _drop_guard: DropGuard,
}

impl<R: ServiceRole, S> RunningService<R, S> {
    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn peer(&self) -> &Peer<R> {
        &self.peer
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.ct.clone()
    }

    /// Resolves once the dispatch loop exits, whether because the peer
    /// closed the connection or [`Self::cancel`] was called.
    pub async fn waiting(self) -> Result<(), ServiceError> {
        self.handle
            .await
            .unwrap_or_else(|e| Err(ServiceError::Transport(Arc::new(std::io::Error::other(e)))))
    }

    /// Requests a shutdown and waits for the dispatch loop to exit.
    pub async fn cancel(self) -> Result<(), ServiceError> {
        self.ct.cancel();
        self.waiting().await
    }
}

/// Spawns the background task that owns `transport` and drives `service`
/// against it: outbound traffic `peer_rx` receives is written to the
/// transport; inbound messages read from the transport are matched against
/// outstanding requests or dispatched to `service`.
///
/// Shared verbatim by the client and server init paths once their
/// respective handshakes complete - see `service::client::serve_client_with_ct`
/// and `service::server::serve_server_with_ct`.
pub(crate) fn serve_inner<R, S, T>(
    service: S,
    transport: T,
    peer: Peer<R>,
    peer_rx: PeerRequester<R>,
    ct: CancellationToken,
) -> RunningService<R, S>
where
    R: ServiceRole,
    S: Service<R>,
    T: Transport<R> + Send + 'static,
{
    let service = Arc::new(service);
    let drop_guard = ct.clone().drop_guard();
    let handle = tokio::spawn(run_dispatch_loop(
        service.clone(),
        transport,
        peer.clone(),
        peer_rx,
        ct.clone(),
    ));
    RunningService {
        service,
        peer,
        ct,
        handle,
        _drop_guard: drop_guard,
    }
}

/// Drives `service` against `transport` without performing the `initialize`
/// handshake - the transport is assumed to already be talking to a peer that
/// either doesn't need one (a one-shot stateless request) or has completed it
/// out of band. Used by the Streamable HTTP and legacy SSE server transports
/// to hand a freshly accepted connection straight to the service.
pub fn serve_directly<R, S, T>(
    service: S,
    transport: T,
    peer_info: Option<R::PeerInfo>,
) -> RunningService<R, S>
where
    R: ServiceRole,
    S: Service<R>,
    T: Transport<R> + Send + 'static,
{
    serve_directly_with_ct(service, transport, peer_info, CancellationToken::new())
}

/// [`serve_directly`] with an externally supplied [`CancellationToken`].
pub fn serve_directly_with_ct<R, S, T>(
    service: S,
    transport: T,
    peer_info: Option<R::PeerInfo>,
    ct: CancellationToken,
) -> RunningService<R, S>
where
    R: ServiceRole,
    S: Service<R>,
    T: Transport<R> + Send + 'static,
{
    let id_provider = <Arc<AtomicU32RequestIdProvider>>::default();
    let (peer, peer_rx) = Peer::new_with_provider(id_provider, peer_info);
    serve_inner(service, transport, peer, peer_rx, ct)
}

async fn run_dispatch_loop<R, S, T>(
    service: Arc<S>,
    mut transport: T,
    peer: Peer<R>,
    mut peer_rx: PeerRequester<R>,
    ct: CancellationToken,
) -> Result<(), ServiceError>
where
    R: ServiceRole,
    S: Service<R>,
    T: Transport<R> + Send + 'static,
{
    // Lets an inbound `notifications/cancelled` reach the still-running
    // handler task for the request it names (E3): each in-flight request's
    // child token is registered here for the duration of `handle_request`.
    let request_cts: Arc<RwLock<HashMap<RequestId, CancellationToken>>> = Arc::new(RwLock::new(HashMap::new()));

    loop {
        tokio::select! {
            biased;
            _ = ct.cancelled() => {
                let _ = transport.close().await;
                return Ok(());
            }
            raw = peer_rx.raw_rx.recv() => {
                let Some(message) = raw else {
                    let _ = transport.close().await;
                    return Ok(());
                };
                if let Err(error) = transport.send(message).await {
                    return Err(ServiceError::Transport(Arc::new(error)));
                }
            }
            outbound = peer_rx.rx.recv() => {
                match outbound {
                    Some(PeerSinkMessage::Request(request, id, responder)) => {
                        peer.inner.pending.write().await.insert(id.clone(), responder);
                        let message = TxJsonRpcMessage::<R>::request(request, id);
                        if let Err(error) = transport.send(message).await {
                            return Err(ServiceError::Transport(Arc::new(error)));
                        }
                    }
                    Some(PeerSinkMessage::Notification(notification)) => {
                        let message = TxJsonRpcMessage::<R>::notification(notification);
                        if let Err(error) = transport.send(message).await {
                            return Err(ServiceError::Transport(Arc::new(error)));
                        }
                    }
                    None => {
                        let _ = transport.close().await;
                        return Ok(());
                    }
                }
            }
            inbound = transport.receive() => {
                let Some(message) = inbound else {
                    return Ok(());
                };
                match message {
                    crate::model::JsonRpcMessage::Request(req) => {
                        let service = service.clone();
                        let child_ct = ct.child_token();
                        let extensions = R::peer_request_extensions(&req.request).clone();
                        let meta = extensions.get::<Meta>().cloned().unwrap_or_default();
                        let context = RequestContext {
                            ct: child_ct.clone(),
                            id: req.id.clone(),
                            meta,
                            extensions,
                            peer: peer.clone(),
                        };
                        let responder_id = req.id.clone();
                        let raw_tx = peer.inner.raw_tx.clone();
                        let request_cts = request_cts.clone();
                        request_cts.write().await.insert(req.id.clone(), child_ct);
                        tokio::spawn(async move {
                            let result = service.handle_request(req.request, context).await;
                            request_cts.write().await.remove(&responder_id);
                            let outcome = match result {
                                Ok(resp) => TxJsonRpcMessage::<R>::response(resp, responder_id),
                                Err(error) => TxJsonRpcMessage::<R>::error(responder_id, error),
                            };
                            let _ = raw_tx.send(outcome).await;
                        });
                    }
                    crate::model::JsonRpcMessage::Notification(not) => {
                        if let Some(cancelled_id) = R::peer_cancelled_request_id(&not.notification) {
                            if let Some(child_ct) = request_cts.read().await.get(cancelled_id) {
                                child_ct.cancel();
                            }
                        }
                        let context = NotificationContext {
                            peer: peer.clone(),
                            extensions: Extensions::default(),
                            meta: Meta::default(),
                        };
                        let service = service.clone();
                        tokio::spawn(async move {
                            service.handle_notification(not.notification, context).await;
                        });
                    }
                    crate::model::JsonRpcMessage::Response(resp) => {
                        if let Some(tx) = peer.inner.pending.write().await.remove(&resp.id) {
                            let _ = tx.send(Ok(resp.result));
                        }
                    }
                    crate::model::JsonRpcMessage::Error(err) => {
                        if let Some(tx) = peer.inner.pending.write().await.remove(&err.id) {
                            let _ = tx.send(Err(ServiceError::McpError(err.error)));
                        }
                    }
                    crate::model::JsonRpcMessage::Batch(_) => {
                        // batching was deprecated in protocol version 2025-06-18; ignore.
                    }
                }
            }
        }
    }
}
