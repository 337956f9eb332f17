use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;

use super::{StreamableHttpServerConfig, session::SessionManager, session::local::LocalSessionManagerError};
use crate::{
    RoleServer,
    model::{ClientJsonRpcMessage, ClientRequest},
    serve_server,
    service::serve_directly,
    transport::{
        OneshotTransport, TransportAdapterIdentity,
        common::http_header::{
            EVENT_STREAM_MIME_TYPE, HEADER_LAST_EVENT_ID, HEADER_SESSION_ID, JSON_MIME_TYPE,
        },
    },
};

#[derive(Clone)]
pub struct StreamableHttpService<S, M = super::session::local::LocalSessionManager> {
    pub config: StreamableHttpServerConfig,
    session_manager: Arc<M>,
    service_factory: Arc<dyn Fn() -> std::io::Result<S> + Send + Sync>,
}

impl<S, M> StreamableHttpService<S, M>
where
    S: crate::Service<RoleServer> + Send + 'static,
    M: SessionManager + 'static,
{
    pub fn new(
        service_factory: impl Fn() -> std::io::Result<S> + Send + Sync + 'static,
        session_manager: Arc<M>,
        config: StreamableHttpServerConfig,
    ) -> Self {
        Self {
            config,
            session_manager,
            service_factory: Arc::new(service_factory),
        }
    }

    fn get_service(&self) -> std::io::Result<S> {
        (self.service_factory)()
    }

    /// Build an axum [`Router`] serving this service at its root path.
    pub fn into_router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/", get(Self::handle_get))
            .route("/", post(Self::handle_post))
            .route("/", delete(Self::handle_delete))
            .with_state(self)
    }

    fn internal_error(e: impl std::fmt::Display) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
    }

    /// Maps a [`SessionManager::resume`] failure to a response: a
    /// cross-session `Last-Event-Id` (spec.md §8 P5/E6) is a client error,
    /// everything else stays a 500. The downcast only fires for the default
    /// [`super::session::local::LocalSessionManager`] - a custom
    /// `SessionManager` whose error type isn't `LocalSessionManagerError`
    /// falls through to the generic 500, same as before this check existed.
    fn resume_error<E: std::error::Error + 'static>(e: E) -> Response {
        let dyn_err: &dyn std::error::Error = &e;
        if matches!(
            dyn_err.downcast_ref::<LocalSessionManagerError>(),
            Some(LocalSessionManagerError::WrongSessionEventId(_))
        ) {
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
        Self::internal_error(e)
    }

    fn sse_body(
        stream: impl Stream<Item = super::session::ServerSseMessage> + Send + 'static,
        keep_alive: Option<std::time::Duration>,
    ) -> Body {
        let body_stream = async_stream::stream! {
            let mut stream = Box::pin(stream);
            let mut keep_alive_timer = keep_alive.map(tokio::time::interval);

            loop {
                tokio::select! {
                    Some(msg) = stream.next() => {
                        let data = serde_json::to_string(&msg.message)
                            .unwrap_or_else(|_| "{}".to_string());
                        let mut output = String::new();
                        if let Some(id) = msg.event_id {
                            output.push_str(&format!("id: {}\n", id));
                        }
                        output.push_str(&format!("data: {}\n\n", data));
                        yield Ok::<_, std::io::Error>(Bytes::from(output));
                    }
                    _ = async {
                        match keep_alive_timer.as_mut() {
                            Some(timer) => { timer.tick().await; }
                            None => { std::future::pending::<()>().await; }
                        }
                    } => {
                        yield Ok(Bytes::from(":ping\n\n"));
                    }
                    else => break,
                }
            }
        };
        Body::from_stream(body_stream)
    }

    fn sse_response(body: Body, session_id: Option<&str>) -> Response {
        crate::transport::common::axum::sse_response(body, session_id)
    }

    async fn handle_get(
        State(service): State<Arc<Self>>,
        headers: HeaderMap,
    ) -> Response {
        let accept = headers.get(header::ACCEPT).and_then(|h| h.to_str().ok());
        if !accept.is_some_and(|h| h.contains(EVENT_STREAM_MIME_TYPE)) {
            return (
                StatusCode::NOT_ACCEPTABLE,
                "Not Acceptable: Client must accept text/event-stream",
            )
                .into_response();
        }

        let Some(session_id) = headers
            .get(HEADER_SESSION_ID)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_owned().into())
        else {
            return (StatusCode::UNAUTHORIZED, "Unauthorized: Session ID is required")
                .into_response();
        };

        tracing::debug!(%session_id, "GET request for SSE stream");

        match service.session_manager.has_session(&session_id).await {
            Ok(true) => {}
            Ok(false) => {
                return (StatusCode::UNAUTHORIZED, "Unauthorized: Session not found")
                    .into_response();
            }
            Err(e) => return Self::internal_error(e),
        }

        let last_event_id = headers
            .get(HEADER_LAST_EVENT_ID)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_owned());

        let stream: std::pin::Pin<
            Box<dyn Stream<Item = super::session::ServerSseMessage> + Send>,
        > = if let Some(last_event_id) = last_event_id {
            tracing::debug!(%session_id, %last_event_id, "Resuming stream from last event");
            match service.session_manager.resume(&session_id, last_event_id).await {
                Ok(stream) => Box::pin(stream),
                Err(e) => return Self::resume_error(e),
            }
        } else {
            tracing::debug!(%session_id, "Creating standalone stream");
            match service.session_manager.create_standalone_stream(&session_id).await {
                Ok(stream) => Box::pin(stream),
                Err(e) => return Self::internal_error(e),
            }
        };

        Self::sse_response(Self::sse_body(stream, service.config.sse_keep_alive), None)
    }

    async fn handle_post(
        State(service): State<Arc<Self>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let accept = headers.get(header::ACCEPT).and_then(|h| h.to_str().ok());
        if !accept.is_some_and(|h| h.contains(JSON_MIME_TYPE) && h.contains(EVENT_STREAM_MIME_TYPE)) {
            return (
                StatusCode::NOT_ACCEPTABLE,
                "Not Acceptable: Client must accept both application/json and text/event-stream",
            )
                .into_response();
        }

        let content_type = headers.get(header::CONTENT_TYPE).and_then(|h| h.to_str().ok());
        if !content_type.is_some_and(|h| h.starts_with(JSON_MIME_TYPE)) {
            return (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported Media Type: Content-Type must be application/json",
            )
                .into_response();
        }

        let mut message: ClientJsonRpcMessage = match serde_json::from_slice(&body) {
            Ok(message) => message,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };

        tracing::debug!(?message, "POST request with message");

        if !service.config.stateful_mode {
            return Self::handle_post_stateless(service, message).await;
        }

        let session_id = headers
            .get(HEADER_SESSION_ID)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_owned());

        let Some(session_id) = session_id else {
            tracing::debug!("POST request without session, creating new session");
            return Self::handle_post_new_session(service, message).await;
        };

        let session_id: super::session::SessionId = session_id.into();
        tracing::debug!(%session_id, "POST request with existing session");

        match service.session_manager.has_session(&session_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(%session_id, "Session not found");
                return (StatusCode::UNAUTHORIZED, "Unauthorized: Session not found")
                    .into_response();
            }
            Err(e) => return Self::internal_error(e),
        }

        match message {
            ClientJsonRpcMessage::Request(_) => {
                let stream = match service.session_manager.create_stream(&session_id, message).await {
                    Ok(stream) => stream,
                    Err(e) => return Self::internal_error(e),
                };
                Self::sse_response(Self::sse_body(stream, service.config.sse_keep_alive), None)
            }
            ClientJsonRpcMessage::Notification(_)
            | ClientJsonRpcMessage::Response(_)
            | ClientJsonRpcMessage::Error(_) => {
                if let Err(e) = service.session_manager.accept_message(&session_id, message).await {
                    return Self::internal_error(e);
                }
                StatusCode::ACCEPTED.into_response()
            }
            ClientJsonRpcMessage::BatchRequest(_) | ClientJsonRpcMessage::BatchResponse(_) => {
                (StatusCode::NOT_IMPLEMENTED, "Batch requests are not supported yet").into_response()
            }
        }
    }

    async fn handle_post_new_session(service: Arc<Self>, mut message: ClientJsonRpcMessage) -> Response {
        let (session_id, transport) = match service.session_manager.create_session().await {
            Ok(result) => result,
            Err(e) => return Self::internal_error(e),
        };

        tracing::info!(%session_id, "Created new session");

        match &mut message {
            ClientJsonRpcMessage::Request(req) if matches!(req.request, ClientRequest::InitializeRequest(_)) => {}
            _ => {
                return (StatusCode::UNPROCESSABLE_ENTITY, "Expected initialize request").into_response();
            }
        }

        let service_instance = match service.get_service() {
            Ok(instance) => instance,
            Err(e) => return Self::internal_error(e),
        };

        tokio::spawn({
            let session_manager = service.session_manager.clone();
            let session_id = session_id.clone();
            async move {
                let running = serve_server::<S, M::Transport, _, TransportAdapterIdentity>(
                    service_instance,
                    transport,
                )
                .await;
                match running {
                    Ok(running) => {
                        let _ = running.waiting().await;
                    }
                    Err(e) => tracing::error!("Failed to create service: {e}"),
                }
                let _ = session_manager.close_session(&session_id).await.inspect_err(|e| {
                    tracing::error!("Failed to close session {session_id}: {e}");
                });
            }
        });

        let response = match service.session_manager.initialize_session(&session_id, message).await {
            Ok(response) => response,
            Err(e) => return Self::internal_error(e),
        };

        let body_stream = async_stream::stream! {
            yield Ok::<_, std::io::Error>(Bytes::from(format!(
                "data: {}\n\n",
                serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
            )));
        };

        Self::sse_response(Body::from_stream(body_stream), Some(session_id.as_ref()))
    }

    async fn handle_post_stateless(service: Arc<Self>, message: ClientJsonRpcMessage) -> Response {
        tracing::debug!("POST request in stateless mode");

        let ClientJsonRpcMessage::Request(request) = message else {
            return (StatusCode::UNPROCESSABLE_ENTITY, "Unexpected message type").into_response();
        };

        let service_instance = match service.get_service() {
            Ok(instance) => instance,
            Err(e) => return Self::internal_error(e),
        };

        let (transport, receiver) =
            OneshotTransport::<RoleServer>::new(ClientJsonRpcMessage::Request(request));
        let service_handle = serve_directly(service_instance, transport, None);

        tokio::spawn(async move {
            let _ = service_handle.waiting().await;
        });

        let stream = ReceiverStream::new(receiver).map(|message| {
            let data = serde_json::to_string(&message).unwrap_or_else(|_| "{}".to_string());
            Ok::<_, std::io::Error>(Bytes::from(format!("data: {}\n\n", data)))
        });

        let body_stream = async_stream::stream! {
            let mut stream = Box::pin(stream);
            let keep_alive = service.config.sse_keep_alive;
            let mut keep_alive_timer = keep_alive.map(tokio::time::interval);
            loop {
                tokio::select! {
                    Some(result) = stream.next() => {
                        yield result;
                    }
                    _ = async {
                        match keep_alive_timer.as_mut() {
                            Some(timer) => { timer.tick().await; }
                            None => { std::future::pending::<()>().await; }
                        }
                    } => {
                        yield Ok(Bytes::from(":ping\n\n"));
                    }
                    else => break,
                }
            }
        };

        Self::sse_response(Body::from_stream(body_stream), None)
    }

    async fn handle_delete(State(service): State<Arc<Self>>, headers: HeaderMap) -> Response {
        let Some(session_id) = headers
            .get(HEADER_SESSION_ID)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_owned().into())
        else {
            return (StatusCode::UNAUTHORIZED, "Unauthorized: Session ID is required").into_response();
        };

        tracing::debug!(%session_id, "DELETE request to close session");

        if let Err(e) = service.session_manager.close_session(&session_id).await {
            return Self::internal_error(e);
        }

        tracing::info!(%session_id, "Session closed");
        StatusCode::NO_CONTENT.into_response()
    }
}
