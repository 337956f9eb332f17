//! Types shared by the Streamable HTTP server transport's
//! [`super::super::streamable_http_server::session`] module across both the
//! axum and actix-web adapters.

use std::sync::Arc;

use crate::model::ServerJsonRpcMessage;

/// Identifies one logical MCP session, carried in the `Mcp-Session-Id`
/// header on every request after `initialize`.
pub type SessionId = Arc<str>;

pub fn session_id() -> SessionId {
    uuid::Uuid::new_v4().to_string().into()
}

/// One SSE event a [`super::super::streamable_http_server::session::SessionManager`]
/// stream yields: a JSON-RPC message plus the event id used for
/// `Last-Event-ID`-based resumption.
#[derive(Debug, Clone)]
pub struct ServerSseMessage {
    pub event_id: Option<String>,
    pub message: ServerJsonRpcMessage,
}
