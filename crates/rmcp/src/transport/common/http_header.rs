//! Header and content-type constants shared by the Streamable HTTP and
//! legacy SSE server transports, across both the axum and actix-web
//! implementations.

pub const HEADER_SESSION_ID: &str = "Mcp-Session-Id";
pub const HEADER_LAST_EVENT_ID: &str = "Last-Event-ID";
/// Disables response buffering on nginx-fronted deployments so SSE bytes
/// reach the client as they're written.
pub const HEADER_X_ACCEL_BUFFERING: &str = "X-Accel-Buffering";
/// `Mcp-Protocol-Version`, required on every request once a session has
/// completed initialization.
pub const HEADER_PROTOCOL_VERSION: &str = "Mcp-Protocol-Version";

pub const EVENT_STREAM_MIME_TYPE: &str = "text/event-stream";
pub const JSON_MIME_TYPE: &str = "application/json";
