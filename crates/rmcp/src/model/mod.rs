//! The MCP wire data model: the JSON-RPC 2.0 envelope (§3) and the
//! MCP-defined request/result/notification payloads it carries (§6).

mod annotated;
mod content;
pub mod elicitation_schema;
mod meta;
mod prompt;
mod resource;
mod serde_impl;
mod tool;

pub use annotated::*;
pub use content::*;
pub use elicitation_schema::*;
pub use meta::*;
pub use prompt::*;
pub use resource::*;
pub use tool::*;

use std::{
    borrow::Cow,
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

pub type JsonObject<F = Value> = serde_json::Map<String, F>;

/// Defines a unit struct that serializes/deserializes to exactly one fixed
/// string literal. Used for JSON-RPC `"jsonrpc": "2.0"` and `"method": "..."`
/// discriminator fields that carry no information beyond their presence.
#[macro_export]
macro_rules! const_string {
    ($name:ident = $value:literal) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl $name {
            pub const VALUE: &'static str = $value;
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($value)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s: std::borrow::Cow<'de, str> = serde::Deserialize::deserialize(deserializer)?;
                if s != $value {
                    return Err(serde::de::Error::custom(format!(
                        concat!("expected \"", $value, "\", got {}"),
                        s
                    )));
                }
                Ok($name)
            }
        }

        #[cfg_attr(feature = "schemars", allow(unused))]
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($value)
            }
        }
    };
}

/// Marker trait for the const-string newtypes generated by [`const_string!`].
pub trait ConstString: Default + Serialize + for<'de> Deserialize<'de> {
    const VALUE: &'static str;
}

const_string!(JsonRpcVersion2_0 = "2.0");
const_string!(LatestProtocolVersionConst = "2025-06-18");

/// Protocol versions this crate negotiates, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Picks the protocol version to respond with during `initialize` (§4.2):
/// the client's requested version if supported, else the latest supported.
pub fn negotiate_protocol_version(requested: &str) -> Cow<'static, str> {
    match SUPPORTED_PROTOCOL_VERSIONS.iter().find(|v| **v == requested) {
        Some(v) => Cow::Borrowed(*v),
        None => Cow::Borrowed(LATEST_PROTOCOL_VERSION),
    }
}

/// Role of a peer's message origin (used e.g. for content audience tagging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum Role {
    User,
    Assistant,
}

/// An icon descriptor attached to a tool, prompt, or resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Icon {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
}

// ---------------------------------------------------------------------
// RequestId (§3)
// ---------------------------------------------------------------------

/// A JSON-RPC request id: either a string or an integer. Equality and
/// rendering preserve the wire kind (I do not coerce `"1"` and `1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum RequestId {
    Number(u32),
    String(Arc<str>),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<u32> for RequestId {
    fn from(value: u32) -> Self {
        RequestId::Number(value)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        RequestId::String(value.into())
    }
}

/// Hands out sequential integer request ids for a session's outbound requests.
#[derive(Debug, Default)]
pub struct AtomicU32RequestIdProvider {
    next: AtomicU32,
}

impl AtomicU32RequestIdProvider {
    pub fn next(&self) -> RequestId {
        RequestId::Number(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// string|integer progress correlation token carried in `params._meta.progressToken`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum ProgressToken {
    Number(u32),
    String(Arc<str>),
}

// ---------------------------------------------------------------------
// Extensions (non-serialized, in-memory routing context) + Meta (wire `_meta`)
// ---------------------------------------------------------------------

/// A type-keyed map of arbitrary `Send + Sync` values, attached to a message
/// in memory only. Never serialized. This is how a transport attaches the
/// "related transport" handle (§4.1, §9) and how handlers receive ambient
/// context (the request's [`RequestContext`](crate::service::RequestContext),
/// a [`tokio_util::sync::CancellationToken`], etc.) without it ever crossing
/// the wire.
#[derive(Default, Clone)]
pub struct Extensions(HashMap<std::any::TypeId, Arc<dyn std::any::Any + Send + Sync>>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<Arc<T>> {
        self.0
            .insert(std::any::TypeId::of::<T>(), Arc::new(value))
            .and_then(|old| old.downcast::<T>().ok())
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.0
            .get(&std::any::TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<Arc<T>> {
        self.0
            .remove(&std::any::TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.0.len())
            .finish()
    }
}

/// The serialized `_meta` object: free-form, but this crate interprets a
/// handful of reserved keys (`progressToken`, `traceparent`, `tracestate`,
/// and the task-request fields in [`RequestMeta`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Meta(pub(crate) JsonObject);

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn progress_token(&self) -> Option<ProgressToken> {
        self.0
            .get("progressToken")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_progress_token(&mut self, token: ProgressToken) {
        self.0.insert(
            "progressToken".into(),
            serde_json::to_value(token).expect("ProgressToken always serializes"),
        );
    }

    pub fn traceparent(&self) -> Option<&str> {
        self.0.get("traceparent").and_then(Value::as_str)
    }

    pub fn tracestate(&self) -> Option<&str> {
        self.0.get("tracestate").and_then(Value::as_str)
    }

    /// The `task` field requesting call-now-fetch-later execution (§4.6).
    pub fn task(&self) -> Option<TaskMetadata> {
        self.0
            .get("task")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_task(&mut self, task: TaskMetadata) {
        self.0.insert(
            "task".into(),
            serde_json::to_value(task).expect("TaskMetadata always serializes"),
        );
    }
}

/// `_meta` as attached to an outbound request's params: adds the
/// task-creation fields used by §4.6.
pub type RequestMeta = Meta;

// ---------------------------------------------------------------------
// JSON-RPC envelope (§3, §6)
// ---------------------------------------------------------------------

/// A request's params plus its non-serialized [`Extensions`] (carrying
/// `_meta` during (de)serialization; see `serde_impl`).
#[derive(Debug, Clone)]
pub struct Request<M = String, P = JsonObject> {
    pub method: M,
    pub params: P,
    pub extensions: Extensions,
}

impl<M, P> Request<M, P> {
    pub fn new(method: M, params: P) -> Self {
        Self {
            method,
            params,
            extensions: Extensions::new(),
        }
    }
}

/// A request whose params are optional at the wire level.
#[derive(Debug, Clone)]
pub struct RequestOptionalParam<M = String, P = JsonObject> {
    pub method: M,
    pub params: Option<P>,
    pub extensions: Extensions,
}

/// A request that never carries params (e.g. `ping`).
#[derive(Debug, Clone, Default)]
pub struct RequestNoParam<M = String> {
    pub method: M,
    pub extensions: Extensions,
}

/// A notification (no response expected).
#[derive(Debug, Clone)]
pub struct Notification<M = String, P = JsonObject> {
    pub method: M,
    pub params: P,
    pub extensions: Extensions,
}

impl<M, P> Notification<M, P> {
    pub fn new(method: M, params: P) -> Self {
        Self {
            method,
            params,
            extensions: Extensions::new(),
        }
    }
}

/// A notification that never carries params.
#[derive(Debug, Clone, Default)]
pub struct NotificationNoParam<M = String> {
    pub method: M,
    pub extensions: Extensions,
}

/// A JSON-RPC error code: the five standard codes plus the two MCP
/// extension codes (§6). A thin newtype (rather than a bare `i32`) so a
/// mismatched comparison (`ErrorCode` vs. an arbitrary integer) is a type
/// error, not a silent bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const PARSE_ERROR: Self = Self(-32700);
    pub const INVALID_REQUEST: Self = Self(-32600);
    pub const METHOD_NOT_FOUND: Self = Self(-32601);
    pub const INVALID_PARAMS: Self = Self(-32602);
    pub const INTERNAL_ERROR: Self = Self(-32603);
    pub const RESOURCE_NOT_FOUND: Self = Self(-32002);
    pub const URL_ELICITATION_REQUIRED: Self = Self(-32042);
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deprecated path kept for call sites grounded on the teacher's flat
/// constant module; prefer `ErrorCode::PARSE_ERROR` etc.
pub mod error_codes {
    use super::ErrorCode;
    pub const PARSE_ERROR: ErrorCode = ErrorCode::PARSE_ERROR;
    pub const INVALID_REQUEST: ErrorCode = ErrorCode::INVALID_REQUEST;
    pub const METHOD_NOT_FOUND: ErrorCode = ErrorCode::METHOD_NOT_FOUND;
    pub const INVALID_PARAMS: ErrorCode = ErrorCode::INVALID_PARAMS;
    pub const INTERNAL_ERROR: ErrorCode = ErrorCode::INTERNAL_ERROR;
    pub const RESOURCE_NOT_FOUND: ErrorCode = ErrorCode::RESOURCE_NOT_FOUND;
    pub const URL_ELICITATION_REQUIRED: ErrorCode = ErrorCode::URL_ELICITATION_REQUIRED;
}

/// A structured JSON-RPC error object (§7, §10). This is the one Rust type
/// representing every JSON-RPC error surface; `Display`/`Error` live on
/// `crate::error` alongside the service-level `RmcpError` it composes with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ErrorData {
    pub code: ErrorCode,
    pub message: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

macro_rules! error_ctor {
    ($name:ident, $code:expr) => {
        pub fn $name(message: impl Into<Cow<'static, str>>, data: Option<Value>) -> Self {
            Self {
                code: $code,
                message: message.into(),
                data,
            }
        }
    };
}

impl ErrorData {
    error_ctor!(parse_error, error_codes::PARSE_ERROR);
    error_ctor!(invalid_request, error_codes::INVALID_REQUEST);
    error_ctor!(method_not_found, error_codes::METHOD_NOT_FOUND);
    error_ctor!(invalid_params, error_codes::INVALID_PARAMS);
    error_ctor!(internal_error, error_codes::INTERNAL_ERROR);
    error_ctor!(resource_not_found, error_codes::RESOURCE_NOT_FOUND);

    /// §7 "URL-elicitation-required": `data.elicitations` carries the
    /// out-of-band elicitation descriptors the caller must complete.
    pub fn url_elicitation_required(elicitations: Value) -> Self {
        Self {
            code: error_codes::URL_ELICITATION_REQUIRED,
            message: Cow::Borrowed("URL elicitation required"),
            data: Some(serde_json::json!({ "elicitations": elicitations })),
        }
    }
}

/// Generic JSON-RPC message sum type (§3). Monomorphized below into
/// [`ClientJsonRpcMessage`] and [`ServerJsonRpcMessage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage<Req, Resp, Noti> {
    Request(JsonRpcRequest<Req>),
    Response(JsonRpcResponse<Resp>),
    Notification(JsonRpcNotification<Noti>),
    Error(JsonRpcError),
    /// A batch of messages. Rarely used since MCP protocol version
    /// 2025-06-18 deprecated batching, kept for backward wire compatibility.
    Batch(Vec<JsonRpcBatchItem<Req, Resp, Noti>>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcBatchItem<Req, Resp, Noti> {
    Request(JsonRpcRequest<Req>),
    Response(JsonRpcResponse<Resp>),
    Notification(JsonRpcNotification<Noti>),
    Error(JsonRpcError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest<R> {
    pub jsonrpc: JsonRpcVersion2_0,
    pub id: RequestId,
    #[serde(flatten)]
    pub request: R,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse<R> {
    pub jsonrpc: JsonRpcVersion2_0,
    pub id: RequestId,
    pub result: R,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification<N> {
    pub jsonrpc: JsonRpcVersion2_0,
    #[serde(flatten)]
    pub notification: N,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub jsonrpc: JsonRpcVersion2_0,
    pub id: RequestId,
    pub error: ErrorData,
}

impl<R> JsonRpcResponse<R> {
    pub fn new(id: RequestId, result: R) -> Self {
        Self {
            jsonrpc: JsonRpcVersion2_0,
            id,
            result,
        }
    }
}

impl JsonRpcError {
    pub fn new(id: RequestId, error: ErrorData) -> Self {
        Self {
            jsonrpc: JsonRpcVersion2_0,
            id,
            error,
        }
    }
}

impl<Req, Resp, Noti> JsonRpcMessage<Req, Resp, Noti> {
    pub fn request(request: Req, id: RequestId) -> Self {
        JsonRpcMessage::Request(JsonRpcRequest {
            jsonrpc: JsonRpcVersion2_0,
            id,
            request,
        })
    }

    pub fn notification(notification: Noti) -> Self {
        JsonRpcMessage::Notification(JsonRpcNotification {
            jsonrpc: JsonRpcVersion2_0,
            notification,
        })
    }

    pub fn response(result: Resp, id: RequestId) -> Self {
        JsonRpcMessage::Response(JsonRpcResponse::new(id, result))
    }

    pub fn error(id: RequestId, error: ErrorData) -> Self {
        JsonRpcMessage::Error(JsonRpcError::new(id, error))
    }
}

/// A client -> server wire message, unwrapped from its JSON-RPC envelope
/// for dispatch convenience: the session kernel (§4.2) matches on this
/// rather than re-destructuring [`ClientJsonRpcMessage`] at every call site.
#[derive(Debug, Clone)]
pub enum ClientMessage {
    Request(ClientRequest, RequestId),
    Notification(ClientNotification),
    Response(ClientResult, RequestId),
    Error(RequestId, ErrorData),
}

impl ClientMessage {
    pub fn into_request(self) -> Option<(ClientRequest, RequestId)> {
        match self {
            ClientMessage::Request(r, id) => Some((r, id)),
            _ => None,
        }
    }

    pub fn into_notification(self) -> Option<ClientNotification> {
        match self {
            ClientMessage::Notification(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_json_rpc_message(self) -> ClientJsonRpcMessage {
        match self {
            ClientMessage::Request(r, id) => ClientJsonRpcMessage::request(r, id),
            ClientMessage::Notification(n) => ClientJsonRpcMessage::notification(n),
            ClientMessage::Response(r, id) => ClientJsonRpcMessage::response(r, id),
            ClientMessage::Error(id, e) => ClientJsonRpcMessage::error(id, e),
        }
    }
}

impl ClientJsonRpcMessage {
    /// Unwraps the JSON-RPC envelope. Batching was deprecated by protocol
    /// version 2025-06-18 (§3); a non-empty batch is collapsed to its first
    /// item, an empty one to a synthetic `InvalidRequest` error.
    pub fn into_message(self) -> ClientMessage {
        fn from_item(
            item: JsonRpcBatchItem<ClientRequest, ClientResult, ClientNotification>,
        ) -> ClientMessage {
            match item {
                JsonRpcBatchItem::Request(JsonRpcRequest { id, request, .. }) => {
                    ClientMessage::Request(request, id)
                }
                JsonRpcBatchItem::Notification(JsonRpcNotification { notification, .. }) => {
                    ClientMessage::Notification(notification)
                }
                JsonRpcBatchItem::Response(JsonRpcResponse { id, result, .. }) => {
                    ClientMessage::Response(result, id)
                }
                JsonRpcBatchItem::Error(JsonRpcError { id, error, .. }) => {
                    ClientMessage::Error(id, error)
                }
            }
        }
        match self {
            JsonRpcMessage::Request(JsonRpcRequest { id, request, .. }) => {
                ClientMessage::Request(request, id)
            }
            JsonRpcMessage::Notification(JsonRpcNotification { notification, .. }) => {
                ClientMessage::Notification(notification)
            }
            JsonRpcMessage::Response(JsonRpcResponse { id, result, .. }) => {
                ClientMessage::Response(result, id)
            }
            JsonRpcMessage::Error(JsonRpcError { id, error, .. }) => {
                ClientMessage::Error(id, error)
            }
            JsonRpcMessage::Batch(items) => items.into_iter().next().map(from_item).unwrap_or_else(|| {
                ClientMessage::Error(
                    RequestId::Number(0),
                    ErrorData::invalid_request("empty batch", None),
                )
            }),
        }
    }
}

/// A server -> client wire message, unwrapped from its JSON-RPC envelope;
/// the mirror of [`ClientMessage`].
#[derive(Debug, Clone)]
pub enum ServerMessage {
    Request(ServerRequest, RequestId),
    Notification(ServerNotification),
    Response(ServerResult, RequestId),
    Error(RequestId, ErrorData),
}

impl ServerMessage {
    pub fn into_request(self) -> Option<(ServerRequest, RequestId)> {
        match self {
            ServerMessage::Request(r, id) => Some((r, id)),
            _ => None,
        }
    }

    pub fn into_notification(self) -> Option<ServerNotification> {
        match self {
            ServerMessage::Notification(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_json_rpc_message(self) -> ServerJsonRpcMessage {
        match self {
            ServerMessage::Request(r, id) => ServerJsonRpcMessage::request(r, id),
            ServerMessage::Notification(n) => ServerJsonRpcMessage::notification(n),
            ServerMessage::Response(r, id) => ServerJsonRpcMessage::response(r, id),
            ServerMessage::Error(id, e) => ServerJsonRpcMessage::error(id, e),
        }
    }
}

impl ServerJsonRpcMessage {
    pub fn into_message(self) -> ServerMessage {
        fn from_item(
            item: JsonRpcBatchItem<ServerRequest, ServerResult, ServerNotification>,
        ) -> ServerMessage {
            match item {
                JsonRpcBatchItem::Request(JsonRpcRequest { id, request, .. }) => {
                    ServerMessage::Request(request, id)
                }
                JsonRpcBatchItem::Notification(JsonRpcNotification { notification, .. }) => {
                    ServerMessage::Notification(notification)
                }
                JsonRpcBatchItem::Response(JsonRpcResponse { id, result, .. }) => {
                    ServerMessage::Response(result, id)
                }
                JsonRpcBatchItem::Error(JsonRpcError { id, error, .. }) => {
                    ServerMessage::Error(id, error)
                }
            }
        }
        match self {
            JsonRpcMessage::Request(JsonRpcRequest { id, request, .. }) => {
                ServerMessage::Request(request, id)
            }
            JsonRpcMessage::Notification(JsonRpcNotification { notification, .. }) => {
                ServerMessage::Notification(notification)
            }
            JsonRpcMessage::Response(JsonRpcResponse { id, result, .. }) => {
                ServerMessage::Response(result, id)
            }
            JsonRpcMessage::Error(JsonRpcError { id, error, .. }) => {
                ServerMessage::Error(id, error)
            }
            JsonRpcMessage::Batch(items) => items.into_iter().next().map(from_item).unwrap_or_else(|| {
                ServerMessage::Error(
                    RequestId::Number(0),
                    ErrorData::invalid_request("empty batch", None),
                )
            }),
        }
    }
}

// ---------------------------------------------------------------------
// Capabilities + initialize (§4.2, §6)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Implementation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub version: String,
}

impl Implementation {
    pub fn from_build_env() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            title: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct RootsCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elicitation: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<JsonObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ListChangedCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ResourcesCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// §4.6: the `tasks` capability and its sub-capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct TasksCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<TasksRequestsCapability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct TasksRequestsCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsTasksCapability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ToolsTasksCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ListChangedCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListChangedCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<TasksCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<JsonObject>,
}

impl ServerCapabilities {
    pub fn builder() -> ServerCapabilitiesBuilder {
        ServerCapabilitiesBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ServerCapabilitiesBuilder {
    capabilities: ServerCapabilities,
}

impl ServerCapabilitiesBuilder {
    pub fn enable_logging(mut self) -> Self {
        self.capabilities.logging = Some(JsonObject::default());
        self
    }
    pub fn enable_tools(mut self) -> Self {
        self.capabilities.tools = Some(ListChangedCapability {
            list_changed: Some(true),
        });
        self
    }
    pub fn enable_prompts(mut self) -> Self {
        self.capabilities.prompts = Some(ListChangedCapability {
            list_changed: Some(true),
        });
        self
    }
    pub fn enable_resources(mut self) -> Self {
        self.capabilities.resources = Some(ResourcesCapability {
            subscribe: Some(true),
            list_changed: Some(true),
        });
        self
    }
    pub fn enable_completions(mut self) -> Self {
        self.capabilities.completions = Some(JsonObject::default());
        self
    }
    pub fn enable_tasks(mut self, list: bool, cancel: bool) -> Self {
        self.capabilities.tasks = Some(TasksCapability {
            list: Some(list),
            cancel: Some(cancel),
            requests: Some(TasksRequestsCapability {
                tools: Some(ToolsTasksCapability { call: Some(true) }),
            }),
        });
        self
    }
    pub fn build(self) -> ServerCapabilities {
        self.capabilities
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct InitializeRequestParam {
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    pub client_info: Implementation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

pub type ClientInfo = InitializeRequestParam;
pub type ServerInfo = InitializeResult;

// ---------------------------------------------------------------------
// Pagination (§4.7)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct PaginatedRequestParam {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

pub trait PaginatedResult {
    fn next_cursor(&self) -> Option<&str>;
}

macro_rules! paginated_result {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        #[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
        pub struct $name {
            $(pub $field: $ty,)*
            #[serde(skip_serializing_if = "Option::is_none")]
            pub next_cursor: Option<String>,
        }

        impl PaginatedResult for $name {
            fn next_cursor(&self) -> Option<&str> {
                self.next_cursor.as_deref()
            }
        }
    };
}

paginated_result!(ListToolsResult { tools: Vec<Tool> });
paginated_result!(ListPromptsResult { prompts: Vec<Prompt> });
paginated_result!(ListResourcesResult { resources: Vec<Resource> });
paginated_result!(ListResourceTemplatesResult { resource_templates: Vec<ResourceTemplate> });

// ---------------------------------------------------------------------
// Tools (§6)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CallToolRequestParam {
    pub name: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<JsonObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    /// Present instead of a synchronous result when the call was dispatched
    /// as a task (§4.6).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskHandle>,
}

impl CallToolResult {
    pub fn success(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: Some(false),
            ..Default::default()
        }
    }

    pub fn error(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: Some(true),
            ..Default::default()
        }
    }

    pub fn task(task: TaskHandle) -> Self {
        Self {
            content: Vec::new(),
            task: Some(task),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------
// Prompts (§6)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct GetPromptRequestParam {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<JsonObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct GetPromptResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

// ---------------------------------------------------------------------
// Resources (§6)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ReadResourceRequestParam {
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct SubscribeRequestParam {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct UnsubscribeRequestParam {
    pub uri: String,
}

// ---------------------------------------------------------------------
// Completion (§10.5)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum CompletionReference {
    #[serde(rename = "ref/prompt")]
    Prompt { name: String },
    #[serde(rename = "ref/resource")]
    Resource { uri: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CompletionArgument {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CompletionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CompleteRequestParam {
    #[serde(rename = "ref")]
    pub r#ref: CompletionReference,
    pub argument: CompletionArgument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<CompletionContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CompletionInfo {
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl CompletionInfo {
    pub const MAX_VALUES: usize = 100;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CompleteResult {
    pub completion: CompletionInfo,
}

// ---------------------------------------------------------------------
// Roots (§10.5)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Root {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ListRootsResult {
    pub roots: Vec<Root>,
}

// ---------------------------------------------------------------------
// Sampling (§10.5)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct SamplingMessage {
    pub role: Role,
    pub content: Content,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ModelPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<ModelHint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_priority: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_priority: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intelligence_priority: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ModelHint {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CreateMessageRequestParam {
    pub messages: Vec<SamplingMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_preferences: Option<ModelPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CreateMessageResult {
    pub role: Role,
    pub content: Content,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

// ---------------------------------------------------------------------
// Elicitation (§10.5, §7 url-elicitation)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CreateElicitationRequestParam {
    pub message: String,
    pub requested_schema: JsonObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum ElicitationAction {
    Accept,
    Decline,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CreateElicitationResult {
    pub action: ElicitationAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<JsonObject>,
}

// ---------------------------------------------------------------------
// Progress / cancellation / logging notifications (§6)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ProgressNotificationParam {
    pub progress_token: ProgressToken,
    pub progress: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CancelledNotificationParam {
    pub request_id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum LoggingLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl LoggingLevel {
    /// The nearest [`tracing::Level`] for local log emission alongside the
    /// wire `notifications/message` notification (§10.1).
    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            LoggingLevel::Debug => tracing::Level::DEBUG,
            LoggingLevel::Info | LoggingLevel::Notice => tracing::Level::INFO,
            LoggingLevel::Warning => tracing::Level::WARN,
            LoggingLevel::Error
            | LoggingLevel::Critical
            | LoggingLevel::Alert
            | LoggingLevel::Emergency => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct SetLevelRequestParam {
    pub level: LoggingLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct LoggingMessageNotificationParam {
    pub level: LoggingLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ResourceUpdatedNotificationParam {
    pub uri: String,
}

// ---------------------------------------------------------------------
// Task subsystem wire types (§4.6)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum TaskStatus {
    Working,
    InputRequired,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// The `task` metadata object a client places in a `tools/call` request's
/// params to request call-now-fetch-later execution (§4.6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct TaskMetadata {
    /// ISO-8601 duration (e.g. `"PT5M"`) bounding how long the task may run
    /// before it is forcibly cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<String>,
}

/// What a `CallToolResult` carries in place of a synchronous result when
/// the call was dispatched as a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct TaskHandle {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct GetTaskRequestParam {
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct TaskStatusResult {
    pub task_id: String,
    pub status: TaskStatus,
    pub created_at: String,
    pub last_updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct GetTaskResultRequestParam {
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum TaskResult {
    CallTool(CallToolResult),
}

paginated_result!(ListTasksResult { tasks: Vec<TaskStatusResult> });

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CancelTaskRequestParam {
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct TaskStatusNotificationParam {
    pub task_id: String,
    pub status: TaskStatus,
}

// ---------------------------------------------------------------------
// Client/server request, result, and notification enums (§6)
// ---------------------------------------------------------------------

/// A request a client may send to a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ClientRequest {
    #[serde(rename = "initialize")]
    InitializeRequest(Request<InitializeMethod, InitializeRequestParam>),
    #[serde(rename = "ping")]
    PingRequest(RequestNoParam<PingMethod>),
    #[serde(rename = "tools/list")]
    ListToolsRequest(RequestOptionalParam<ListToolsMethod, PaginatedRequestParam>),
    #[serde(rename = "tools/call")]
    CallToolRequest(Request<CallToolMethod, CallToolRequestParam>),
    #[serde(rename = "prompts/list")]
    ListPromptsRequest(RequestOptionalParam<ListPromptsMethod, PaginatedRequestParam>),
    #[serde(rename = "prompts/get")]
    GetPromptRequest(Request<GetPromptMethod, GetPromptRequestParam>),
    #[serde(rename = "resources/list")]
    ListResourcesRequest(RequestOptionalParam<ListResourcesMethod, PaginatedRequestParam>),
    #[serde(rename = "resources/templates/list")]
    ListResourceTemplatesRequest(
        RequestOptionalParam<ListResourceTemplatesMethod, PaginatedRequestParam>,
    ),
    #[serde(rename = "resources/read")]
    ReadResourceRequest(Request<ReadResourceMethod, ReadResourceRequestParam>),
    #[serde(rename = "resources/subscribe")]
    SubscribeRequest(Request<SubscribeMethod, SubscribeRequestParam>),
    #[serde(rename = "resources/unsubscribe")]
    UnsubscribeRequest(Request<UnsubscribeMethod, UnsubscribeRequestParam>),
    #[serde(rename = "completion/complete")]
    CompleteRequest(Request<CompleteMethod, CompleteRequestParam>),
    #[serde(rename = "logging/setLevel")]
    SetLevelRequest(Request<SetLevelMethod, SetLevelRequestParam>),
    #[serde(rename = "tasks/get")]
    GetTaskRequest(Request<GetTaskMethod, GetTaskRequestParam>),
    #[serde(rename = "tasks/result")]
    GetTaskResultRequest(Request<GetTaskResultMethod, GetTaskResultRequestParam>),
    #[serde(rename = "tasks/list")]
    ListTasksRequest(RequestOptionalParam<ListTasksMethod, PaginatedRequestParam>),
    #[serde(rename = "tasks/cancel")]
    CancelTaskRequest(Request<CancelTaskMethod, CancelTaskRequestParam>),
}

impl ClientRequest {
    /// The in-memory `Extensions` carried by whichever variant's `Request`
    /// wrapper this is - where a deserialized `_meta` object lands (see
    /// `model::serde_impl`).
    pub fn extensions(&self) -> &Extensions {
        match self {
            ClientRequest::InitializeRequest(r) => &r.extensions,
            ClientRequest::PingRequest(r) => &r.extensions,
            ClientRequest::ListToolsRequest(r) => &r.extensions,
            ClientRequest::CallToolRequest(r) => &r.extensions,
            ClientRequest::ListPromptsRequest(r) => &r.extensions,
            ClientRequest::GetPromptRequest(r) => &r.extensions,
            ClientRequest::ListResourcesRequest(r) => &r.extensions,
            ClientRequest::ListResourceTemplatesRequest(r) => &r.extensions,
            ClientRequest::ReadResourceRequest(r) => &r.extensions,
            ClientRequest::SubscribeRequest(r) => &r.extensions,
            ClientRequest::UnsubscribeRequest(r) => &r.extensions,
            ClientRequest::CompleteRequest(r) => &r.extensions,
            ClientRequest::SetLevelRequest(r) => &r.extensions,
            ClientRequest::GetTaskRequest(r) => &r.extensions,
            ClientRequest::GetTaskResultRequest(r) => &r.extensions,
            ClientRequest::ListTasksRequest(r) => &r.extensions,
            ClientRequest::CancelTaskRequest(r) => &r.extensions,
        }
    }
}

/// A request a server may send to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ServerRequest {
    #[serde(rename = "ping")]
    PingRequest(RequestNoParam<PingMethod>),
    #[serde(rename = "roots/list")]
    ListRootsRequest(RequestNoParam<ListRootsMethod>),
    #[serde(rename = "sampling/createMessage")]
    CreateMessageRequest(Request<CreateMessageMethod, CreateMessageRequestParam>),
    #[serde(rename = "elicitation/create")]
    CreateElicitationRequest(Request<CreateElicitationMethod, CreateElicitationRequestParam>),
}

impl ServerRequest {
    pub fn extensions(&self) -> &Extensions {
        match self {
            ServerRequest::PingRequest(r) => &r.extensions,
            ServerRequest::ListRootsRequest(r) => &r.extensions,
            ServerRequest::CreateMessageRequest(r) => &r.extensions,
            ServerRequest::CreateElicitationRequest(r) => &r.extensions,
        }
    }
}

/// A notification a client may send to a server, or vice versa; both
/// directions share the same wire vocabulary for cancellation/progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ClientNotification {
    #[serde(rename = "notifications/initialized")]
    InitializedNotification(NotificationNoParam<InitializedNotificationMethod>),
    #[serde(rename = "notifications/cancelled")]
    CancelledNotification(Notification<CancelledNotificationMethod, CancelledNotificationParam>),
    #[serde(rename = "notifications/progress")]
    ProgressNotification(Notification<ProgressNotificationMethod, ProgressNotificationParam>),
    #[serde(rename = "notifications/roots/list_changed")]
    RootsListChangedNotification(NotificationNoParam<RootsListChangedNotificationMethod>),
}

impl ClientNotification {
    /// The request id this cancels, if this is a `notifications/cancelled`.
    pub fn cancelled_request_id(&self) -> Option<&RequestId> {
        match self {
            ClientNotification::CancelledNotification(n) => Some(&n.params.request_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ServerNotification {
    #[serde(rename = "notifications/cancelled")]
    CancelledNotification(Notification<CancelledNotificationMethod, CancelledNotificationParam>),
    #[serde(rename = "notifications/progress")]
    ProgressNotification(Notification<ProgressNotificationMethod, ProgressNotificationParam>),
    #[serde(rename = "notifications/message")]
    LoggingMessageNotification(
        Notification<LoggingMessageNotificationMethod, LoggingMessageNotificationParam>,
    ),
    #[serde(rename = "notifications/tools/list_changed")]
    ToolListChangedNotification(NotificationNoParam<ToolListChangedNotificationMethod>),
    #[serde(rename = "notifications/prompts/list_changed")]
    PromptListChangedNotification(NotificationNoParam<PromptListChangedNotificationMethod>),
    #[serde(rename = "notifications/resources/list_changed")]
    ResourceListChangedNotification(NotificationNoParam<ResourceListChangedNotificationMethod>),
    #[serde(rename = "notifications/resources/updated")]
    ResourceUpdatedNotification(
        Notification<ResourceUpdatedNotificationMethod, ResourceUpdatedNotificationParam>,
    ),
    #[serde(rename = "notifications/tasks/status")]
    TaskStatusNotification(Notification<TaskStatusNotificationMethod, TaskStatusNotificationParam>),
}

impl ServerNotification {
    /// The request id this cancels, if this is a `notifications/cancelled`.
    pub fn cancelled_request_id(&self) -> Option<&RequestId> {
        match self {
            ServerNotification::CancelledNotification(n) => Some(&n.params.request_id),
            _ => None,
        }
    }
}

/// The result a client sends back for a server-initiated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientResult {
    CreateMessageResult(CreateMessageResult),
    CreateElicitationResult(CreateElicitationResult),
    ListRootsResult(ListRootsResult),
    EmptyResult(EmptyResult),
}

/// The result a server sends back for a client-initiated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerResult {
    InitializeResult(InitializeResult),
    ListToolsResult(ListToolsResult),
    CallToolResult(CallToolResult),
    ListPromptsResult(ListPromptsResult),
    GetPromptResult(GetPromptResult),
    ListResourcesResult(ListResourcesResult),
    ListResourceTemplatesResult(ListResourceTemplatesResult),
    ReadResourceResult(ReadResourceResult),
    CompleteResult(CompleteResult),
    TaskStatusResult(TaskStatusResult),
    TaskResult(TaskResult),
    ListTasksResult(ListTasksResult),
    EmptyResult(EmptyResult),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyResult {}

macro_rules! method_marker {
    ($($name:ident = $value:literal),* $(,)?) => {
        $(const_string!($name = $value);)*
    };
}

method_marker! {
    InitializeMethod = "initialize",
    PingMethod = "ping",
    ListToolsMethod = "tools/list",
    CallToolMethod = "tools/call",
    ListPromptsMethod = "prompts/list",
    GetPromptMethod = "prompts/get",
    ListResourcesMethod = "resources/list",
    ListResourceTemplatesMethod = "resources/templates/list",
    ReadResourceMethod = "resources/read",
    SubscribeMethod = "resources/subscribe",
    UnsubscribeMethod = "resources/unsubscribe",
    CompleteMethod = "completion/complete",
    SetLevelMethod = "logging/setLevel",
    ListRootsMethod = "roots/list",
    CreateMessageMethod = "sampling/createMessage",
    CreateElicitationMethod = "elicitation/create",
    GetTaskMethod = "tasks/get",
    GetTaskResultMethod = "tasks/result",
    ListTasksMethod = "tasks/list",
    CancelTaskMethod = "tasks/cancel",
    InitializedNotificationMethod = "notifications/initialized",
    CancelledNotificationMethod = "notifications/cancelled",
    ProgressNotificationMethod = "notifications/progress",
    RootsListChangedNotificationMethod = "notifications/roots/list_changed",
    LoggingMessageNotificationMethod = "notifications/message",
    ToolListChangedNotificationMethod = "notifications/tools/list_changed",
    PromptListChangedNotificationMethod = "notifications/prompts/list_changed",
    ResourceListChangedNotificationMethod = "notifications/resources/list_changed",
    ResourceUpdatedNotificationMethod = "notifications/resources/updated",
    TaskStatusNotificationMethod = "notifications/tasks/status",
}

// Per-method struct aliases, one per `ClientRequest`/`ServerRequest`/
// `ClientNotification`/`ServerNotification` variant payload. Handler and
// service code names these directly (e.g. `CallToolRequest`) rather than
// spelling out `Request<CallToolMethod, CallToolRequestParam>` every time.
pub type InitializeRequest = Request<InitializeMethod, InitializeRequestParam>;
pub type PingRequest = RequestNoParam<PingMethod>;
pub type ListToolsRequest = RequestOptionalParam<ListToolsMethod, PaginatedRequestParam>;
pub type CallToolRequest = Request<CallToolMethod, CallToolRequestParam>;
pub type ListPromptsRequest = RequestOptionalParam<ListPromptsMethod, PaginatedRequestParam>;
pub type GetPromptRequest = Request<GetPromptMethod, GetPromptRequestParam>;
pub type ListResourcesRequest = RequestOptionalParam<ListResourcesMethod, PaginatedRequestParam>;
pub type ListResourceTemplatesRequest =
    RequestOptionalParam<ListResourceTemplatesMethod, PaginatedRequestParam>;
pub type ReadResourceRequest = Request<ReadResourceMethod, ReadResourceRequestParam>;
pub type SubscribeRequest = Request<SubscribeMethod, SubscribeRequestParam>;
pub type UnsubscribeRequest = Request<UnsubscribeMethod, UnsubscribeRequestParam>;
pub type CompleteRequest = Request<CompleteMethod, CompleteRequestParam>;
pub type SetLevelRequest = Request<SetLevelMethod, SetLevelRequestParam>;
pub type GetTaskRequest = Request<GetTaskMethod, GetTaskRequestParam>;
pub type GetTaskResultRequest = Request<GetTaskResultMethod, GetTaskResultRequestParam>;
pub type ListTasksRequest = RequestOptionalParam<ListTasksMethod, PaginatedRequestParam>;
pub type CancelTaskRequest = Request<CancelTaskMethod, CancelTaskRequestParam>;
pub type ListRootsRequest = RequestNoParam<ListRootsMethod>;
pub type CreateMessageRequest = Request<CreateMessageMethod, CreateMessageRequestParam>;
pub type CreateElicitationRequest = Request<CreateElicitationMethod, CreateElicitationRequestParam>;

pub type InitializedNotification = NotificationNoParam<InitializedNotificationMethod>;
pub type CancelledNotification =
    Notification<CancelledNotificationMethod, CancelledNotificationParam>;
pub type ProgressNotification =
    Notification<ProgressNotificationMethod, ProgressNotificationParam>;
pub type RootsListChangedNotification = NotificationNoParam<RootsListChangedNotificationMethod>;
pub type LoggingMessageNotification =
    Notification<LoggingMessageNotificationMethod, LoggingMessageNotificationParam>;
pub type ToolListChangedNotification = NotificationNoParam<ToolListChangedNotificationMethod>;
pub type PromptListChangedNotification = NotificationNoParam<PromptListChangedNotificationMethod>;
pub type ResourceListChangedNotification =
    NotificationNoParam<ResourceListChangedNotificationMethod>;
pub type ResourceUpdatedNotification =
    Notification<ResourceUpdatedNotificationMethod, ResourceUpdatedNotificationParam>;
pub type TaskStatusNotification =
    Notification<TaskStatusNotificationMethod, TaskStatusNotificationParam>;

/// The wire message types flowing client -> server and their mirrors.
pub type ClientJsonRpcMessage = JsonRpcMessage<ClientRequest, ClientResult, ClientNotification>;
pub type ServerJsonRpcMessage = JsonRpcMessage<ServerRequest, ServerResult, ServerNotification>;

/// The message type a [`crate::service::ServiceRole`] sends on the wire.
pub type TxJsonRpcMessage<R> = JsonRpcMessage<
    <R as crate::service::ServiceRole>::Req,
    <R as crate::service::ServiceRole>::Resp,
    <R as crate::service::ServiceRole>::Not,
>;
/// The message type a [`crate::service::ServiceRole`] receives on the wire.
pub type RxJsonRpcMessage<R> = JsonRpcMessage<
    <R as crate::service::ServiceRole>::PeerReq,
    <R as crate::service::ServiceRole>::PeerResp,
    <R as crate::service::ServiceRole>::PeerNot,
>;

/// Generic helper used by handlers that want to deserialize a request's
/// `arguments`/`params` object into a concrete type, matching the MCP
/// convention that an absent object behaves like `{}`.
pub fn deserialize_params<T: DeserializeOwned>(
    params: Option<JsonObject>,
) -> Result<T, ErrorData> {
    let value = params.map(Value::Object).unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(value)
        .map_err(|e| ErrorData::invalid_params(format!("invalid params: {e}"), None))
}
