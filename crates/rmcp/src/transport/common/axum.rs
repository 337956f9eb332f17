//! Small response-building helpers shared by the Streamable HTTP and legacy
//! SSE server transports' axum adapters
//! ([`super::super::streamable_http_server::axum`],
//! [`super::super::sse_server::axum_impl`]).

use axum::{
    body::Body,
    http::{HeaderValue, Response, StatusCode, header},
};

use super::http_header::{EVENT_STREAM_MIME_TYPE, HEADER_SESSION_ID, HEADER_X_ACCEL_BUFFERING};

/// Wraps `body` as a `text/event-stream` response with the headers both
/// server transports send on every SSE response: no caching, and
/// `X-Accel-Buffering: no` so a reverse proxy doesn't buffer the stream.
pub fn sse_response(body: Body, session_id: Option<&str>) -> Response<Body> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, EVENT_STREAM_MIME_TYPE)
        .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
        .header(HEADER_X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    if let Some(session_id) = session_id {
        builder = builder.header(HEADER_SESSION_ID, session_id);
    }
    builder.body(body).unwrap_or_else(|e| {
        let mut response = Response::new(Body::from(e.to_string()));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}
