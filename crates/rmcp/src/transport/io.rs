//! The stdio transport: talk MCP over the process's own stdin/stdout, one
//! JSON-RPC message per line. This is what a locally spawned MCP server
//! normally uses, and what [`child_process`](super::child_process) expects
//! on the other end of the pipe.

use tokio::io::{Stdin, Stdout, stdin, stdout};

use super::async_rw::into_transport;

/// Returns the process's stdin/stdout as an MCP transport, ready to hand to
/// [`crate::serve_server`]/[`crate::serve_client`] - the returned
/// `(Sink, Stream)` pair satisfies [`super::IntoTransport`]'s blanket impl.
///
/// stdout is shared process-wide: anything else writing to it (a `println!`
/// in handler code, say) will corrupt the stream.
pub fn stdio<Rx, Tx>() -> (
    impl futures::Sink<Tx, Error = std::io::Error> + Send,
    impl futures::Stream<Item = Rx> + Send,
)
where
    Rx: serde::de::DeserializeOwned + Send + 'static,
    Tx: serde::Serialize + Send + 'static,
{
    into_transport::<Stdin, Stdout, Rx, Tx>(stdin(), stdout())
}
