//! Turns any `AsyncRead`/`AsyncWrite` pair into the newline-delimited-JSON
//! transport the stdio and child-process transports both build on: one JSON-RPC
//! message per line, exactly as the MCP stdio transport requires.

use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

/// Frames `reader`/`writer` as a transport carrying `Rx`/`Tx` messages, one
/// per line. Malformed or unreadable lines are logged and skipped rather
/// than tearing down the stream - a misbehaving peer shouldn't take the
/// whole connection down over a single bad line.
pub fn into_transport<R, W, Rx, Tx>(
    reader: R,
    writer: W,
) -> (
    impl Sink<Tx, Error = std::io::Error> + Send,
    impl Stream<Item = Rx> + Send,
)
where
    R: AsyncRead + Send + 'static,
    W: AsyncWrite + Send + 'static,
    Rx: DeserializeOwned + Send + 'static,
    Tx: Serialize + Send + 'static,
{
    let stream = FramedRead::new(reader, LinesCodec::new()).filter_map(|line| async move {
        match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => match serde_json::from_str(&line) {
                Ok(message) => Some(message),
                Err(error) => {
                    tracing::error!(%error, %line, "failed to deserialize incoming JSON-RPC message");
                    None
                }
            },
            Err(error) => {
                tracing::error!(%error, "error reading from transport");
                None
            }
        }
    });

    let sink = FramedWrite::new(writer, LinesCodec::new())
        .sink_map_err(line_codec_error_to_io)
        .with(|message: Tx| async move {
            serde_json::to_string(&message).map_err(std::io::Error::other)
        });

    (sink, stream)
}

fn line_codec_error_to_io(error: LinesCodecError) -> std::io::Error {
    match error {
        LinesCodecError::Io(error) => error,
        LinesCodecError::MaxLineLengthExceeded => {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "line too long")
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::{SinkExt, StreamExt};

    use super::*;
    use crate::{
        RoleServer,
        model::{RxJsonRpcMessage, TxJsonRpcMessage},
    };

    #[tokio::test]
    async fn round_trips_one_message_per_line() {
        let (client, server) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client);
        let (server_read, server_write) = tokio::io::split(server);

        let (mut client_sink, _client_stream): (
            _,
            std::pin::Pin<Box<dyn Stream<Item = RxJsonRpcMessage<RoleServer>> + Send>>,
        ) = {
            let (sink, stream) = into_transport::<_, _, RxJsonRpcMessage<RoleServer>, TxJsonRpcMessage<RoleServer>>(
                client_read,
                client_write,
            );
            (sink, Box::pin(stream))
        };
        let (_server_sink, mut server_stream): (
            std::pin::Pin<Box<dyn Sink<TxJsonRpcMessage<RoleServer>, Error = std::io::Error> + Send>>,
            _,
        ) = {
            let (sink, stream) = into_transport::<_, _, RxJsonRpcMessage<RoleServer>, TxJsonRpcMessage<RoleServer>>(
                server_read,
                server_write,
            );
            (Box::pin(sink), stream)
        };

        use crate::model::{ClientNotification, JsonRpcMessage};
        let message: TxJsonRpcMessage<RoleServer> =
            JsonRpcMessage::notification(ClientNotification::InitializedNotification(Default::default()));

        client_sink.send(message).await.unwrap();
        let received = server_stream.next().await.unwrap();
        match received {
            JsonRpcMessage::Notification(_) => {}
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
