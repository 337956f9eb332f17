//! [`SessionManager`] for stateless mode: every call fails, since stateless
//! mode never routes through session state at all (see
//! `StreamableHttpServerConfig::stateful_mode` and the service's stateless
//! POST handling, which never consults the session manager).

use std::convert::Infallible;

use futures::Stream;

use super::{ServerSseMessage, SessionId, SessionManager};
use crate::{
    RoleServer,
    model::{ClientJsonRpcMessage, ServerJsonRpcMessage},
    transport::Transport,
};

/// A [`Transport`] that never yields anything - `NeverSessionManager` never
/// actually constructs one, but the associated type still needs a concrete
/// inhabitant.
pub struct NeverTransport(Infallible);

impl Transport<RoleServer> for NeverTransport {
    type Error = Infallible;

    async fn send(&mut self, _item: ServerJsonRpcMessage) -> Result<(), Self::Error> {
        match self.0 {}
    }

    async fn receive(&mut self) -> Option<ClientJsonRpcMessage> {
        match self.0 {}
    }
}

/// Rejects every session operation. Plug in when
/// [`StreamableHttpServerConfig::stateful_mode`](super::super::StreamableHttpServerConfig)
/// is `false` and the service is never expected to touch session state.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverSessionManager;

impl SessionManager for NeverSessionManager {
    type Error = std::io::Error;
    type Transport = NeverTransport;

    async fn create_session(&self) -> Result<(SessionId, Self::Transport), Self::Error> {
        Err(std::io::Error::other("sessions are disabled"))
    }

    async fn initialize_session(
        &self,
        _id: &SessionId,
        _message: ClientJsonRpcMessage,
    ) -> Result<ServerJsonRpcMessage, Self::Error> {
        Err(std::io::Error::other("sessions are disabled"))
    }

    async fn has_session(&self, _id: &SessionId) -> Result<bool, Self::Error> {
        Ok(false)
    }

    async fn close_session(&self, _id: &SessionId) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn create_stream(
        &self,
        _id: &SessionId,
        _message: ClientJsonRpcMessage,
    ) -> Result<impl Stream<Item = ServerSseMessage> + Send + Sync + 'static, Self::Error> {
        Err::<futures::stream::Empty<ServerSseMessage>, _>(std::io::Error::other(
            "sessions are disabled",
        ))
    }

    async fn accept_message(
        &self,
        _id: &SessionId,
        _message: ClientJsonRpcMessage,
    ) -> Result<(), Self::Error> {
        Err(std::io::Error::other("sessions are disabled"))
    }

    async fn create_standalone_stream(
        &self,
        _id: &SessionId,
    ) -> Result<impl Stream<Item = ServerSseMessage> + Send + Sync + 'static, Self::Error> {
        Err::<futures::stream::Empty<ServerSseMessage>, _>(std::io::Error::other(
            "sessions are disabled",
        ))
    }

    async fn resume(
        &self,
        _id: &SessionId,
        _last_event_id: String,
    ) -> Result<impl Stream<Item = ServerSseMessage> + Send + Sync + 'static, Self::Error> {
        Err::<futures::stream::Empty<ServerSseMessage>, _>(std::io::Error::other(
            "sessions are disabled",
        ))
    }
}
