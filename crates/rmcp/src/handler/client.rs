//! What client-side user code implements: answers to server-initiated
//! requests (sampling, elicitation, roots) and hooks for server
//! notifications.

use crate::{
    ErrorData,
    model::{
        CancelledNotificationParam, ClientInfo, ClientResult, CreateElicitationRequestParam,
        CreateElicitationResult, CreateMessageRequestParam, CreateMessageResult, EmptyResult,
        ListRootsResult, LoggingMessageNotificationParam, ProgressNotificationParam,
        ResourceUpdatedNotificationParam, ServerNotification, ServerRequest,
        TaskStatusNotificationParam,
    },
    service::{NotificationContext, RequestContext, RoleClient, Service},
};

/// Implemented by client-side application code. Every method has a
/// reasonable default (decline the capability / ignore the notification)
/// so a minimal client only overrides what it actually supports.
pub trait ClientHandler: Send + Sync + 'static {
    fn ping(
        &self,
        _context: RequestContext<RoleClient>,
    ) -> impl Future<Output = Result<(), ErrorData>> + Send {
        async { Ok(()) }
    }

    fn create_message(
        &self,
        _params: CreateMessageRequestParam,
        _context: RequestContext<RoleClient>,
    ) -> impl Future<Output = Result<CreateMessageResult, ErrorData>> + Send {
        async { Err(ErrorData::method_not_found("sampling/createMessage", None)) }
    }

    fn create_elicitation(
        &self,
        _params: CreateElicitationRequestParam,
        _context: RequestContext<RoleClient>,
    ) -> impl Future<Output = Result<CreateElicitationResult, ErrorData>> + Send {
        async { Err(ErrorData::method_not_found("elicitation/create", None)) }
    }

    fn list_roots(
        &self,
        _context: RequestContext<RoleClient>,
    ) -> impl Future<Output = Result<ListRootsResult, ErrorData>> + Send {
        async { Ok(ListRootsResult::default()) }
    }

    fn on_cancelled(
        &self,
        _params: CancelledNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_progress(
        &self,
        _params: ProgressNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_logging_message(
        &self,
        _params: LoggingMessageNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_resource_updated(
        &self,
        _params: ResourceUpdatedNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_resource_list_changed(
        &self,
        _context: NotificationContext<RoleClient>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_tool_list_changed(
        &self,
        _context: NotificationContext<RoleClient>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_prompt_list_changed(
        &self,
        _context: NotificationContext<RoleClient>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_task_status(
        &self,
        _params: TaskStatusNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn get_info(&self) -> ClientInfo {
        ClientInfo {
            protocol_version: crate::model::SUPPORTED_PROTOCOL_VERSIONS[0].to_string(),
            capabilities: Default::default(),
            client_info: crate::model::Implementation::from_build_env(),
        }
    }
}

/// A client that declines every peer-initiated request and ignores every
/// notification - every method above already has that default, so there is
/// nothing to override.
impl ClientHandler for () {}

impl<H: ClientHandler> Service<RoleClient> for H {
    async fn handle_request(
        &self,
        request: ServerRequest,
        context: RequestContext<RoleClient>,
    ) -> Result<ClientResult, ErrorData> {
        match request {
            ServerRequest::PingRequest(_) => {
                self.ping(context).await?;
                Ok(ClientResult::EmptyResult(EmptyResult::default()))
            }
            ServerRequest::ListRootsRequest(_) => self
                .list_roots(context)
                .await
                .map(ClientResult::ListRootsResult),
            ServerRequest::CreateMessageRequest(req) => self
                .create_message(req.params, context)
                .await
                .map(ClientResult::CreateMessageResult),
            ServerRequest::CreateElicitationRequest(req) => self
                .create_elicitation(req.params, context)
                .await
                .map(ClientResult::CreateElicitationResult),
        }
    }

    async fn handle_notification(
        &self,
        notification: ServerNotification,
        context: NotificationContext<RoleClient>,
    ) {
        match notification {
            ServerNotification::CancelledNotification(n) => {
                self.on_cancelled(n.params, context).await
            }
            ServerNotification::ProgressNotification(n) => {
                self.on_progress(n.params, context).await
            }
            ServerNotification::LoggingMessageNotification(n) => {
                self.on_logging_message(n.params, context).await
            }
            ServerNotification::ResourceUpdatedNotification(n) => {
                self.on_resource_updated(n.params, context).await
            }
            ServerNotification::ResourceListChangedNotification(_) => {
                self.on_resource_list_changed(context).await
            }
            ServerNotification::ToolListChangedNotification(_) => {
                self.on_tool_list_changed(context).await
            }
            ServerNotification::PromptListChangedNotification(_) => {
                self.on_prompt_list_changed(context).await
            }
            ServerNotification::TaskStatusNotification(n) => {
                self.on_task_status(n.params, context).await
            }
        }
    }

    fn get_info(&self) -> ClientInfo {
        ClientHandler::get_info(self)
    }
}
