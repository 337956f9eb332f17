//! What server-side application code implements: answers to client-initiated
//! requests (tools, prompts, resources, completion, tasks) and hooks for
//! client notifications.
//!
//! Every method has a reasonable default - an empty list, a "not found"
//! error, or a no-op - so a minimal server only overrides what it actually
//! serves. Servers built with the `#[tool_router]`/`#[prompt_router]` macros
//! override [`ServerHandler::call_tool`]/[`ServerHandler::get_prompt`] (and
//! friends) to delegate to a [`router::ToolRouter`]/[`router::PromptRouter`]/
//! [`router::ResourceRouter`] field instead of answering directly.

pub mod completion;
pub mod prompt;
pub mod resource;
pub mod router;
pub mod tool;
pub mod wrapper;

pub(crate) mod common;

use crate::{
    ErrorData,
    model::{
        CallToolRequestParam, CallToolResult, CancelTaskRequestParam, CancelledNotificationParam,
        CompleteRequestParam, CompleteResult, GetPromptRequestParam, GetPromptResult,
        GetTaskRequestParam, GetTaskResultRequestParam, Implementation, ListPromptsResult,
        ListResourceTemplatesResult, ListResourcesResult, ListTasksResult, ListToolsResult,
        PaginatedRequestParam, ProgressNotificationParam, ReadResourceRequestParam,
        ReadResourceResult, ServerInfo, SetLevelRequestParam, SubscribeRequestParam,
        TaskResult, TaskStatusResult, UnsubscribeRequestParam,
    },
    service::{NotificationContext, RequestContext, RoleServer, Service},
};

/// Implemented by server-side application code. See the module docs for how
/// this relates to the routers in [`router`].
pub trait ServerHandler: Send + Sync + 'static {
    fn ping(
        &self,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<(), ErrorData>> + Send {
        async { Ok(()) }
    }

    fn list_tools(
        &self,
        _params: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send {
        async { Ok(ListToolsResult::default()) }
    }

    fn call_tool(
        &self,
        _params: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send {
        async { Err(ErrorData::method_not_found("tools/call", None)) }
    }

    fn list_prompts(
        &self,
        _params: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListPromptsResult, ErrorData>> + Send {
        async { Ok(ListPromptsResult::default()) }
    }

    fn get_prompt(
        &self,
        _params: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<GetPromptResult, ErrorData>> + Send {
        async { Err(ErrorData::invalid_params("prompt not found", None)) }
    }

    fn list_resources(
        &self,
        _params: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, ErrorData>> + Send {
        async { Ok(ListResourcesResult::default()) }
    }

    fn list_resource_templates(
        &self,
        _params: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourceTemplatesResult, ErrorData>> + Send {
        async { Ok(ListResourceTemplatesResult::default()) }
    }

    fn read_resource(
        &self,
        params: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, ErrorData>> + Send {
        async move { Err(ErrorData::resource_not_found(params.uri, None)) }
    }

    fn subscribe(
        &self,
        _params: SubscribeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<(), ErrorData>> + Send {
        async { Ok(()) }
    }

    fn unsubscribe(
        &self,
        _params: UnsubscribeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<(), ErrorData>> + Send {
        async { Ok(()) }
    }

    fn complete(
        &self,
        _params: CompleteRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CompleteResult, ErrorData>> + Send {
        async { Err(ErrorData::method_not_found("completion/complete", None)) }
    }

    fn set_level(
        &self,
        _params: SetLevelRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<(), ErrorData>> + Send {
        async { Ok(()) }
    }

    fn get_task(
        &self,
        params: GetTaskRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<TaskStatusResult, ErrorData>> + Send {
        async move { Err(ErrorData::invalid_params(format!("unknown task: {}", params.task_id), None)) }
    }

    fn get_task_result(
        &self,
        params: GetTaskResultRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<TaskResult, ErrorData>> + Send {
        async move { Err(ErrorData::invalid_params(format!("unknown task: {}", params.task_id), None)) }
    }

    fn list_tasks(
        &self,
        _params: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListTasksResult, ErrorData>> + Send {
        async { Ok(ListTasksResult::default()) }
    }

    fn cancel_task(
        &self,
        params: CancelTaskRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<TaskStatusResult, ErrorData>> + Send {
        async move { Err(ErrorData::invalid_params(format!("unknown task: {}", params.task_id), None)) }
    }

    fn on_initialized(&self, _context: NotificationContext<RoleServer>) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_cancelled(
        &self,
        _params: CancelledNotificationParam,
        _context: NotificationContext<RoleServer>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_progress(
        &self,
        _params: ProgressNotificationParam,
        _context: NotificationContext<RoleServer>,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_roots_list_changed(&self, _context: NotificationContext<RoleServer>) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: crate::model::SUPPORTED_PROTOCOL_VERSIONS[0].to_string(),
            capabilities: Default::default(),
            server_info: Implementation::from_build_env(),
            instructions: None,
        }
    }
}

impl<H: ServerHandler> Service<RoleServer> for H {
    async fn handle_request(
        &self,
        request: crate::model::ClientRequest,
        context: RequestContext<RoleServer>,
    ) -> Result<crate::model::ServerResult, ErrorData> {
        use crate::model::{ClientRequest, ServerResult};

        match request {
            ClientRequest::InitializeRequest(_) => Err(ErrorData::invalid_request(
                "already initialized",
                None,
            )),
            ClientRequest::PingRequest(_) => {
                self.ping(context).await?;
                Ok(ServerResult::EmptyResult(Default::default()))
            }
            ClientRequest::ListToolsRequest(req) => self
                .list_tools(req.params, context)
                .await
                .map(ServerResult::ListToolsResult),
            ClientRequest::CallToolRequest(req) => self
                .call_tool(req.params, context)
                .await
                .map(ServerResult::CallToolResult),
            ClientRequest::ListPromptsRequest(req) => self
                .list_prompts(req.params, context)
                .await
                .map(ServerResult::ListPromptsResult),
            ClientRequest::GetPromptRequest(req) => self
                .get_prompt(req.params, context)
                .await
                .map(ServerResult::GetPromptResult),
            ClientRequest::ListResourcesRequest(req) => self
                .list_resources(req.params, context)
                .await
                .map(ServerResult::ListResourcesResult),
            ClientRequest::ListResourceTemplatesRequest(req) => self
                .list_resource_templates(req.params, context)
                .await
                .map(ServerResult::ListResourceTemplatesResult),
            ClientRequest::ReadResourceRequest(req) => self
                .read_resource(req.params, context)
                .await
                .map(ServerResult::ReadResourceResult),
            ClientRequest::SubscribeRequest(req) => {
                self.subscribe(req.params, context).await?;
                Ok(ServerResult::EmptyResult(Default::default()))
            }
            ClientRequest::UnsubscribeRequest(req) => {
                self.unsubscribe(req.params, context).await?;
                Ok(ServerResult::EmptyResult(Default::default()))
            }
            ClientRequest::CompleteRequest(req) => self
                .complete(req.params, context)
                .await
                .map(ServerResult::CompleteResult),
            ClientRequest::SetLevelRequest(req) => {
                self.set_level(req.params, context).await?;
                Ok(ServerResult::EmptyResult(Default::default()))
            }
            ClientRequest::GetTaskRequest(req) => self
                .get_task(req.params, context)
                .await
                .map(ServerResult::TaskStatusResult),
            ClientRequest::GetTaskResultRequest(req) => self
                .get_task_result(req.params, context)
                .await
                .map(ServerResult::TaskResult),
            ClientRequest::ListTasksRequest(req) => self
                .list_tasks(req.params, context)
                .await
                .map(ServerResult::ListTasksResult),
            ClientRequest::CancelTaskRequest(req) => self
                .cancel_task(req.params, context)
                .await
                .map(ServerResult::TaskStatusResult),
        }
    }

    async fn handle_notification(
        &self,
        notification: crate::model::ClientNotification,
        context: NotificationContext<RoleServer>,
    ) {
        use crate::model::ClientNotification;

        match notification {
            ClientNotification::InitializedNotification(_) => self.on_initialized(context).await,
            ClientNotification::CancelledNotification(n) => self.on_cancelled(n.params, context).await,
            ClientNotification::ProgressNotification(n) => self.on_progress(n.params, context).await,
            ClientNotification::RootsListChangedNotification(_) => {
                self.on_roots_list_changed(context).await
            }
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerHandler::get_info(self)
    }
}
