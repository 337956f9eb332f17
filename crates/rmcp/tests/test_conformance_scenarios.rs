//cargo test --test test_conformance_scenarios --features "server client"
//
// Exercises the E1-E4 scenarios end to end: a real session kernel on both
// ends, talking JSON-RPC over an in-memory `tokio::io::duplex`. E5 (resume
// after disconnect) and E6 (wrong-session resume) are Streamable HTTP
// session-manager properties and live in `test_sse_concurrent_streams.rs`
// alongside the rest of that transport's tests instead.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rmcp::model::{
    CallToolRequest, CallToolRequestParam, CallToolResult, CancelledNotificationParam, Content,
    GetTaskResultRequest, GetTaskResultRequestParam, Implementation, ListToolsResult, Meta,
    ProgressNotificationParam, ProgressToken, RequestId, ServerCapabilities, ServerInfo,
    ServerResult, TaskHandle, TaskMetadata, TaskResult, TaskStatus, Tool, ToolExecution,
};
use rmcp::service::{NotificationContext, RequestContext};
use rmcp::task_manager::{TaskManager, TaskStoreConfig, parse_iso8601_duration};
use rmcp::{ClientHandler, ErrorData, RoleClient, RoleServer, ServerHandler, ServiceExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Server backing E1/E2/E4: `echo` answers synchronously, `prog` emits
/// progress before answering, `slow` dispatches through the task subsystem.
struct ConformanceServer {
    tasks: Arc<TaskManager>,
    prog_steps: u32,
}

impl ConformanceServer {
    fn new() -> Self {
        Self {
            tasks: TaskManager::new(CancellationToken::new(), TaskStoreConfig::default()),
            prog_steps: 3,
        }
    }
}

impl ServerHandler for ConformanceServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: rmcp::model::LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities::builder().enable_tools().enable_tasks(true, true).build(),
            server_info: Implementation {
                name: "conformance-server".to_string(),
                title: None,
                version: "1.0.0".to_string(),
            },
            instructions: None,
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send {
        let schema = Arc::new(serde_json::json!({"type": "object"}).as_object().unwrap().clone());
        async move {
            let mut slow = Tool::new("slow", "Runs as a background task", schema.clone());
            slow.execution = Some(ToolExecution::required());
            Ok(ListToolsResult {
                tools: vec![Tool::new("echo", "Echoes a message back", schema), slow],
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            match params.name.as_ref() {
                "echo" => {
                    let message = params
                        .arguments
                        .as_ref()
                        .and_then(|a| a.get("message"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    Ok(CallToolResult::success(vec![Content::text(format!("Echo: {message}"))]))
                }
                "prog" => {
                    if let Some(token) = context.meta.progress_token() {
                        for i in 0..self.prog_steps {
                            let _ = context
                                .peer
                                .notify_progress(ProgressNotificationParam {
                                    progress_token: token.clone(),
                                    progress: i,
                                    total: Some(self.prog_steps),
                                    message: None,
                                })
                                .await;
                        }
                    }
                    Ok(CallToolResult::success(vec![Content::text("done")]))
                }
                "slow" => {
                    // `slow` is advertised with `ToolExecution::required()`, so a
                    // call with no `_meta.task` is invalid params rather than an
                    // implicit synchronous dispatch - this handler is called
                    // directly rather than through `ToolRouter::call`, so it has
                    // to repeat that enforcement itself.
                    let task_meta = context
                        .meta
                        .task()
                        .ok_or_else(|| ErrorData::invalid_params("tool `slow` requires task execution (_meta.task)", None))?;
                    let ttl = task_meta.time_to_live.as_deref().and_then(parse_iso8601_duration);
                    let (task_id, ct) = self.tasks.create(ttl).await;
                    self.tasks.attach_peer(context.peer.clone());

                    let tasks = self.tasks.clone();
                    let job_id = task_id.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = ct.cancelled() => {}
                            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                                tasks
                                    .complete(
                                        &job_id,
                                        TaskResult::CallTool(CallToolResult::success(vec![Content::text(
                                            "slow job finished",
                                        )])),
                                    )
                                    .await;
                            }
                        }
                    });

                    Ok(CallToolResult {
                        content: vec![],
                        structured_content: None,
                        is_error: None,
                        task: Some(TaskHandle {
                            task_id,
                            status: TaskStatus::Working,
                            poll_interval: Some(50),
                        }),
                    })
                }
                other => Err(ErrorData::invalid_params(format!("unknown tool: {other}"), None)),
            }
        }
    }

    fn get_task_result(
        &self,
        params: GetTaskResultRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<TaskResult, ErrorData>> + Send + '_ {
        async move {
            let task = self
                .tasks
                .wait_for_result(&params.task_id)
                .await
                .ok_or_else(|| ErrorData::invalid_params(format!("unknown task: {}", params.task_id), None))?;
            task.result
                .ok_or_else(|| ErrorData::internal_error("task has no result", None))
        }
    }
}

/// E1: initialize + tools/list + tools/call("echo") over a real session.
#[tokio::test]
async fn e1_initialize_list_and_call_echo() -> anyhow::Result<()> {
    let (server_transport, client_transport) = tokio::io::duplex(4096);

    tokio::spawn(async move {
        let server = ConformanceServer::new().serve(server_transport).await?;
        server.waiting().await?;
        anyhow::Ok(())
    });

    let client = ().serve(client_transport).await?;
    let info = client.peer_info().expect("server sent InitializeResult");
    assert_eq!(info.protocol_version, "2025-06-18");

    let tools = client.peer().list_tools(None).await?;
    assert_eq!(tools.tools.len(), 1);
    assert_eq!(tools.tools[0].name, "echo");

    let result = client
        .peer()
        .call_tool(CallToolRequestParam {
            name: "echo".into(),
            arguments: Some(serde_json::json!({"message": "Hello MCP!"}).as_object().unwrap().clone()),
        })
        .await?;
    assert_eq!(result.is_error, Some(false));
    assert_eq!(result.content.len(), 1);
    assert_eq!(result.content[0].as_text().map(|t| t.text.as_str()), Some("Echo: Hello MCP!"));

    client.cancel().await?;
    Ok(())
}

struct ProgressClient {
    received: Arc<Mutex<Vec<ProgressNotificationParam>>>,
}

impl ClientHandler for ProgressClient {
    fn on_progress(
        &self,
        params: ProgressNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) -> impl Future<Output = ()> + Send {
        let received = self.received.clone();
        async move {
            received.lock().await.push(params);
        }
    }
}

/// E2: every progress notification carries the client's token, arrives
/// exactly `prog_steps` times, and all of them precede the reply.
#[tokio::test]
async fn e2_progress_notifications_precede_reply() -> anyhow::Result<()> {
    let (server_transport, client_transport) = tokio::io::duplex(4096);

    tokio::spawn(async move {
        let server = ConformanceServer::new().serve(server_transport).await?;
        server.waiting().await?;
        anyhow::Ok(())
    });

    let received = Arc::new(Mutex::new(Vec::new()));
    let client = ProgressClient { received: received.clone() }.serve(client_transport).await?;

    let mut request = CallToolRequest::new(
        Default::default(),
        CallToolRequestParam {
            name: "prog".into(),
            arguments: Some(serde_json::Map::new()),
        },
    );
    let mut meta = Meta::new();
    meta.set_progress_token(ProgressToken::String("pt-1".into()));
    request.extensions.insert(meta);

    let result = match client.peer().send_request(rmcp::model::ClientRequest::CallToolRequest(request)).await? {
        ServerResult::CallToolResult(result) => result,
        other => anyhow::bail!("unexpected response: {other:?}"),
    };
    assert_eq!(result.content[0].as_text().map(|t| t.text.as_str()), Some("done"));

    let events = received.lock().await;
    assert_eq!(events.len(), 3);
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.progress, i as u32);
        assert!(matches!(&event.progress_token, ProgressToken::String(s) if &**s == "pt-1"));
    }

    drop(events);
    client.cancel().await?;
    Ok(())
}

/// E3: cancelling a `tools/call` before it replies trips the handler's
/// request-scoped cancellation token.
#[tokio::test]
async fn e3_cancellation_trips_request_token() -> anyhow::Result<()> {
    let (server_transport, client_transport) = tokio::io::duplex(4096);
    let cancelled_signal = Arc::new(tokio::sync::Notify::new());
    let observed_id: Arc<Mutex<Option<RequestId>>> = Arc::new(Mutex::new(None));

    struct CancellableServer {
        cancelled_signal: Arc<tokio::sync::Notify>,
        observed_id: Arc<Mutex<Option<RequestId>>>,
    }
    impl ServerHandler for CancellableServer {
        fn get_info(&self) -> ServerInfo {
            ServerInfo {
                protocol_version: rmcp::model::LATEST_PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities::builder().enable_tools().build(),
                server_info: Implementation {
                    name: "conformance-server".to_string(),
                    title: None,
                    version: "1.0.0".to_string(),
                },
                instructions: None,
            }
        }
        fn call_tool(
            &self,
            _params: CallToolRequestParam,
            context: RequestContext<RoleServer>,
        ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
            async move {
                self.observed_id.lock().await.replace(context.id.clone());
                tokio::select! {
                    _ = context.ct.cancelled() => {
                        self.cancelled_signal.notify_one();
                        Err(ErrorData::internal_error("cancelled", None))
                    }
                    _ = tokio::time::sleep(Duration::from_secs(30)) => {
                        Ok(CallToolResult::success(vec![]))
                    }
                }
            }
        }
    }

    tokio::spawn({
        let cancelled_signal = cancelled_signal.clone();
        let observed_id = observed_id.clone();
        async move {
            let server = CancellableServer { cancelled_signal, observed_id }.serve(server_transport).await?;
            server.waiting().await?;
            anyhow::Ok(())
        }
    });

    let client = ().serve(client_transport).await?;
    let peer = client.peer().clone();

    let call = tokio::spawn({
        let peer = peer.clone();
        async move {
            peer.call_tool(CallToolRequestParam {
                name: "slow".into(),
                arguments: None,
            })
            .await
        }
    });

    // Wait for the handler to actually start so we know which request id to cancel.
    let request_id = loop {
        if let Some(id) = observed_id.lock().await.clone() {
            break id;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };

    peer.notify_cancelled(CancelledNotificationParam {
        request_id,
        reason: None,
    })
    .await?;

    tokio::time::timeout(Duration::from_secs(1), cancelled_signal.notified())
        .await
        .expect("handler's cancellation token should have been triggered");

    // The in-flight call errors out (the handler returned an error rather
    // than a success result) instead of ever completing normally.
    let outcome = call.await?;
    assert!(outcome.is_err());

    client.cancel().await?;
    Ok(())
}

/// E4: `tools/call` with `_meta.task` returns a working `TaskHandle`
/// immediately; `tasks/result` blocks until the job actually finishes.
#[tokio::test]
async fn e4_tasks_happy_path() -> anyhow::Result<()> {
    let (server_transport, client_transport) = tokio::io::duplex(4096);

    tokio::spawn(async move {
        let server = ConformanceServer::new().serve(server_transport).await?;
        server.waiting().await?;
        anyhow::Ok(())
    });

    let client = ().serve(client_transport).await?;

    let mut request = CallToolRequest::new(
        Default::default(),
        CallToolRequestParam {
            name: "slow".into(),
            arguments: None,
        },
    );
    let mut meta = Meta::new();
    meta.set_task(TaskMetadata {
        time_to_live: Some("PT5M".to_string()),
    });
    request.extensions.insert(meta);

    let started = std::time::Instant::now();
    let result = match client.peer().send_request(rmcp::model::ClientRequest::CallToolRequest(request)).await? {
        ServerResult::CallToolResult(result) => result,
        other => anyhow::bail!("unexpected response: {other:?}"),
    };
    let task = result.task.expect("tools/call with _meta.task returns a TaskHandle");
    assert_eq!(task.status, TaskStatus::Working);
    assert!(started.elapsed() < Duration::from_millis(80), "tools/call must return before the job finishes");

    let task_result_request = GetTaskResultRequest::new(
        Default::default(),
        GetTaskResultRequestParam { task_id: task.task_id.clone() },
    );
    let task_result = match client
        .peer()
        .send_request(rmcp::model::ClientRequest::GetTaskResultRequest(task_result_request))
        .await?
    {
        ServerResult::TaskResult(result) => result,
        other => anyhow::bail!("unexpected response: {other:?}"),
    };
    match task_result {
        TaskResult::CallTool(result) => {
            assert_eq!(result.content[0].as_text().map(|t| t.text.as_str()), Some("slow job finished"));
        }
    }

    client.cancel().await?;
    Ok(())
}
