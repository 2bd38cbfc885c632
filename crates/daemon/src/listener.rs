// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix socket listener: accepts connections, reads one `Request` per line,
//! dispatches it against `AppState`, writes back one `Response` per line.

use std::sync::Arc;

use sf_core::{Clock, CoreError, StewardFocus, Trigger, WorkerMode};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use crate::protocol::{buffered, read_request, write_response, ProtocolError, Request, Response};
use crate::state::AppState;

pub struct Listener {
    inner: UnixListener,
}

impl Listener {
    pub fn bind(path: &std::path::Path) -> std::io::Result<Self> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(Self { inner: UnixListener::bind(path)? })
    }

    /// Accepts connections until `shutdown` fires, handling each on its own
    /// task. `shutdown_tx` is cloned into every handler so a `Shutdown`
    /// request from any client can signal the main loop to stop.
    pub async fn serve<C: Clock + 'static>(
        self,
        state: Arc<AppState<C>>,
        mut shutdown: tokio::sync::oneshot::Receiver<()>,
        shutdown_tx: mpsc::Sender<()>,
    ) {
        loop {
            tokio::select! {
                accepted = self.inner.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let state = state.clone();
                            let shutdown_tx = shutdown_tx.clone();
                            tokio::spawn(async move {
                                if let Err(error) = handle_connection(stream, state, shutdown_tx).await {
                                    tracing::debug!(%error, "client connection ended");
                                }
                            });
                        }
                        Err(error) => tracing::warn!(%error, "failed to accept connection"),
                    }
                }
                _ = &mut shutdown => break,
            }
        }
    }
}

async fn handle_connection<C: Clock + 'static>(
    stream: UnixStream,
    state: Arc<AppState<C>>,
    shutdown_tx: mpsc::Sender<()>,
) -> Result<(), ProtocolError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = buffered(read_half);
    loop {
        let request = match read_request(&mut reader).await {
            Ok(r) => r,
            Err(ProtocolError::Closed) => return Ok(()),
            Err(e) => return Err(e),
        };
        let response = handle_request(&state, request, &shutdown_tx).await;
        write_response(&mut write_half, &response).await?;
    }
}

async fn handle_request<C: Clock + 'static>(
    state: &Arc<AppState<C>>,
    request: Request,
    shutdown_tx: &mpsc::Sender<()>,
) -> Response {
    match request {
        Request::Ping => Response::Ok,
        Request::Hello { .. } => Response::Hello { version: env!("CARGO_PKG_VERSION").to_string() },
        Request::Status => {
            let tasks_active =
                state.store.list_tasks().await.map(|ts| ts.iter().filter(|t| t.counts_toward_workload()).count()).unwrap_or(0);
            Response::Status {
                uptime_secs: state.uptime_secs(),
                tasks_active,
                sessions_active: 0,
                dispatch_running: state.dispatch.is_running(),
                steward_running: state.steward.is_running(),
            }
        }
        Request::Shutdown => {
            let _ = shutdown_tx.send(()).await;
            Response::ShuttingDown
        }
        Request::Event { event } => {
            let name = event_wire_name(&event);
            state.steward.publish_event(&name, serde_json::json!({ "element_id": event.element_id() })).await;
            Response::Ok
        }

        Request::TaskCreate { title, task_type, priority, complexity } => handle_task_create(state, title, task_type, priority, complexity).await,
        Request::TaskList => match state.store.list_tasks().await {
            Ok(tasks) => Response::Tasks { tasks },
            Err(e) => error_response(e),
        },
        Request::TaskGet { id } => match parse_task_id(&id) {
            Ok(id) => match state.store.get_task(&id).await {
                Ok(task) => Response::Task { task: Box::new(task) },
                Err(e) => error_response(e),
            },
            Err(e) => error_response(e),
        },
        Request::TaskTransition { id, status } => handle_task_transition(state, id, status).await,
        Request::TaskAssign { id, agent_id } => handle_task_assign(state, id, agent_id).await,
        Request::TaskDelete { id, reason } => handle_task_delete(state, id, reason).await,
        Request::TaskGc { age_days, dry_run } => handle_task_gc(state, age_days, dry_run).await,

        Request::DocCreate { content_type, content, category } => handle_doc_create(state, content_type, content, category).await,
        Request::DocList => match state.store.list_documents().await {
            Ok(documents) => Response::Documents { documents },
            Err(e) => error_response(e),
        },
        Request::DocGet { id } => match parse_doc_id(&id) {
            Ok(id) => match state.store.get_document(&id).await {
                Ok(document) => Response::Document { document: Box::new(document) },
                Err(e) => error_response(e),
            },
            Err(e) => error_response(e),
        },
        Request::DocUpdate { id, content } => handle_doc_update(state, id, content).await,
        Request::DocHistory { id } => handle_doc_history(state, id).await,
        Request::DocRollback { id, target_version } => handle_doc_rollback(state, id, target_version).await,
        Request::DocSearch { query } => handle_doc_search(state, query).await,
        Request::DocArchive { id } => handle_doc_set_status(state, id, sf_core::DocumentStatus::Archived).await,
        Request::DocUnarchive { id } => handle_doc_set_status(state, id, sf_core::DocumentStatus::Active).await,

        Request::AgentRegister { name, role, mode, focus, trigger, provider, model } => {
            handle_agent_register(state, name, role, mode, focus, trigger, provider, model).await
        }
        Request::AgentList => match state.agents.list_agents().await {
            Ok(agents) => Response::Agents { agents },
            Err(e) => engine_error_response(e),
        },
        Request::AgentGet { id } => match parse_agent_id(&id) {
            Ok(id) => match state.agents.get_agent(&id).await {
                Ok(agent) => Response::Agent { agent: Box::new(agent) },
                Err(e) => engine_error_response(e),
            },
            Err(e) => error_response(e),
        },
        Request::AgentStart { id } => handle_agent_session_status(state, id, sf_core::AgentSessionStatus::Running).await,
        Request::AgentStop { id } => handle_agent_session_status(state, id, sf_core::AgentSessionStatus::Idle).await,

        Request::ExecuteSteward { id } => match parse_agent_id(&id) {
            Ok(id) => match state.steward.execute_steward(id).await {
                Ok(()) => Response::Ok,
                Err(e) => engine_error_response(e),
            },
            Err(e) => error_response(e),
        },

        Request::SyncNow { provider, project, adapter_type } => {
            let target = sf_sync::PullTarget { provider, project, adapter_type };
            match state.sync_engine.sync(&[target], &sf_sync::SyncOptions::default()).await {
                Ok(summary) => Response::SyncSummary {
                    pushed: summary.pushed,
                    pulled: summary.pulled,
                    created: summary.created,
                    skipped: summary.skipped,
                    conflicts: summary.conflicts,
                    errors: summary.errors,
                },
                Err(e) => Response::Error { code: "sync_failed".into(), message: e.to_string() },
            }
        }

        Request::Unknown => Response::Error { code: "invalid_arguments".into(), message: "unrecognized request type".into() },
    }
}

/// The serde `type` tag an event serializes under (e.g. `"task:created"`),
/// which is what steward `Trigger::Event { event, .. }` triggers match on.
fn event_wire_name(event: &sf_core::Event) -> String {
    serde_json::to_value(event)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_string))
        .unwrap_or_default()
}

fn error_response(error: CoreError) -> Response {
    match &error {
        CoreError::NotFound { kind, id } => Response::NotFound { kind: kind.to_string(), id: id.clone() },
        _ => Response::Error { code: error.code().to_string(), message: error.to_string() },
    }
}

fn engine_error_response(error: sf_engine::EngineError) -> Response {
    match error {
        sf_engine::EngineError::Core(core) => error_response(core),
        other => Response::Error { code: "engine_error".into(), message: other.to_string() },
    }
}

fn parse_task_id(raw: &str) -> Result<sf_core::TaskId, CoreError> {
    if raw.is_empty() {
        return Err(CoreError::InvalidArguments { message: "task id is empty".into() });
    }
    Ok(sf_core::TaskId::from_string(raw))
}

fn parse_doc_id(raw: &str) -> Result<sf_core::DocumentId, CoreError> {
    if raw.is_empty() {
        return Err(CoreError::InvalidArguments { message: "document id is empty".into() });
    }
    Ok(sf_core::DocumentId::from_string(raw))
}

fn parse_agent_id(raw: &str) -> Result<sf_core::AgentId, CoreError> {
    if raw.is_empty() {
        return Err(CoreError::InvalidArguments { message: "agent id is empty".into() });
    }
    Ok(sf_core::AgentId::from_string(raw))
}

async fn handle_task_create<C: Clock>(state: &Arc<AppState<C>>, title: String, task_type: String, priority: u8, complexity: u8) -> Response {
    let task_type = match task_type.as_str() {
        "bug" => sf_core::TaskType::Bug,
        "feature" => sf_core::TaskType::Feature,
        "task" => sf_core::TaskType::Task,
        "chore" => sf_core::TaskType::Chore,
        other => return Response::Error { code: "invalid_arguments".into(), message: format!("unknown task_type: {other}") },
    };
    let now = state.clock.utc_now();
    let id = sf_core::TaskId::new();
    let task = sf_core::Task {
        meta: sf_core::EntityMeta::new(id.to_string(), "task", "sf-cli", now),
        id,
        title,
        status: sf_core::TaskStatus::Open,
        priority,
        complexity,
        task_type,
        description_ref: None,
        acceptance_criteria: None,
        close_reason: None,
        assignee: None,
        owner: None,
        deadline: None,
        scheduled_for: None,
        closed_at: None,
        deleted_at: None,
        deleted_by: None,
        delete_reason: None,
    };
    match state.store.put_task(task.clone()).await {
        Ok(()) => {
            let _ = state.store.append_event(sf_core::Event::TaskCreated { id: task.id, created_at: now }).await;
            Response::Task { task: Box::new(task) }
        }
        Err(e) => error_response(e),
    }
}

async fn handle_task_transition<C: Clock>(state: &Arc<AppState<C>>, id: String, status: String) -> Response {
    let Ok(id) = parse_task_id(&id) else {
        return Response::Error { code: "invalid_arguments".into(), message: format!("not a task id: {id}") };
    };
    let status = match status.as_str() {
        "open" => sf_core::TaskStatus::Open,
        "in_progress" => sf_core::TaskStatus::InProgress,
        "blocked" => sf_core::TaskStatus::Blocked,
        "deferred" => sf_core::TaskStatus::Deferred,
        "review" => sf_core::TaskStatus::Review,
        "closed" => sf_core::TaskStatus::Closed,
        "backlog" => sf_core::TaskStatus::Backlog,
        "tombstone" => sf_core::TaskStatus::Tombstone,
        other => return Response::Error { code: "invalid_arguments".into(), message: format!("unknown status: {other}") },
    };
    match state.tasks.transition_status(&id, status).await {
        Ok(task) => Response::Task { task: Box::new(task) },
        Err(e) => engine_error_response(e),
    }
}

async fn handle_task_assign<C: Clock>(state: &Arc<AppState<C>>, id: String, agent_id: String) -> Response {
    let (Ok(id), Ok(agent_id)) = (parse_task_id(&id), parse_agent_id(&agent_id)) else {
        return Response::Error { code: "invalid_arguments".into(), message: "malformed id".into() };
    };
    match state.tasks.assign_to_agent(&id, agent_id).await {
        Ok(task) => Response::Task { task: Box::new(task) },
        Err(e) => engine_error_response(e),
    }
}

async fn handle_task_delete<C: Clock>(state: &Arc<AppState<C>>, id: String, reason: Option<String>) -> Response {
    let Ok(id) = parse_task_id(&id) else {
        return Response::Error { code: "invalid_arguments".into(), message: format!("not a task id: {id}") };
    };
    let mut task = match state.store.get_task(&id).await {
        Ok(task) => task,
        Err(e) => return error_response(e),
    };
    let now = state.clock.utc_now();
    task.deleted_at = Some(now);
    task.deleted_by = Some("sf-cli".to_string());
    task.delete_reason = reason;
    task.meta.touch(now);
    match state.store.put_task(task.clone()).await {
        Ok(()) => {
            let _ = state.store.append_event(sf_core::Event::TaskDeleted { id: task.id, updated_at: now }).await;
            Response::Task { task: Box::new(task) }
        }
        Err(e) => error_response(e),
    }
}

async fn handle_task_gc<C: Clock>(state: &Arc<AppState<C>>, age_days: i64, dry_run: bool) -> Response {
    let now = state.clock.utc_now();
    let cutoff = now - chrono::Duration::days(age_days);
    let tasks = match state.store.list_tasks().await {
        Ok(tasks) => tasks,
        Err(e) => return error_response(e),
    };
    let eligible: Vec<_> = tasks
        .into_iter()
        .filter(|t| matches!(t.status, sf_core::TaskStatus::Closed | sf_core::TaskStatus::Tombstone))
        .filter(|t| t.closed_at.is_some_and(|closed_at| closed_at < cutoff))
        .collect();

    if dry_run {
        return Response::GcResult { would_delete: eligible.iter().map(|t| t.id.to_string()).collect(), deleted: vec![] };
    }

    let mut deleted = Vec::new();
    for mut task in eligible {
        task.deleted_at = Some(now);
        task.deleted_by = Some("sf-cli:gc".to_string());
        task.meta.touch(now);
        if state.store.put_task(task.clone()).await.is_ok() {
            deleted.push(task.id.to_string());
        }
    }
    Response::GcResult { would_delete: vec![], deleted }
}

async fn handle_doc_create<C: Clock>(state: &Arc<AppState<C>>, content_type: String, content: String, category: String) -> Response {
    let content_type = match content_type.as_str() {
        "text" => sf_core::ContentType::Text,
        "markdown" => sf_core::ContentType::Markdown,
        "json" => sf_core::ContentType::Json,
        other => return Response::Error { code: "invalid_arguments".into(), message: format!("unknown content_type: {other}") },
    };
    if let Err(e) = sf_core::Document::validate_content(content_type, &content) {
        return error_response(e);
    }
    let category = match parse_category(&category) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let now = state.clock.utc_now();
    let id = sf_core::DocumentId::new();
    let document = sf_core::Document {
        meta: sf_core::EntityMeta::new(id.to_string(), "document", "sf-cli", now),
        id,
        content_type,
        content,
        version: 1,
        previous_version_id: None,
        category,
        status: sf_core::DocumentStatus::Active,
        immutable: false,
    };
    match state.store.put_document(document.clone()).await {
        Ok(()) => {
            let _ = state.store.append_event(sf_core::Event::DocumentCreated { id: document.id, created_at: now }).await;
            Response::Document { document: Box::new(document) }
        }
        Err(e) => error_response(e),
    }
}

fn parse_category(raw: &str) -> Result<sf_core::DocumentCategory, CoreError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| CoreError::InvalidArguments { message: format!("unknown document category: {raw}") })
}

async fn handle_doc_update<C: Clock>(state: &Arc<AppState<C>>, id: String, content: String) -> Response {
    let Ok(id) = parse_doc_id(&id) else {
        return Response::Error { code: "invalid_arguments".into(), message: format!("not a document id: {id}") };
    };
    let mut document = match state.store.get_document(&id).await {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    let now = state.clock.utc_now();
    if let Err(e) = document.update_content(content, now) {
        return error_response(e);
    }
    match state.store.put_document(document.clone()).await {
        Ok(()) => {
            let _ = state.store.append_event(sf_core::Event::DocumentUpdated { id: document.id, updated_at: now }).await;
            Response::Document { document: Box::new(document) }
        }
        Err(e) => error_response(e),
    }
}

/// Walks every document sharing this chain (root == self or
/// `previous_version_id == root`), ordered by version ascending.
async fn handle_doc_history<C: Clock>(state: &Arc<AppState<C>>, id: String) -> Response {
    let Ok(id) = parse_doc_id(&id) else {
        return Response::Error { code: "invalid_arguments".into(), message: format!("not a document id: {id}") };
    };
    let anchor = match state.store.get_document(&id).await {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    let root = anchor.previous_version_id.unwrap_or(anchor.id);
    let all = match state.store.list_documents().await {
        Ok(docs) => docs,
        Err(e) => return error_response(e),
    };
    let mut chain: Vec<_> = all.into_iter().filter(|d| d.id == root || d.previous_version_id == Some(root)).collect();
    chain.sort_by_key(|d| d.version);
    Response::Documents { documents: chain }
}

async fn handle_doc_rollback<C: Clock>(state: &Arc<AppState<C>>, id: String, target_version: u64) -> Response {
    let Ok(id) = parse_doc_id(&id) else {
        return Response::Error { code: "invalid_arguments".into(), message: format!("not a document id: {id}") };
    };
    let current = match state.store.get_document(&id).await {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    let root = current.previous_version_id.unwrap_or(current.id);
    let all = match state.store.list_documents().await {
        Ok(docs) => docs,
        Err(e) => return error_response(e),
    };
    let Some(target) = all.iter().find(|d| (d.id == root || d.previous_version_id == Some(root)) && d.version == target_version) else {
        return Response::NotFound { kind: "document_version".into(), id: format!("{id}@v{target_version}") };
    };

    let now = state.clock.utc_now();
    let rolled_back = current.fork_version(sf_core::DocumentId::new(), target.content.clone(), now);
    match state.store.put_document(rolled_back.clone()).await {
        Ok(()) => {
            let _ = state.store.append_event(sf_core::Event::DocumentUpdated { id: rolled_back.id, updated_at: now }).await;
            Response::Document { document: Box::new(rolled_back) }
        }
        Err(e) => error_response(e),
    }
}

/// Naive substring search over title-less documents' content; there is no
/// search index subsystem in scope, so this scans the in-memory `Store`.
async fn handle_doc_search<C: Clock>(state: &Arc<AppState<C>>, query: String) -> Response {
    match state.store.list_documents().await {
        Ok(docs) => {
            let needle = query.to_lowercase();
            let matches = docs.into_iter().filter(|d| d.content.to_lowercase().contains(&needle)).collect();
            Response::Documents { documents: matches }
        }
        Err(e) => error_response(e),
    }
}

async fn handle_doc_set_status<C: Clock>(state: &Arc<AppState<C>>, id: String, status: sf_core::DocumentStatus) -> Response {
    let Ok(id) = parse_doc_id(&id) else {
        return Response::Error { code: "invalid_arguments".into(), message: format!("not a document id: {id}") };
    };
    let mut document = match state.store.get_document(&id).await {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    let now = state.clock.utc_now();
    document.status = status;
    document.meta.touch(now);
    match state.store.put_document(document.clone()).await {
        Ok(()) => Response::Document { document: Box::new(document) },
        Err(e) => error_response(e),
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_agent_register<C: Clock>(
    state: &Arc<AppState<C>>,
    name: String,
    role: String,
    mode: Option<String>,
    focus: Option<String>,
    trigger: Option<String>,
    provider: Option<String>,
    model: Option<String>,
) -> Response {
    let result = match role.as_str() {
        "director" => state.agents.register_director(&name).await,
        "worker" => {
            let worker_mode = match mode.as_deref() {
                Some("persistent") => WorkerMode::Persistent,
                _ => WorkerMode::Ephemeral,
            };
            state.agents.register_worker(&name, worker_mode).await
        }
        "steward" => {
            let steward_focus = match focus.as_deref() {
                Some("merge") => StewardFocus::Merge,
                Some("docs") => StewardFocus::Docs,
                _ => StewardFocus::Custom,
            };
            let triggers = trigger.into_iter().map(|schedule| Trigger::Cron { schedule }).collect();
            state.agents.register_steward(&name, steward_focus, triggers).await
        }
        other => return Response::Error { code: "invalid_arguments".into(), message: format!("unknown role: {other}") },
    };

    let agent_id = match result {
        Ok(id) => id,
        Err(e) => return engine_error_response(e),
    };

    if provider.is_some() || model.is_some() {
        if let Some(p) = provider {
            let _ = state.agents.update_metadata(&agent_id, "provider".into(), serde_json::Value::String(p)).await;
        }
        if let Some(m) = model {
            let _ = state.agents.update_metadata(&agent_id, "model".into(), serde_json::Value::String(m)).await;
        }
    }

    if matches!(role.as_str(), "steward") {
        let _ = state.steward.register_steward(agent_id).await;
    }

    match state.agents.get_agent(&agent_id).await {
        Ok(agent) => Response::Agent { agent: Box::new(agent) },
        Err(e) => engine_error_response(e),
    }
}

async fn handle_agent_session_status<C: Clock>(state: &Arc<AppState<C>>, id: String, status: sf_core::AgentSessionStatus) -> Response {
    let Ok(id) = parse_agent_id(&id) else {
        return Response::Error { code: "invalid_arguments".into(), message: format!("not an agent id: {id}") };
    };
    match state.agents.update_session_status(&id, status).await {
        Ok(()) => match state.agents.get_agent(&id).await {
            Ok(agent) => Response::Agent { agent: Box::new(agent) },
            Err(e) => engine_error_response(e),
        },
        Err(e) => engine_error_response(e),
    }
}

