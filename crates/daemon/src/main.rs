// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stoneforged`: binary entry point. Wires the concrete Store/Settings/
//! ProviderRegistry, starts the Dispatch Daemon, Steward Scheduler +
//! driver, and External Sync Daemon, then serves the CLI's IPC protocol
//! over a Unix socket until asked to shut down.

use std::io::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use sf_adapters::{NotifyAdapter, PtyInteractiveProvider, StaticProviderRegistry, SubprocessHeadlessProvider};
use sf_core::{Settings, Store, SystemClock};
use sf_daemon::{DaemonSettings, Listener, ProcessConfig, SessionStewardExecutor};
use sf_engine::{AgentRegistry, DispatchDaemon, ExecutableRateLimitTracker, SessionManager, Spawner, StewardScheduler, TaskAssignment};
use sf_storage::{MemorySettings, MemoryStore};
use sf_sync::{SyncDaemon, SyncEngine};
use tokio::sync::{mpsc, oneshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ProcessConfig::load()?;
    std::fs::create_dir_all(&config.state_dir)?;

    init_logging(&config.log_path)?;

    let _lock = acquire_lock(&config.lock_path)?;
    tracing::info!(state_dir = %config.state_dir.display(), "stoneforged starting");

    let settings_file = DaemonSettings::load(&config.state_dir)?;

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());
    let clock = SystemClock;

    let agents = AgentRegistry::new(store.clone(), clock.clone());
    let tasks = TaskAssignment::new(store.clone(), clock.clone());

    let providers: Arc<dyn sf_core::ProviderRegistry> = Arc::new(
        StaticProviderRegistry::new()
            .with_headless("claude", Box::new(SubprocessHeadlessProvider::new("claude")))
            .with_headless("codex", Box::new(SubprocessHeadlessProvider::new("codex")))
            .with_interactive("claude", Box::new(PtyInteractiveProvider::new("claude"))),
    );
    let spawner =
        Arc::new(Spawner::new(providers, clock.clone()).with_init_timeout(settings_file.engine.spawn_init_timeout));
    let session_manager = Arc::new(SessionManager::new(store.clone(), spawner.clone(), clock.clone()));
    let rate_limits = Arc::new(ExecutableRateLimitTracker::new());

    let _notify = NotifyAdapter::new(settings_file.desktop_notifications);

    let dispatch = Arc::new(DispatchDaemon::new(
        store.clone(),
        session_manager.clone(),
        spawner.clone(),
        rate_limits,
        clock.clone(),
        settings_file.engine.clone(),
    ));
    dispatch.start();

    let steward_executor =
        Arc::new(SessionStewardExecutor::new(session_manager.clone(), spawner.clone(), config.state_dir.clone()));
    let steward = Arc::new(
        StewardScheduler::new(store.clone(), steward_executor, clock.clone())
            .with_execution_timeout(settings_file.engine.steward_execution_timeout)
            .with_history_capacity(settings_file.engine.steward_history_capacity),
    );
    let registered = steward.register_all_stewards().await?;
    tracing::info!(registered, "steward triggers installed");
    steward.start(true).await?;

    let steward_driver = Arc::new(sf_daemon::StewardDriver::new(steward.clone(), clock.clone()));
    steward_driver.start();

    let sync_engine = Arc::new(SyncEngine::new(store.clone(), settings.clone(), clock.clone()));
    let sync_daemon = Arc::new(SyncDaemon::new(sync_engine.clone(), Vec::new(), settings_file.sync_interval));
    sync_daemon.start();

    let state = Arc::new(sf_daemon::AppState {
        store,
        settings,
        clock,
        agents,
        tasks,
        dispatch: dispatch.clone(),
        steward: steward.clone(),
        steward_driver: steward_driver.clone(),
        sync_engine,
        sync_daemon: sync_daemon.clone(),
        started_at: Instant::now(),
    });

    // Remove a stale socket and bind last, only after every other piece of
    // startup succeeded — a client connecting to the socket should always
    // find a daemon that's ready to answer.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = Listener::bind(&config.socket_path)?;
    tracing::info!(socket = %config.socket_path.display(), "listening");

    // `shutdown_tx`/`shutdown_rx` stop the accept loop; `ipc_shutdown_tx` is
    // cloned into every connection so a `Shutdown` request can wake the
    // select below just like an OS signal would.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (ipc_shutdown_tx, mut ipc_shutdown_rx) = mpsc::channel(1);

    let serve_state = state.clone();
    let serve = tokio::spawn(listener.serve(serve_state, shutdown_rx, ipc_shutdown_tx));

    tokio::select! {
        () = wait_for_os_signal() => tracing::info!("received shutdown signal"),
        _ = ipc_shutdown_rx.recv() => tracing::info!("received shutdown request over ipc"),
    }
    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(Duration::from_secs(10), serve).await;

    steward_driver.stop();
    steward.stop();
    sync_daemon.stop().await;

    let _ = std::fs::remove_file(&config.socket_path);
    tracing::info!("stoneforged stopped");
    Ok(())
}

/// Resolves on SIGTERM or Ctrl-C, whichever arrives first.
async fn wait_for_os_signal() {
    let sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate());
    match sigterm {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(error) => {
            tracing::warn!(%error, "failed to install SIGTERM handler, falling back to Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

struct LockGuard {
    file: std::fs::File,
    path: std::path::PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Acquires an exclusive lock on `path`, failing fast if another daemon
/// instance already holds it. Truncation happens only after the lock is
/// held, so a losing process never wipes the winner's PID.
fn acquire_lock(path: &std::path::Path) -> anyhow::Result<LockGuard> {
    let file = std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(path)?;
    file.try_lock_exclusive().map_err(|_| anyhow::anyhow!("another stoneforged instance is already running (lock held at {})", path.display()))?;
    file.set_len(0)?;
    let mut file = file;
    writeln!(file, "{}", std::process::id())?;
    Ok(LockGuard { file, path: path.to_path_buf() })
}

fn init_logging(log_path: &std::path::Path) -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let dir = log_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let file_name = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("daemon.log"));
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // Leaked deliberately: the guard must outlive `main`, and this process
    // only ever constructs one.
    Box::leak(Box::new(guard));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
    Ok(())
}
