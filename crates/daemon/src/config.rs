// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level daemon configuration: state directory, socket path, and
//! the engine/sync tunables loaded from an optional TOML file.

use serde::Deserialize;
use sf_engine::DaemonConfig as EngineConfig;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DaemonError, DaemonResult};

/// Resolve the state directory: `SF_STATE_DIR` > `XDG_STATE_HOME/stoneforge` > `~/.local/state/stoneforge`.
pub fn state_dir() -> DaemonResult<PathBuf> {
    if let Ok(dir) = std::env::var("SF_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("stoneforge"));
    }
    let home = std::env::var("HOME")
        .map_err(|_| DaemonError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "HOME is not set")))?;
    Ok(PathBuf::from(home).join(".local/state/stoneforge"))
}

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
}

impl ProcessConfig {
    pub fn load() -> DaemonResult<Self> {
        let state_dir = state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            state_dir,
        })
    }
}

/// On-disk shape of the optional `config.toml`. Every field is optional;
/// missing fields fall back to `EngineConfig`/`SyncConfig` defaults.
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    poll_interval_ms: Option<u64>,
    max_per_tick: Option<usize>,
    shutdown_timeout_secs: Option<u64>,
    steward_execution_timeout_secs: Option<u64>,
    sync_interval_secs: Option<u64>,
    desktop_notifications: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub engine: EngineConfig,
    pub sync_interval: Duration,
    pub desktop_notifications: bool,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self { engine: EngineConfig::new(), sync_interval: sf_sync::DEFAULT_INTERVAL, desktop_notifications: false }
    }
}

impl DaemonSettings {
    /// Loads `config.toml` under `state_dir` if present; absence is not an
    /// error, it just means every setting keeps its default.
    pub fn load(state_dir: &std::path::Path) -> DaemonResult<Self> {
        let path = state_dir.join("config.toml");
        let Ok(raw) = std::fs::read_to_string(&path) else {
            return Ok(Self::default());
        };
        let parsed: TomlConfig = toml::from_str(&raw)
            .map_err(|e| DaemonError::Core(sf_core::CoreError::InvalidArguments { message: format!("config.toml: {e}") }))?;

        let mut engine = EngineConfig::new();
        if let Some(ms) = parsed.poll_interval_ms {
            engine = engine.poll_interval(Duration::from_millis(ms));
        }
        if let Some(n) = parsed.max_per_tick {
            engine = engine.max_per_tick(n);
        }
        if let Some(secs) = parsed.shutdown_timeout_secs {
            engine = engine.shutdown_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = parsed.steward_execution_timeout_secs {
            engine = engine.steward_execution_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            engine,
            sync_interval: parsed.sync_interval_secs.map(Duration::from_secs).unwrap_or(sf_sync::DEFAULT_INTERVAL),
            desktop_notifications: parsed.desktop_notifications.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DaemonSettings::load(dir.path()).unwrap();
        assert_eq!(settings.sync_interval, sf_sync::DEFAULT_INTERVAL);
        assert!(!settings.desktop_notifications);
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "max_per_tick = 25\ndesktop_notifications = true\n").unwrap();
        let settings = DaemonSettings::load(dir.path()).unwrap();
        assert_eq!(settings.engine.max_per_tick, 25);
        assert!(settings.desktop_notifications);
        assert_eq!(settings.engine.poll_interval, Duration::from_millis(5_000));
    }
}
