// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference interactive provider: allocates a pseudoterminal and runs the
//! agent executable attached to it.

use async_trait::async_trait;
use nix::pty::{openpty, Winsize};
use sf_core::{InteractiveProvider, InteractiveSession, ProviderError, SpawnOptions};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::process::CommandExt;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::warn;

pub struct PtyInteractiveProvider {
    executable: String,
}

impl PtyInteractiveProvider {
    pub fn new(executable: impl Into<String>) -> Self {
        Self { executable: executable.into() }
    }
}

fn winsize(cols: u16, rows: u16) -> Winsize {
    Winsize { ws_row: rows, ws_col: cols, ws_xpixel: 0, ws_ypixel: 0 }
}

#[async_trait]
impl InteractiveProvider for PtyInteractiveProvider {
    async fn spawn(&self, opts: SpawnOptions) -> Result<Box<dyn InteractiveSession>, ProviderError> {
        let cols = opts.cols.unwrap_or(80);
        let rows = opts.rows.unwrap_or(24);
        let pty = openpty(Some(&winsize(cols, rows)), None).map_err(|e| ProviderError::SpawnFailed(e.to_string()))?;
        let master: OwnedFd = pty.master;
        let slave: OwnedFd = pty.slave;

        let slave_fd = slave.as_raw_fd();
        let mut command = std::process::Command::new(&self.executable);
        command.current_dir(&opts.working_directory).envs(&opts.environment_variables);
        if let Some(model) = &opts.model {
            command.arg("--model").arg(model);
        }
        // SAFETY: dup2 + setsid run in the forked child before exec, using
        // only async-signal-safe syscalls.
        unsafe {
            command.pre_exec(move || {
                nix::unistd::setsid().map_err(std::io::Error::from)?;
                nix::libc::ioctl(slave_fd, nix::libc::TIOCSCTTY as _, 0);
                nix::unistd::dup2(slave_fd, 0).map_err(std::io::Error::from)?;
                nix::unistd::dup2(slave_fd, 1).map_err(std::io::Error::from)?;
                nix::unistd::dup2(slave_fd, 2).map_err(std::io::Error::from)?;
                Ok(())
            });
        }
        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        let child = tokio::process::Command::from(command)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProviderError::SpawnFailed(e.to_string()))?;
        drop(slave);

        let pid = child.id();
        let master_file = tokio::fs::File::from_std(std::fs::File::from(master));

        let (data_tx, data_rx) = mpsc::channel(256);
        let (write_half, read_half) = tokio::io::split(master_file);

        Ok(Box::new(PtySession {
            pid,
            session_id: None,
            write_half,
            data_rx: Some(data_rx),
            child,
            reader_started: false,
            read_half: Some(read_half),
            data_tx,
        }))
    }

    fn is_available(&self) -> bool {
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(&self.executable).is_file()))
            .unwrap_or(false)
    }

    fn list_models(&self) -> Vec<String> {
        Vec::new()
    }
}

struct PtySession {
    pid: Option<u32>,
    session_id: Option<String>,
    write_half: tokio::io::WriteHalf<tokio::fs::File>,
    read_half: Option<tokio::io::ReadHalf<tokio::fs::File>>,
    data_rx: Option<mpsc::Receiver<Vec<u8>>>,
    data_tx: mpsc::Sender<Vec<u8>>,
    child: tokio::process::Child,
    reader_started: bool,
}

impl PtySession {
    fn ensure_reader(&mut self) {
        if self.reader_started {
            return;
        }
        self.reader_started = true;
        if let Some(mut read_half) = self.read_half.take() {
            let tx = self.data_tx.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                loop {
                    match read_half.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    }
}

#[async_trait]
impl InteractiveSession for PtySession {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.clone()
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), ProviderError> {
        self.write_half.write_all(data).await.map_err(|e| ProviderError::Io(e.to_string()))
    }

    async fn resize(&mut self, cols: u16, rows: u16) -> Result<(), ProviderError> {
        let ws = winsize(cols, rows);
        let fd = self.write_half.get_ref().as_raw_fd();
        let rc = unsafe { nix::libc::ioctl(fd, nix::libc::TIOCSWINSZ as _, &ws as *const Winsize) };
        if rc != 0 {
            return Err(ProviderError::Io("TIOCSWINSZ failed".into()));
        }
        Ok(())
    }

    fn data_channel(&mut self) -> mpsc::Receiver<Vec<u8>> {
        self.ensure_reader();
        self.data_rx.take().unwrap_or_else(|| mpsc::channel(1).1)
    }

    async fn wait_exit(&mut self) -> (Option<i32>, Option<i32>) {
        match self.child.wait().await {
            Ok(status) => (status.code(), None),
            Err(e) => {
                warn!(error = %e, "failed waiting on interactive session");
                (None, None)
            }
        }
    }

    async fn kill(&mut self) -> Result<(), ProviderError> {
        self.child.start_kill().map_err(|e| ProviderError::Io(e.to_string()))
    }
}
