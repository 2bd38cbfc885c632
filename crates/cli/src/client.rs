// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client over the daemon's newline-JSON Unix socket protocol.

use sf_daemon::{buffered, read_response, write_request, ProcessConfig, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach stoneforged at {path}: {source}\nhint: is the daemon running? start it with `stoneforged &`")]
    Connect { path: std::path::PathBuf, #[source] source: std::io::Error },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("daemon sent an unexpected response: {0:?}")]
    Unexpected(Response),

    #[error("{code}: {message}")]
    Daemon { code: String, message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },
}

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    pub async fn connect() -> Result<Self, ClientError> {
        let config = ProcessConfig::load().map_err(|e| ClientError::Connect {
            path: std::path::PathBuf::from("<unresolved>"),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?;
        Self::connect_at(&config.socket_path).await
    }

    pub async fn connect_at(path: &std::path::Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(path)
            .await
            .map_err(|source| ClientError::Connect { path: path.to_path_buf(), source })?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        let (read_half, mut write_half) = self.stream.split();
        write_request(&mut write_half, request).await?;
        let mut reader = buffered(read_half);
        let response = read_response(&mut reader).await?;
        if let Response::Error { code, message } = &response {
            return Err(ClientError::Daemon { code: code.clone(), message: message.clone() });
        }
        Ok(response)
    }

    pub fn reject<T>(response: Response) -> Result<T, ClientError> {
        Err(ClientError::Unexpected(response))
    }
}
