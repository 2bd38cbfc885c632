// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format: one JSON object per line (newline-delimited), read with
//! `AsyncBufReadExt::read_line` on either side of the Unix socket.

use super::{Request, Response};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    Closed,
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn read_request<R: AsyncBufReadExt + Unpin>(reader: &mut R) -> Result<Request, ProtocolError> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(ProtocolError::Closed);
    }
    Ok(serde_json::from_str(line.trim_end())?)
}

pub async fn write_response<W: AsyncWriteExt + Unpin>(writer: &mut W, response: &Response) -> Result<(), ProtocolError> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_response<R: AsyncBufReadExt + Unpin>(reader: &mut R) -> Result<Response, ProtocolError> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(ProtocolError::Closed);
    }
    Ok(serde_json::from_str(line.trim_end())?)
}

pub async fn write_request<W: AsyncWriteExt + Unpin>(writer: &mut W, request: &Request) -> Result<(), ProtocolError> {
    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Constructs a `BufReader` over a half of a split Unix stream; a thin
/// alias so call sites don't spell out the generic each time.
pub fn buffered<R: tokio::io::AsyncRead + Unpin>(reader: R) -> BufReader<R> {
    BufReader::new(reader)
}
