//! Client side of the socket protocol
//!
//! Used by the CLI and by tests. One connection per request: connect,
//! write one line, read one line.

use std::path::PathBuf;

use eyre::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;

use super::messages::{ApiRequest, ApiResponse};

/// Connects to a running service over its Unix socket
pub struct ServiceClient {
    socket_path: PathBuf,
}

impl ServiceClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    /// Send one request and wait for its response
    pub async fn request(&self, request: &ApiRequest) -> Result<ApiResponse> {
        debug!(?request, "request: called");
        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .context(format!("Failed to connect to {}", self.socket_path.display()))?;

        let request_json = serde_json::to_string(request).context("Failed to serialize request")?;
        stream
            .write_all(request_json.as_bytes())
            .await
            .context("Failed to write request")?;
        stream.write_all(b"\n").await.context("Failed to write newline")?;
        stream.flush().await.context("Failed to flush request")?;

        let mut reader = BufReader::new(&mut stream);
        let mut line = String::new();
        reader.read_line(&mut line).await.context("Failed to read response")?;

        let response: ApiResponse = serde_json::from_str(line.trim()).context("Failed to parse response")?;
        debug!(?response, "request: got response");
        Ok(response)
    }

    /// Ping the service; returns its version
    pub async fn ping(&self) -> Result<String> {
        match self.request(&ApiRequest::Ping).await? {
            ApiResponse::Pong { version } => Ok(version),
            other => bail!("Unexpected response to ping: {:?}", other),
        }
    }

    /// Request a graceful shutdown
    pub async fn shutdown(&self) -> Result<()> {
        match self.request(&ApiRequest::Shutdown).await? {
            ApiResponse::ShuttingDown => Ok(()),
            other => bail!("Unexpected response to shutdown: {:?}", other),
        }
    }
}
