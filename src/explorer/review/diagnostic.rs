// SPDX-License-Identifier: MIT

//! Diagnostic sink for raw model responses

use async_trait::async_trait;
use std::path::PathBuf;

/// Receives the raw text of every model response
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    async fn record(&self, raw_response: &str) -> std::io::Result<()>;
}

/// Writes the latest response to a file, replacing what was there
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl DiagnosticSink for FileSink {
    async fn record(&self, raw_response: &str) -> std::io::Result<()> {
        tokio::fs::write(&self.path, raw_response).await
    }
}

/// Discards everything
pub struct NullSink;

#[async_trait]
impl DiagnosticSink for NullSink {
    async fn record(&self, _raw_response: &str) -> std::io::Result<()> {
        Ok(())
    }
}
