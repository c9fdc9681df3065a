// SPDX-License-Identifier: MIT

//! Agent module - defines agent types for AI workflows
//!
//! This module provides the core Agent trait and implementations:
//! - `LLMAgent` - Prompt-template agent, one model call per run
//! - `SequentialAgent` - Chains agents, feeding each output to the next

mod llm;
mod sequential;

pub use llm::LLMAgent;
pub use sequential::{SequentialAgent, StageOutput};

use crate::adk::error::ExplorerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AgentEvent {
    Stage { name: String, output: String },
    Answer(String),
    Error(String),
    Log(String),
}

/// Core agent trait for all agent types
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent name
    fn name(&self) -> &str;

    /// Run the agent with the given input
    async fn run(&self, input: String) -> Result<String, ExplorerError>;

    /// Run the agent with streaming events
    async fn run_stream(
        &self,
        input: String,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<String, ExplorerError> {
        // Default implementation falls back to run()
        match self.run(input).await {
            Ok(res) => {
                let _ = tx.send(AgentEvent::Answer(res.clone())).await;
                Ok(res)
            }
            Err(e) => {
                let _ = tx.send(AgentEvent::Error(e.to_string())).await;
                Err(e)
            }
        }
    }
}
