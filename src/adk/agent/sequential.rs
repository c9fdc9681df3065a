// SPDX-License-Identifier: MIT

//! Sequential Agent - runs sub-agents in order, each one receiving the
//! previous agent's output as input.

use super::{Agent, AgentEvent};
use crate::adk::error::ExplorerError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Output of one pipeline stage
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageOutput {
    pub name: String,
    pub output: String,
}

pub struct SequentialAgent {
    pub name: String,
    pub description: String,
    pub sub_agents: Vec<Arc<dyn Agent>>,
}

impl SequentialAgent {
    pub fn new(name: String, description: String, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            name,
            description,
            sub_agents,
        }
    }

    /// Run every stage and keep each stage's output
    pub async fn run_stages(&self, input: String) -> Result<Vec<StageOutput>, ExplorerError> {
        self.run_stages_inner(input, None).await
    }

    async fn run_stages_inner(
        &self,
        input: String,
        tx: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Result<Vec<StageOutput>, ExplorerError> {
        let mut stages = Vec::with_capacity(self.sub_agents.len());
        let mut current_input = input;

        for (i, agent) in self.sub_agents.iter().enumerate() {
            log::info!(
                "SequentialAgent {} stage {}/{}: {}",
                self.name,
                i + 1,
                self.sub_agents.len(),
                agent.name()
            );
            let output = agent.run(current_input).await?;

            if let Some(tx) = tx {
                let _ = tx
                    .send(AgentEvent::Stage {
                        name: agent.name().to_string(),
                        output: output.clone(),
                    })
                    .await;
            }

            stages.push(StageOutput {
                name: agent.name().to_string(),
                output: output.clone(),
            });
            current_input = output;
        }

        Ok(stages)
    }
}

#[async_trait]
impl Agent for SequentialAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: String) -> Result<String, ExplorerError> {
        let stages = self.run_stages(input.clone()).await?;
        // An empty pipeline is the identity
        Ok(stages.into_iter().last().map(|s| s.output).unwrap_or(input))
    }

    async fn run_stream(
        &self,
        input: String,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<String, ExplorerError> {
        match self.run_stages_inner(input.clone(), Some(&tx)).await {
            Ok(stages) => {
                let answer = stages.into_iter().last().map(|s| s.output).unwrap_or(input);
                let _ = tx.send(AgentEvent::Answer(answer.clone())).await;
                Ok(answer)
            }
            Err(e) => {
                let _ = tx.send(AgentEvent::Error(e.to_string())).await;
                Err(e)
            }
        }
    }
}
