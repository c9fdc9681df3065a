// SPDX-License-Identifier: MIT

//! Review agent - the retry evaluator behind the `Agent` trait
//!
//! The agent input is the subject text; the criteria are fixed at
//! construction. The output is the verdict serialized as JSON.

use super::evaluator::RetryEvaluator;
use super::state::EvaluationRequest;
use crate::adk::agent::{Agent, AgentEvent};
use crate::adk::error::ExplorerError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct ReviewAgent {
    name: String,
    criteria: String,
    evaluator: Arc<RetryEvaluator>,
}

impl ReviewAgent {
    pub fn new(name: String, criteria: String, evaluator: Arc<RetryEvaluator>) -> Self {
        Self {
            name,
            criteria,
            evaluator,
        }
    }

    pub fn criteria(&self) -> &str {
        &self.criteria
    }
}

#[async_trait]
impl Agent for ReviewAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: String) -> Result<String, ExplorerError> {
        let request = EvaluationRequest::new(self.criteria.clone(), input);
        let verdict = self.evaluator.evaluate_request(&request).await?;
        Ok(serde_json::to_string(&verdict)?)
    }

    async fn run_stream(
        &self,
        input: String,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<String, ExplorerError> {
        let _ = tx
            .send(AgentEvent::Log(format!(
                "Reviewing against criteria (max {} attempts)",
                self.evaluator.config().retry.attempts()
            )))
            .await;
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
