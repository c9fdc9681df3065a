// SPDX-License-Identifier: MIT

//! Use-case registry
//!
//! Maps each runnable use case to the agent that implements it:
//! - `single-agent` - one prompt, one answer
//! - `multi-agent` - researcher → writer → editor
//! - `cyclic-graph` - resume qualification through the retry evaluator

use crate::adk::agent::{Agent, LLMAgent, SequentialAgent};
use crate::adk::error::ExplorerError;
use crate::adk::model::Model;
use crate::explorer::config::ExplorerConfig;
use crate::explorer::review::{RetryEvaluator, ReviewAgent};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const SINGLE_AGENT_TEMPLATE: &str = "Answer the following question: {input}";
const RESEARCHER_TEMPLATE: &str =
    "Research the latest trends in {input}. Focus on identifying pros and cons and the overall narrative.";
const WRITER_TEMPLATE: &str =
    "Write an engaging article on {input}. Focus on the latest trends and how it's impacting the industry.";
const EDITOR_TEMPLATE: &str =
    "Edit the article on {input} for grammatical errors and ensure it's ready for publication.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseCase {
    SingleAgent,
    MultiAgent,
    CyclicGraph,
}

impl UseCase {
    pub const ALL: [UseCase; 3] = [
        UseCase::SingleAgent,
        UseCase::MultiAgent,
        UseCase::CyclicGraph,
    ];

    pub fn id(self) -> &'static str {
        match self {
            UseCase::SingleAgent => "single-agent",
            UseCase::MultiAgent => "multi-agent",
            UseCase::CyclicGraph => "cyclic-graph",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            UseCase::SingleAgent => "Single Agent",
            UseCase::MultiAgent => "Multi-Agent",
            UseCase::CyclicGraph => "Resume Qualification Checker",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            UseCase::SingleAgent => "Answers a question with a single model call.",
            UseCase::MultiAgent => {
                "Researcher, writer and editor agents run in sequence on a topic."
            }
            UseCase::CyclicGraph => {
                "Reviews a resume against the job requirements until the model reaches a decision."
            }
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for UseCase {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "single-agent" | "single" => Ok(UseCase::SingleAgent),
            "multi-agent" | "multi" => Ok(UseCase::MultiAgent),
            "cyclic-graph" | "cyclic" | "review" => Ok(UseCase::CyclicGraph),
            _ => Err(ExplorerError::UnknownUseCase(s.to_string())),
        }
    }
}

/// Builds and runs use cases against one model and configuration
pub struct Pipelines {
    model: Arc<dyn Model>,
    config: Arc<ExplorerConfig>,
    evaluator: Arc<RetryEvaluator>,
}

impl Pipelines {
    pub fn new(model: Arc<dyn Model>, config: Arc<ExplorerConfig>) -> Self {
        let evaluator = Arc::new(RetryEvaluator::from_config(model.clone(), &config));
        Self {
            model,
            config,
            evaluator,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &RetryEvaluator {
        &self.evaluator
    }

    fn prompt_agent(&self, name: &str, description: &str, template: &str) -> LLMAgent {
        LLMAgent::new(
            name.to_string(),
            description.to_string(),
            template.to_string(),
            self.model.clone(),
        )
        .with_generation_config(self.config.model.generation_config())
    }

    pub fn single_agent(&self) -> LLMAgent {
        self.prompt_agent("agent", "Answers a question", SINGLE_AGENT_TEMPLATE)
    }

    pub fn multi_agent(&self) -> SequentialAgent {
        let stages: Vec<Arc<dyn Agent>> = vec![
            Arc::new(self.prompt_agent("researcher", "Researches a topic", RESEARCHER_TEMPLATE)),
            Arc::new(self.prompt_agent("writer", "Writes an article", WRITER_TEMPLATE)),
            Arc::new(self.prompt_agent("editor", "Edits the article", EDITOR_TEMPLATE)),
        ];
        SequentialAgent::new(
            "multi-agent".to_string(),
            "Researcher, writer and editor".to_string(),
            stages,
        )
    }

    /// Review agent; `criteria` falls back to the configured job description
    pub fn review_agent(&self, criteria: Option<String>) -> ReviewAgent {
        ReviewAgent::new(
            "review".to_string(),
            criteria.unwrap_or_else(|| self.config.review.criteria.clone()),
            self.evaluator.clone(),
        )
    }

    pub fn build(&self, use_case: UseCase) -> Arc<dyn Agent> {
        match use_case {
            UseCase::SingleAgent => Arc::new(self.single_agent()),
            UseCase::MultiAgent => Arc::new(self.multi_agent()),
            UseCase::CyclicGraph => Arc::new(self.review_agent(None)),
        }
    }

    /// Run a use case and return its named outputs
    pub async fn run(&self, use_case: UseCase, input: String) -> Result<Value, ExplorerError> {
        log::info!("Running use case {}", use_case);
        match use_case {
            UseCase::SingleAgent => {
                let output = self.single_agent().run(input).await?;
                Ok(json!({ "output": output }))
            }
            UseCase::MultiAgent => {
                let stages = self.multi_agent().run_stages(input).await?;
                let output = |i: usize| stages.get(i).map(|s| s.output.clone());
                Ok(json!({
                    "research_output": output(0),
                    "writer_output": output(1),
                    "editor_output": output(2),
                }))
            }
            UseCase::CyclicGraph => {
                let verdict = self
                    .evaluator
                    .evaluate(&self.config.review.criteria, &input)
                    .await?;
                Ok(serde_json::to_value(verdict)?)
            }
        }
    }
}
