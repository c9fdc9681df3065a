// SPDX-License-Identifier: MIT

//! LLM Agent - prompt template agent
//!
//! Renders its template with the run input and sends a single user
//! message to the model.

use super::Agent;
use crate::adk::error::ExplorerError;
use crate::adk::model::{Content, GenerationConfig, Model};
use async_trait::async_trait;
use std::sync::Arc;

/// Placeholder substituted with the agent input
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Prompt-template LLM agent
pub struct LLMAgent {
    pub name: String,
    pub description: String,
    pub template: String,
    pub model: Arc<dyn Model>,
    pub generation: Option<GenerationConfig>,
}

impl LLMAgent {
    pub fn new(
        name: String,
        description: String,
        template: String,
        model: Arc<dyn Model>,
    ) -> Self {
        Self {
            name,
            description,
            template,
            model,
            generation: None,
        }
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation = Some(config);
        self
    }

    /// Render the template. Templates without a placeholder get the input appended.
    pub fn render(&self, input: &str) -> String {
        if self.template.contains(INPUT_PLACEHOLDER) {
            self.template.replace(INPUT_PLACEHOLDER, input)
        } else {
            format!("{}\n\n{}", self.template, input)
        }
    }
}

#[async_trait]
impl Agent for LLMAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: String) -> Result<String, ExplorerError> {
        let history = [Content::user(self.render(&input))];

        log::info!("Agent {} sending prompt", self.name);
        let response = self
            .model
            .generate_content(&history, self.generation.as_ref())
            .await?;

        let text = response.text();
        if text.trim().is_empty() {
            log::warn!("Agent {} received empty response", self.name);
            return Err(ExplorerError::EmptyResponse(self.name.clone()));
        }

        log::info!(
            "Agent {} returning text response (length: {}, preview: '{}')",
            self.name,
            text.len(),
            text.chars().take(100).collect::<String>()
        );
        Ok(text)
    }
}
