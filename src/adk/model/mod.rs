// SPDX-License-Identifier: MIT

//! Model module - defines LLM model trait and implementations
//!
//! This module provides the core Model trait and shared types.
//! Model implementations are in their own submodules:
//! - [gemini] - Google's Gemini API

pub mod gemini;

use crate::adk::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts, thinking excluded
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Thinking(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Parts of a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Thinking/reasoning content from thinking models (e.g., Gemini's thinking mode)
    Thinking(String),
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError>;
}
