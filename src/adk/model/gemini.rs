// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::env;

const PROVIDER: &str = "Gemini";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
}

impl GeminiModel {
    /// Create a new GeminiModel
    ///
    /// Requires `GOOGLE_API_KEY` environment variable to be set.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key =
            env::var("GOOGLE_API_KEY").map_err(|_| ModelError::ApiKeyMissing(PROVIDER.into()))?;
        Self::with_api_key(model_name, api_key)
    }

    /// Create a GeminiModel with an explicit API key
    pub fn with_api_key(model_name: String, api_key: String) -> Result<Self, ModelError> {
        if api_key.trim().is_empty() {
            return Err(ModelError::ApiKeyMissing(PROVIDER.into()));
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            BASE_URL, self.model_name, self.api_key
        );

        let body = build_request_body(history, config);

        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ModelError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(ModelError::Api {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                message: text,
            });
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        parse_response(&resp_json)
    }
}

/// Build the `generateContent` request body.
///
/// System messages are lifted into `systemInstruction`; Gemini rejects a
/// "system" role inside `contents`.
pub fn build_request_body(
    history: &[Content],
    config: Option<&GenerationConfig>,
) -> serde_json::Value {
    let system_parts: Vec<serde_json::Value> = history
        .iter()
        .filter(|c| c.role == "system")
        .flat_map(|c| c.parts.iter().filter_map(part_to_gemini_json))
        .collect();

    let contents: Vec<serde_json::Value> = history
        .iter()
        .filter(|c| c.role != "system")
        .map(|c| {
            let parts: Vec<serde_json::Value> =
                c.parts.iter().filter_map(part_to_gemini_json).collect();
            json!({ "role": c.role, "parts": parts })
        })
        .collect();

    let mut body = json!({ "contents": contents });

    if !system_parts.is_empty() {
        body["systemInstruction"] = json!({ "parts": system_parts });
    }

    if let Some(cfg) = config {
        let mut gen = serde_json::Map::new();
        if let Some(t) = cfg.temperature {
            gen.insert("temperature".into(), json!(t));
        }
        if let Some(m) = cfg.max_output_tokens {
            gen.insert("maxOutputTokens".into(), json!(m));
        }
        if let Some(p) = cfg.top_p {
            gen.insert("topP".into(), json!(p));
        }
        if let Some(k) = cfg.top_k {
            gen.insert("topK".into(), json!(k));
        }
        if !gen.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(gen);
        }
    }

    body
}

/// Turn a `generateContent` response into a model `Content`
pub fn parse_response(resp_json: &serde_json::Value) -> Result<Content, ModelError> {
    let candidate = resp_json["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| ModelError::InvalidResponse("No candidates in response".into()))?;

    if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
        log::debug!("Gemini finish reason: {}", finish_reason);
        if finish_reason == "SAFETY" {
            return Err(ModelError::InvalidResponse(
                "Gemini blocked response due to safety filters.".into(),
            ));
        }
    }

    let parts_json = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            log::error!("No content parts in candidate. Full response: {}", resp_json);
            ModelError::InvalidResponse(format!("No content in Gemini response: {}", candidate))
        })?;

    let parts = parts_json.iter().flat_map(parse_gemini_part).collect();

    Ok(Content {
        role: "model".to_string(),
        parts,
    })
}

/// Serialize a Part to Gemini API JSON format
/// Returns None for parts that shouldn't be sent (e.g., Thinking)
pub fn part_to_gemini_json(part: &Part) -> Option<serde_json::Value> {
    match part {
        Part::Text(t) => Some(json!({ "text": t })),
        Part::Thinking(_) => None, // Thinking is internal, not sent to API
    }
}

/// Parse a Gemini API JSON part into parts
pub fn parse_gemini_part(p: &serde_json::Value) -> Vec<Part> {
    let mut parts = Vec::new();

    if let Some(thought) = p.get("thought").and_then(|t| t.as_str()) {
        if !thought.is_empty() {
            parts.push(Part::Thinking(thought.to_string()));
        }
    }

    if let Some(text) = p["text"].as_str() {
        parts.push(Part::Text(text.to_string()));
    }

    parts
}
