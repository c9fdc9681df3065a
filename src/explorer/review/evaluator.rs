// SPDX-License-Identifier: MIT

//! Conditional retry evaluator
//!
//! Asks the model whether a subject satisfies some criteria and keeps asking
//! until the structured reply carries a decision. Every loop is bounded:
//! decision attempts by `RetryPolicy::max_attempts`, service failures by
//! `RetryPolicy::service_retries`, each call by `call_timeout_ms` and the
//! whole evaluation by `deadline_ms` when set.

use super::block;
use super::diagnostic::{DiagnosticSink, FileSink, NullSink};
use super::state::{Decision, EvaluationRequest, EvaluationState};
use crate::adk::error::{ModelError, ReviewError};
use crate::adk::model::{Content, GenerationConfig, Model};
use crate::explorer::config::{ExplorerConfig, MalformedOutputPolicy, RetryMode, ReviewConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const INCONCLUSIVE_FOLLOW_UP: &str = "Your previous answer did not contain a decision. \
Decide now: set \"decision\" to true or false and explain why in \"reason\". \
Use the same ```json format.";

const MALFORMED_FOLLOW_UP: &str = "Your previous answer could not be read. \
Reply with exactly one ```json block following the required format.";

/// Final outcome of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub approved: bool,
    pub reason: String,
    /// Model requests it took to reach the decision
    pub attempts: u32,
}

/// Build the evaluation prompt for a request
pub fn build_review_prompt(request: &EvaluationRequest) -> String {
    format!(
        r#"Requirements:
{}

Candidate:
{}

Does the candidate meet the requirements?

Respond ONLY with a JSON object in this exact format, inside a fenced block labeled json:

```json
{{
  "decision": true,
  "reason": "Provide a clear explanation for the decision."
}}
```

Set "decision" to true if the requirements are met and false if they are not. Use null only if you cannot decide.
No other text outside the block."#,
        request.criteria().trim(),
        request.subject().trim()
    )
}

pub struct RetryEvaluator {
    model: Arc<dyn Model>,
    config: ReviewConfig,
    generation: Option<GenerationConfig>,
    sink: Arc<dyn DiagnosticSink>,
}

impl RetryEvaluator {
    pub fn new(model: Arc<dyn Model>, config: ReviewConfig) -> Self {
        let sink: Arc<dyn DiagnosticSink> = match &config.diagnostic_path {
            Some(path) => Arc::new(FileSink::new(path)),
            None => Arc::new(NullSink),
        };
        Self {
            model,
            config,
            generation: None,
            sink,
        }
    }

    pub fn from_config(model: Arc<dyn Model>, config: &ExplorerConfig) -> Self {
        Self::new(model, config.review.clone())
            .with_generation_config(config.model.generation_config())
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Judge `subject` against `criteria`
    pub async fn evaluate(&self, criteria: &str, subject: &str) -> Result<Verdict, ReviewError> {
        self.evaluate_request(&EvaluationRequest::new(criteria, subject))
            .await
    }

    pub async fn evaluate_request(
        &self,
        request: &EvaluationRequest,
    ) -> Result<Verdict, ReviewError> {
        let mut state = EvaluationState::new();

        let result = match self.config.deadline_ms {
            Some(ms) => {
                let outcome =
                    tokio::time::timeout(Duration::from_millis(ms), self.run_loop(request, &mut state))
                        .await;
                match outcome {
                    Ok(res) => res,
                    Err(_) => {
                        state.fail()?;
                        Err(ReviewError::DeadlineExceeded(ms))
                    }
                }
            }
            None => self.run_loop(request, &mut state).await,
        };

        match &result {
            Ok(v) => log::info!(
                "Evaluation decided approved={} after {} attempt(s)",
                v.approved,
                v.attempts
            ),
            Err(e) => log::error!(
                "Evaluation failed after {} attempt(s): {}",
                state.attempts(),
                e
            ),
        }
        result
    }

    async fn run_loop(
        &self,
        request: &EvaluationRequest,
        state: &mut EvaluationState,
    ) -> Result<Verdict, ReviewError> {
        let max_attempts = self.config.retry.attempts();
        let mut history = vec![Content::user(build_review_prompt(request))];
        let mut last_failure: Option<String> = None;

        loop {
            if state.attempts() >= max_attempts {
                state.fail()?;
                return Err(ReviewError::MaxRetriesExceeded {
                    attempts: state.attempts(),
                    last_failure,
                });
            }

            if state.attempts() > 0 {
                let delay = self.config.retry.backoff(state.attempts());
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            state.request_sent()?;
            log::info!("Review attempt {}/{}", state.attempts(), max_attempts);

            let response = match self.call_model(&history).await {
                Ok(response) => response,
                Err(e) => {
                    state.fail()?;
                    return Err(e);
                }
            };

            let raw = response.text();
            if let Err(e) = self.sink.record(&raw).await {
                log::warn!("Failed to write diagnostic response: {}", e);
            }
            state.record_response(raw.clone());

            match block::parse_response(&raw) {
                Ok(verdict) => {
                    if state.apply(verdict.decision, verdict.reason)? {
                        return Ok(Verdict {
                            approved: state.decision() == Decision::Approved,
                            reason: state.reason().to_string(),
                            attempts: state.attempts(),
                        });
                    }
                    log::info!(
                        "No decision in attempt {}, reviewing again",
                        state.attempts()
                    );
                    last_failure = None;
                    self.extend_history(&mut history, raw, INCONCLUSIVE_FOLLOW_UP);
                }
                Err(e)
                    if e.is_malformed_output()
                        && self.config.malformed_output == MalformedOutputPolicy::Retry =>
                {
                    log::warn!("Attempt {} returned unusable output: {}", state.attempts(), e);
                    last_failure = Some(e.to_string());
                    state.retry()?;
                    self.extend_history(&mut history, raw, MALFORMED_FOLLOW_UP);
                }
                Err(e) => {
                    state.fail()?;
                    return Err(e);
                }
            }
        }
    }

    /// Accumulate mode keeps the conversation; stateless mode re-sends the
    /// original request unchanged.
    fn extend_history(&self, history: &mut Vec<Content>, raw: String, follow_up: &str) {
        if self.config.mode == RetryMode::Accumulate {
            history.push(Content::model(raw));
            history.push(Content::user(follow_up));
        }
    }

    /// One model request, retrying transient service failures with backoff
    async fn call_model(&self, history: &[Content]) -> Result<Content, ReviewError> {
        let timeout = Duration::from_millis(self.config.call_timeout_ms);
        let mut tries = 0;

        loop {
            tries += 1;
            let result = match tokio::time::timeout(
                timeout,
                self.model
                    .generate_content(history, self.generation.as_ref()),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ModelError::Timeout(self.config.call_timeout_ms)),
            };

            match result {
                Ok(content) => return Ok(content),
                Err(e) if e.is_transient() && tries <= self.config.retry.service_retries => {
                    let mut delay = self.config.retry.backoff(tries);
                    if let ModelError::RateLimited {
                        retry_after_secs: Some(secs),
                    } = &e
                    {
                        delay = delay.max(Duration::from_secs(*secs));
                    }
                    log::warn!(
                        "Model call failed ({}), retry {}/{} in {:?}",
                        e,
                        tries,
                        self.config.retry.service_retries,
                        delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    return Err(ReviewError::ServiceUnavailable {
                        attempts: tries,
                        source: e,
                    })
                }
            }
        }
    }
}
