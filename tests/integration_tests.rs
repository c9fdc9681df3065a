//! Integration tests for the review loop and the use-case pipelines
//!
//! These tests drive the public API end to end with a scripted model.

use agent_explorer_rs::adk::agent::{Agent, AgentEvent};
use agent_explorer_rs::adk::error::{ExplorerError, ModelError, ReviewError};
use agent_explorer_rs::adk::model::{Content, GenerationConfig, Model, Part};
use agent_explorer_rs::explorer::config::{ExplorerConfig, MalformedOutputPolicy, ReviewConfig};
use agent_explorer_rs::explorer::pipelines::{Pipelines, UseCase};
use agent_explorer_rs::explorer::review::block::render_block;
use agent_explorer_rs::explorer::review::{
    DiagnosticSink, RetryEvaluator, RetryPolicy, StructuredVerdict,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Components
// ============================================================================

/// Mock model that returns predefined responses
struct MockModel {
    responses: Vec<Content>,
    response_index: AtomicUsize,
}

impl MockModel {
    fn new(responses: Vec<Content>) -> Self {
        Self {
            responses,
            response_index: AtomicUsize::new(0),
        }
    }

    fn text_response(text: &str) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part::Text(text.to_string())],
        }
    }

    fn verdict_response(decision: Option<bool>, reason: &str) -> Content {
        Self::text_response(&render_block(&StructuredVerdict {
            decision,
            reason: reason.to_string(),
        }))
    }

    fn calls(&self) -> usize {
        self.response_index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_content(
        &self,
        _history: &[Content],
        _config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        let idx = self.response_index.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(idx)
            .cloned()
            .ok_or_else(|| ModelError::InvalidResponse("Max responses reached".into()))
    }
}

/// Keeps every recorded response in memory
#[derive(Default)]
struct MemorySink {
    records: Mutex<Vec<String>>,
}

#[async_trait]
impl DiagnosticSink for MemorySink {
    async fn record(&self, raw_response: &str) -> std::io::Result<()> {
        self.records.lock().unwrap().push(raw_response.to_string());
        Ok(())
    }
}

fn review_config(max_attempts: u32) -> ReviewConfig {
    ReviewConfig {
        retry: RetryPolicy::immediate(max_attempts),
        diagnostic_path: None,
        ..ReviewConfig::default()
    }
}

// ============================================================================
// Retry evaluator
// ============================================================================

#[tokio::test]
async fn test_python_experience_scenario() {
    let model = Arc::new(MockModel::new(vec![MockModel::verdict_response(
        Some(true),
        "meets experience requirement",
    )]));
    let evaluator = RetryEvaluator::new(model.clone(), review_config(5));

    let verdict = evaluator
        .evaluate(
            "requires 3 years Python experience",
            "5 years Python, 2 years Go",
        )
        .await
        .unwrap();

    assert!(verdict.approved);
    assert_eq!(verdict.reason, "meets experience requirement");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_undecided_sequence_then_decision() {
    for n in 0..4 {
        let mut responses: Vec<Content> = (0..n)
            .map(|_| MockModel::verdict_response(None, "cannot tell yet"))
            .collect();
        responses.push(MockModel::verdict_response(Some(false), "no AWS or GCP"));
        let model = Arc::new(MockModel::new(responses));

        let verdict = RetryEvaluator::new(model.clone(), review_config(10))
            .evaluate("cloud experience", "on-prem only")
            .await
            .unwrap();

        assert!(!verdict.approved);
        assert_eq!(verdict.reason, "no AWS or GCP");
        assert_eq!(model.calls(), n + 1);
    }
}

#[tokio::test]
async fn test_never_decides_with_bound() {
    let responses = (0..20)
        .map(|_| MockModel::verdict_response(None, "hmm"))
        .collect();
    let model = Arc::new(MockModel::new(responses));

    let err = RetryEvaluator::new(model.clone(), review_config(6))
        .evaluate("criteria", "subject")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReviewError::MaxRetriesExceeded { attempts: 6, .. }
    ));
    assert_eq!(model.calls(), 6);
}

#[tokio::test]
async fn test_missing_block_never_defaults() {
    let responses = vec![MockModel::text_response("Approved! Great candidate.")];

    let fail_model = Arc::new(MockModel::new(responses.clone()));
    let config = ReviewConfig {
        malformed_output: MalformedOutputPolicy::Fail,
        ..review_config(3)
    };
    let err = RetryEvaluator::new(fail_model, config)
        .evaluate("criteria", "subject")
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::Format));

    // under the retry policy the script runs out and the service error surfaces
    let retry_model = Arc::new(MockModel::new(responses));
    let err = RetryEvaluator::new(retry_model.clone(), review_config(3))
        .evaluate("criteria", "subject")
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::ServiceUnavailable { .. }));
}

#[tokio::test]
async fn test_diagnostic_sink_sees_every_response() {
    let first = MockModel::verdict_response(None, "first");
    let second = MockModel::verdict_response(Some(true), "second");
    let model = Arc::new(MockModel::new(vec![first.clone(), second.clone()]));
    let sink = Arc::new(MemorySink::default());

    RetryEvaluator::new(model, review_config(5))
        .with_sink(sink.clone())
        .evaluate("criteria", "subject")
        .await
        .unwrap();

    let records = sink.records.lock().unwrap();
    assert_eq!(*records, vec![first.text(), second.text()]);
}

// ============================================================================
// Use-case pipelines
// ============================================================================

fn pipelines(responses: Vec<Content>) -> (Pipelines, Arc<MockModel>) {
    let model = Arc::new(MockModel::new(responses));
    let mut config = ExplorerConfig::default();
    config.review = review_config(3);
    (Pipelines::new(model.clone(), Arc::new(config)), model)
}

#[tokio::test]
async fn test_single_agent_pipeline() {
    let (pipelines, model) = pipelines(vec![MockModel::text_response("Paris")]);

    let out = pipelines
        .run(UseCase::SingleAgent, "Capital of France?".into())
        .await
        .unwrap();

    assert_eq!(out["output"], "Paris");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_multi_agent_pipeline_outputs() {
    let (pipelines, model) = pipelines(vec![
        MockModel::text_response("research notes"),
        MockModel::text_response("draft article"),
        MockModel::text_response("final article"),
    ]);

    let out = pipelines
        .run(UseCase::MultiAgent, "quantum computing".into())
        .await
        .unwrap();

    assert_eq!(out["research_output"], "research notes");
    assert_eq!(out["writer_output"], "draft article");
    assert_eq!(out["editor_output"], "final article");
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn test_multi_agent_stage_failure_propagates() {
    let (pipelines, _) = pipelines(vec![MockModel::text_response("research notes")]);

    let err = pipelines
        .run(UseCase::MultiAgent, "topic".into())
        .await
        .unwrap_err();
    assert!(matches!(err, ExplorerError::Model(_)));
}

#[tokio::test]
async fn test_cyclic_graph_pipeline() {
    let (pipelines, model) = pipelines(vec![
        MockModel::verdict_response(None, "need more info"),
        MockModel::verdict_response(Some(true), "strong Python and AWS"),
    ]);

    let out = pipelines
        .run(UseCase::CyclicGraph, "Python, Django, AWS, Docker".into())
        .await
        .unwrap();

    assert_eq!(out["approved"], true);
    assert_eq!(out["reason"], "strong Python and AWS");
    assert_eq!(out["attempts"], 2);
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn test_streamed_review_agent() {
    let (pipelines, _) = pipelines(vec![MockModel::verdict_response(
        Some(false),
        "no containers",
    )]);
    let agent = pipelines.build(UseCase::CyclicGraph);
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);

    let out = agent.run_stream("resume".into(), tx).await.unwrap();
    assert!(out.contains("no containers"));

    let mut saw_answer = false;
    while let Some(event) = rx.recv().await {
        if let AgentEvent::Answer(answer) = event {
            assert_eq!(answer, out);
            saw_answer = true;
        }
    }
    assert!(saw_answer);
}
