// SPDX-License-Identifier: MIT

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::adk::agent::AgentEvent;
use crate::adk::error::{ExplorerError, ReviewError};
use crate::explorer::pipelines::{Pipelines, UseCase};

type ApiResponse = (StatusCode, Json<Value>);

pub fn router(pipelines: Arc<Pipelines>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/use-cases", get(list_use_cases))
        .route("/api/executions", post(create_execution))
        .route("/api/executions/stream", post(stream_execution))
        .route("/api/reviews", post(create_review))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(pipelines)
}

pub async fn serve(pipelines: Arc<Pipelines>, port: u16) -> Result<(), ExplorerError> {
    let app = router(pipelines);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_use_cases() -> Json<Value> {
    let use_cases: Vec<Value> = UseCase::ALL
        .iter()
        .map(|u| {
            json!({
                "id": u.id(),
                "title": u.title(),
                "description": u.description(),
            })
        })
        .collect();
    Json(json!(use_cases))
}

#[derive(Deserialize)]
struct ExecutionRequest {
    use_case: String,
    input: String,
}

#[derive(Deserialize)]
struct ReviewRequest {
    subject: String,
    criteria: Option<String>,
}

fn validate_execution(payload: &ExecutionRequest) -> Result<UseCase, ApiResponse> {
    let use_case = payload
        .use_case
        .parse::<UseCase>()
        .map_err(|e| error_response(&e))?;
    if payload.input.trim().is_empty() {
        return Err(bad_request("Please enter a prompt or input text."));
    }
    Ok(use_case)
}

async fn create_execution(
    State(pipelines): State<Arc<Pipelines>>,
    Json(payload): Json<ExecutionRequest>,
) -> ApiResponse {
    let use_case = match validate_execution(&payload) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let id = Uuid::new_v4();
    log::info!("Execution {} started for {}", id, use_case);

    match pipelines.run(use_case, payload.input).await {
        Ok(outputs) => (
            StatusCode::OK,
            Json(json!({
                "id": id.to_string(),
                "status": "completed",
                "use_case": use_case.id(),
                "outputs": outputs,
            })),
        ),
        Err(e) => {
            log::error!("Execution {} failed: {}", id, e);
            error_response(&e)
        }
    }
}

async fn stream_execution(
    State(pipelines): State<Arc<Pipelines>>,
    Json(payload): Json<ExecutionRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiResponse> {
    let use_case = validate_execution(&payload)?;
    let (tx, rx) = mpsc::channel(100);

    tokio::spawn(async move {
        log::info!("Starting streaming execution for use case: {}", use_case);
        let agent = pipelines.build(use_case);
        if let Err(e) = agent.run_stream(payload.input, tx.clone()).await {
            log::error!("Streaming execution failed: {}", e);
        }
        log::info!("Streaming execution finished");
    });

    let stream = ReceiverStream::new(rx).map(|event: AgentEvent| {
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(1))))
}

async fn create_review(
    State(pipelines): State<Arc<Pipelines>>,
    Json(payload): Json<ReviewRequest>,
) -> ApiResponse {
    if payload.subject.trim().is_empty() {
        return bad_request("Subject text is required.");
    }
    let criteria = payload
        .criteria
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| pipelines.config().review.criteria.clone());

    let id = Uuid::new_v4();
    match pipelines
        .evaluator()
        .evaluate(&criteria, &payload.subject)
        .await
    {
        Ok(verdict) => (
            StatusCode::OK,
            Json(json!({
                "id": id.to_string(),
                "approved": verdict.approved,
                "reason": verdict.reason,
                "attempts": verdict.attempts,
            })),
        ),
        Err(e) => {
            log::error!("Review {} failed: {}", id, e);
            error_response(&ExplorerError::Review(e))
        }
    }
}

fn bad_request(message: &str) -> ApiResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message, "kind": "bad_request" })),
    )
}

fn error_response(err: &ExplorerError) -> ApiResponse {
    let (status, kind) = match err {
        ExplorerError::Review(review) => {
            let status = match review {
                ReviewError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ReviewError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
                ReviewError::Format
                | ReviewError::Parse { .. }
                | ReviewError::MaxRetriesExceeded { .. } => StatusCode::BAD_GATEWAY,
                ReviewError::InvalidTransition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, review.kind())
        }
        ExplorerError::Model(_) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
        ExplorerError::EmptyResponse(_) => (StatusCode::BAD_GATEWAY, "empty_response"),
        ExplorerError::UnknownUseCase(_) => (StatusCode::NOT_FOUND, "unknown_use_case"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    (status, Json(json!({ "error": err.to_string(), "kind": kind })))
}
