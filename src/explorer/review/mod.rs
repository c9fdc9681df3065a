// SPDX-License-Identifier: MIT

//! Resume qualification review
//!
//! This module provides:
//! - `RetryEvaluator` - bounded loop asking the model for a decision
//! - `ReviewAgent` - the evaluator exposed as an `Agent` for the use-case registry
//! - block helpers for the fenced json verdict format

mod agent;
pub mod block;
mod diagnostic;
mod evaluator;
mod retry;
mod state;

pub use agent::ReviewAgent;
pub use block::StructuredVerdict;
pub use diagnostic::{DiagnosticSink, FileSink, NullSink};
pub use evaluator::{build_review_prompt, RetryEvaluator, Verdict};
pub use retry::RetryPolicy;
pub use state::{Decision, EvaluationRequest, EvaluationState, Phase};
