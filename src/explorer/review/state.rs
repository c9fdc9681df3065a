// SPDX-License-Identifier: MIT

//! Evaluation request and per-run state

use crate::adk::error::ReviewError;
use serde::{Deserialize, Serialize};

/// Immutable criteria/subject pair, fixed for the whole loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    criteria: String,
    subject: String,
}

impl EvaluationRequest {
    pub fn new(criteria: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            criteria: criteria.into(),
            subject: subject.into(),
        }
    }

    pub fn criteria(&self) -> &str {
        &self.criteria
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Tri-state decision field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    #[default]
    Unset,
    Approved,
    Rejected,
}

impl From<Option<bool>> for Decision {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Decision::Unset,
            Some(true) => Decision::Approved,
            Some(false) => Decision::Rejected,
        }
    }
}

impl Decision {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Decision::Unset => None,
            Decision::Approved => Some(true),
            Decision::Rejected => Some(false),
        }
    }
}

/// Evaluator state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    AwaitingRequest,
    AwaitingResponse,
    Decided,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Decided | Phase::Failed)
    }

    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (AwaitingRequest, AwaitingResponse)
                | (AwaitingRequest, Failed)
                | (AwaitingResponse, AwaitingRequest)
                | (AwaitingResponse, Decided)
                | (AwaitingResponse, Failed)
        )
    }
}

/// Mutable record for one `evaluate` call
#[derive(Debug, Clone)]
pub struct EvaluationState {
    phase: Phase,
    attempts: u32,
    last_response: Option<String>,
    decision: Decision,
    reason: String,
}

impl Default for EvaluationState {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationState {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingRequest,
            attempts: 0,
            last_response: None,
            decision: Decision::Unset,
            reason: String::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Requests sent so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    fn transition(&mut self, next: Phase) -> Result<(), ReviewError> {
        if !self.phase.can_transition_to(next) {
            return Err(ReviewError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        log::debug!("Evaluation phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// A request is on its way to the model
    pub fn request_sent(&mut self) -> Result<(), ReviewError> {
        self.transition(Phase::AwaitingResponse)?;
        self.attempts += 1;
        Ok(())
    }

    /// Keep the raw text of the latest response
    pub fn record_response(&mut self, raw: String) {
        self.last_response = Some(raw);
    }

    /// Apply a parsed decision; returns true when the loop should stop
    pub fn apply(&mut self, decision: Option<bool>, reason: String) -> Result<bool, ReviewError> {
        self.decision = Decision::from(decision);
        self.reason = reason;
        if self.decision == Decision::Unset {
            self.transition(Phase::AwaitingRequest)?;
            Ok(false)
        } else {
            self.transition(Phase::Decided)?;
            Ok(true)
        }
    }

    /// Malformed output tolerated by the retry policy
    pub fn retry(&mut self) -> Result<(), ReviewError> {
        self.transition(Phase::AwaitingRequest)
    }

    pub fn fail(&mut self) -> Result<(), ReviewError> {
        self.transition(Phase::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = EvaluationState::new();
        assert_eq!(state.phase(), Phase::AwaitingRequest);
        assert_eq!(state.decision(), Decision::Unset);
        assert_eq!(state.attempts(), 0);
        assert!(state.last_response().is_none());
    }

    #[test]
    fn test_null_decision_loops_back() {
        let mut state = EvaluationState::new();
        state.request_sent().unwrap();
        assert!(!state.apply(None, "need more info".into()).unwrap());
        assert_eq!(state.phase(), Phase::AwaitingRequest);

        state.request_sent().unwrap();
        assert!(state.apply(Some(false), "no cloud experience".into()).unwrap());
        assert_eq!(state.phase(), Phase::Decided);
        assert_eq!(state.decision(), Decision::Rejected);
        assert_eq!(state.attempts(), 2);
        assert!(state.phase().is_terminal());
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut state = EvaluationState::new();
        state.request_sent().unwrap();
        state.apply(Some(true), "ok".into()).unwrap();

        let err = state.request_sent().unwrap_err();
        assert!(matches!(
            err,
            ReviewError::InvalidTransition {
                from: Phase::Decided,
                to: Phase::AwaitingResponse
            }
        ));
        assert!(state.fail().is_err());
    }

    #[test]
    fn test_cannot_decide_without_request() {
        let mut state = EvaluationState::new();
        assert!(state.apply(Some(true), "early".into()).is_err());
    }

    #[test]
    fn test_fail_from_either_live_phase() {
        let mut waiting = EvaluationState::new();
        waiting.fail().unwrap();
        assert_eq!(waiting.phase(), Phase::Failed);

        let mut in_flight = EvaluationState::new();
        in_flight.request_sent().unwrap();
        in_flight.fail().unwrap();
        assert_eq!(in_flight.phase(), Phase::Failed);
    }

    #[test]
    fn test_decision_conversions() {
        assert_eq!(Decision::from(Some(true)), Decision::Approved);
        assert_eq!(Decision::from(None).as_bool(), None);
        assert_eq!(Decision::Rejected.as_bool(), Some(false));
    }
}
