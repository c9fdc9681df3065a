// SPDX-License-Identifier: MIT

//! agent-explorer-rs - prompt chains and a bounded review loop over an LLM
//!
//! - [adk] - model client, agent trait and basic agents
//! - [explorer] - configuration, use cases, the retry evaluator and the HTTP API

pub mod adk;
pub mod explorer;
