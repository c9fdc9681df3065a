// SPDX-License-Identifier: MIT

pub mod config;
pub mod pipelines;
pub mod review;
pub mod server;
