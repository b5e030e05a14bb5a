//! Month-to-date AWS spend, posted to Slack.

pub mod billing;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod sink;

pub use error::{Error, Result};
