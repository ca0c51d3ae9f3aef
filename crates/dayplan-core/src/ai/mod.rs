//! Assistant features backed by a hosted language model.
//!
//! Two request/response capabilities are exposed through the [`Assistant`]
//! trait: suggesting a priority and deadline for a task, and rearranging the
//! timetable around outstanding tasks. Both are fixed prompt templates sent
//! to the model; [`HostedModelClient`] is the HTTP implementation and tests
//! substitute their own.

pub mod client;
pub mod prompt;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Priority;

pub use client::HostedModelClient;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Assistant is not configured")]
    NotConfigured,

    #[error("Assistant request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unusable assistant reply: {0}")]
    InvalidReply(String),
}

/// Suggested details for a task that is being drafted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSuggestion {
    pub priority: Priority,
    pub deadline: NaiveDate,
}

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Suggest priority and deadline from a task description and the
    /// user's schedule rendered as text.
    async fn suggest(&self, task_description: &str, schedule: &str) -> Result<TaskSuggestion, AiError>;

    /// Return a rearranged schedule, as free text.
    async fn optimize(&self, tasks: &str, timetable: &str) -> Result<String, AiError>;
}
