use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{require, Validate, ValidationError};
use super::{Collection, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub deadline: DateTime<Utc>,
}

impl Task {
    /// Build a new, not yet completed task from a draft
    pub fn from_draft(id: String, draft: TaskDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            deadline: draft.deadline,
            completed: false,
        }
    }

    /// Case-insensitive match against title and description
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }

    /// One-line summary used when describing tasks to the assistant
    pub fn summary_line(&self) -> String {
        let status = if self.completed { " [done]" } else { "" };
        format!(
            "{} ({}, due {}){}",
            self.title,
            self.priority,
            self.deadline.format("%Y-%m-%d"),
            status
        )
    }
}

impl Record for Task {
    const COLLECTION: Collection = Collection::Tasks;
    const TIMESTAMP_FIELDS: &'static [&'static str] = &["deadline"];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Validate for TaskDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require("Title", &self.title)?;
        require("Description", &self.description)
    }
}

impl Validate for Task {
    fn validate(&self) -> Result<(), ValidationError> {
        require("Title", &self.title)?;
        require("Description", &self.description)
    }
}

/// Tasks matching `query`, incomplete first, then by earliest deadline.
pub fn filter_and_sort<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let mut list: Vec<&Task> = tasks.iter().filter(|t| t.matches(query)).collect();
    list.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then_with(|| a.deadline.cmp(&b.deadline))
    });
    list
}
