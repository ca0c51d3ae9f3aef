use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{require, Validate, ValidationError};
use super::{Collection, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Set once at creation; edits keep the original value.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl Note {
    pub fn from_draft(id: String, draft: NoteDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            created_at,
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.content.to_lowercase().contains(&query)
    }
}

impl Record for Note {
    const COLLECTION: Collection = Collection::Notes;
    const TIMESTAMP_FIELDS: &'static [&'static str] = &["createdAt"];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Validate for NoteDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require("Title", &self.title)
    }
}

impl Validate for Note {
    fn validate(&self) -> Result<(), ValidationError> {
        require("Title", &self.title)
    }
}

/// Notes matching `query`, newest first.
pub fn filter_and_sort<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let mut list: Vec<&Note> = notes.iter().filter(|n| n.matches(query)).collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    list
}
