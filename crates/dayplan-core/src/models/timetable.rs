use serde::{Deserialize, Serialize};

use super::validation::{parse_time_of_day, require, Validate, ValidationError};
use super::{Collection, Record};

/// A slot in the daily schedule. Times are local `HH:MM` strings.
///
/// Overlapping entries are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: String,
    pub subject: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub subject: String,
    pub start_time: String,
    pub end_time: String,
}

impl TimetableEntry {
    pub fn from_draft(id: String, draft: EntryDraft) -> Self {
        Self {
            id,
            subject: draft.subject,
            start_time: draft.start_time,
            end_time: draft.end_time,
        }
    }

    pub fn schedule_line(&self) -> String {
        format!("{}-{} {}", self.start_time, self.end_time, self.subject)
    }
}

impl Record for TimetableEntry {
    const COLLECTION: Collection = Collection::Timetable;
    const TIMESTAMP_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> &str {
        &self.id
    }
}

fn validate_slot(subject: &str, start: &str, end: &str) -> Result<(), ValidationError> {
    require("Subject", subject)?;
    require("Start time", start)?;
    require("End time", end)?;
    let start_at = parse_time_of_day("Start time", start)?;
    let end_at = parse_time_of_day("End time", end)?;
    if end_at <= start_at {
        return Err(ValidationError::EndNotAfterStart {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

impl Validate for EntryDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_slot(&self.subject, &self.start_time, &self.end_time)
    }
}

impl Validate for TimetableEntry {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_slot(&self.subject, &self.start_time, &self.end_time)
    }
}

/// Entries ordered by start time, then end time. Unparseable times sort first.
pub fn sorted_by_start(entries: &[TimetableEntry]) -> Vec<&TimetableEntry> {
    let mut list: Vec<&TimetableEntry> = entries.iter().collect();
    list.sort_by_cached_key(|e| {
        (
            parse_time_of_day("Start time", &e.start_time).ok(),
            parse_time_of_day("End time", &e.end_time).ok(),
        )
    });
    list
}

/// Render the schedule as one `HH:MM-HH:MM subject` line per entry.
pub fn render_schedule(entries: &[TimetableEntry]) -> String {
    sorted_by_start(entries)
        .iter()
        .map(|e| e.schedule_line())
        .collect::<Vec<_>>()
        .join("\n")
}
