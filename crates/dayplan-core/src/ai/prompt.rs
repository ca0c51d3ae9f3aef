use chrono::NaiveDate;
use serde::Deserialize;

use super::{AiError, TaskSuggestion};

const SUGGEST_TEMPLATE: &str = "\
Based on the following task description and the user's current schedule, suggest an optimal task priority and deadline.

Task Description: {task_description}
Current Schedule: {current_schedule}

Consider the task description and current schedule to determine the most appropriate priority (High, Medium, Low) and deadline (YYYY-MM-DD).
Ensure the deadline takes into account the current schedule and the time needed to complete the task.

Output your suggestion in JSON format with the keys \"suggestedPriority\" and \"suggestedDeadline\".";

const OPTIMIZE_TEMPLATE: &str = "\
You are a timetable optimization expert. Given a list of tasks with deadlines and time estimates, and the current timetable schedule, suggest the most efficient arrangement of the schedule.

Tasks: {tasks}
Timetable: {timetable}

Optimize the timetable considering the deadlines and time estimates of the tasks. Return only the optimized timetable.";

/// Substitute `{name}` placeholders in one pass. Substituted text is never
/// re-scanned, so user input containing a placeholder stays literal.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];
        let hit = values.iter().find_map(|(name, value)| {
            let end = rest.strip_prefix('{')?.strip_prefix(*name)?.strip_prefix('}')?;
            Some((*value, end))
        });
        match hit {
            Some((value, end)) => {
                out.push_str(value);
                rest = end;
            }
            None => {
                out.push('{');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn suggest_prompt(task_description: &str, schedule: &str) -> String {
    fill(
        SUGGEST_TEMPLATE,
        &[("task_description", task_description), ("current_schedule", schedule)],
    )
}

pub fn optimize_prompt(tasks: &str, timetable: &str) -> String {
    fill(OPTIMIZE_TEMPLATE, &[("tasks", tasks), ("timetable", timetable)])
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionReply {
    suggested_priority: String,
    suggested_deadline: String,
}

/// Extract the suggestion object from the model's reply. Models often wrap
/// JSON in prose or code fences, so the outermost `{...}` span is used.
pub fn parse_suggestion(reply: &str) -> Result<TaskSuggestion, AiError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => return Err(AiError::InvalidReply("no JSON object in reply".to_string())),
    };

    let parsed: SuggestionReply = serde_json::from_str(json)
        .map_err(|e| AiError::InvalidReply(e.to_string()))?;

    let priority = parsed
        .suggested_priority
        .parse()
        .map_err(AiError::InvalidReply)?;

    // Accept a full timestamp as well; only the date part matters
    let date_part = parsed.suggested_deadline.get(..10).unwrap_or(parsed.suggested_deadline.as_str());
    let deadline = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
        AiError::InvalidReply(format!("bad deadline: {}", parsed.suggested_deadline))
    })?;

    Ok(TaskSuggestion { priority, deadline })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    #[test]
    fn test_prompts_fill_placeholders() {
        let p = suggest_prompt("Write the Q3 report", "09:00-09:15 Standup");
        assert!(p.contains("Task Description: Write the Q3 report"));
        assert!(p.contains("Current Schedule: 09:00-09:15 Standup"));
        assert!(!p.contains("{task_description}"));

        let p = optimize_prompt("Report (High, due 2026-03-05)", "12:00-13:00 Lunch");
        assert!(p.contains("Tasks: Report (High, due 2026-03-05)"));
        assert!(p.contains("Timetable: 12:00-13:00 Lunch"));
    }

    #[test]
    fn test_placeholder_in_input_stays_literal() {
        let p = suggest_prompt("Template {current_schedule} docs", "09:00-10:00 Gym");
        assert!(p.contains("Task Description: Template {current_schedule} docs"));
        assert_eq!(p.matches("09:00-10:00 Gym").count(), 1);

        assert_eq!(fill("{a}{b}{", &[("a", "{b}"), ("b", "x")]), "{b}x{");
    }

    #[test]
    fn test_parse_suggestion_fenced() {
        let reply = "Here you go:\n```json\n{\"suggestedPriority\": \"high\", \"suggestedDeadline\": \"2026-03-05\"}\n```";
        let s = parse_suggestion(reply).unwrap();
        assert_eq!(s.priority, Priority::High);
        assert_eq!(s.deadline, NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    }

    #[test]
    fn test_parse_suggestion_timestamp_deadline() {
        let reply = r#"{"suggestedPriority":"Low","suggestedDeadline":"2026-04-01T17:00:00Z"}"#;
        let s = parse_suggestion(reply).unwrap();
        assert_eq!(s.deadline, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
    }

    #[test]
    fn test_parse_suggestion_rejects_bad_replies() {
        assert!(parse_suggestion("no idea").is_err());
        assert!(parse_suggestion(r#"{"suggestedPriority":"Urgent","suggestedDeadline":"2026-01-01"}"#).is_err());
        assert!(parse_suggestion(r#"{"suggestedPriority":"Low","suggestedDeadline":"tomorrow"}"#).is_err());
    }
}
