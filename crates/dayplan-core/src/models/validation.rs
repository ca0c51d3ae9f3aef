use chrono::NaiveTime;
use thiserror::Error;

/// Format used for timetable times of day.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be a time of day (HH:MM), got {value:?}")]
    InvalidTime { field: &'static str, value: String },

    #[error("End time must be after start time ({start} - {end})")]
    EndNotAfterStart { start: String, end: String },
}

/// Field-level checks applied before a record enters a collection.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

pub(crate) fn parse_time_of_day(field: &'static str, value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), TIME_OF_DAY_FORMAT).map_err(|_| {
        ValidationError::InvalidTime {
            field,
            value: value.to_string(),
        }
    })
}
