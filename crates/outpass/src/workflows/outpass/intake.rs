use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::domain::{OutpassSubmission, ValidatedSubmission};

/// Validation errors raised while accepting a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("`{field}` is not a valid date: '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("in date ({in_date}) must be after or equal to out date ({out_date})")]
    InvertedRange {
        out_date: NaiveDateTime,
        in_date: NaiveDateTime,
    },
}

const DEFAULT_REASON: &str = "Personal";

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parse a leave date as a local wall-clock instant.
///
/// Accepts RFC 3339 (kept in the sender's own offset), a bare date-time, or a plain
/// `YYYY-MM-DD` date which is read as midnight.
pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    if let Some(parsed) = DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Turn a raw submission into a validated one, or explain what is wrong with it.
pub fn validate(submission: OutpassSubmission) -> Result<ValidatedSubmission, ValidationError> {
    let OutpassSubmission {
        student_name,
        student_id,
        guardian_name,
        guardian_number,
        out_date,
        in_date,
        reason,
    } = submission;

    let student_name = required("student_name", student_name)?;
    let guardian_name = required("guardian_name", guardian_name)?;
    let guardian_number = required("guardian_number", guardian_number)?;
    let out_raw = required("out_date", out_date)?;
    let in_raw = required("in_date", in_date)?;

    let out_date = parse_instant(&out_raw).ok_or(ValidationError::InvalidDate {
        field: "out_date",
        value: out_raw,
    })?;
    let in_date = parse_instant(&in_raw).ok_or(ValidationError::InvalidDate {
        field: "in_date",
        value: in_raw,
    })?;

    if in_date < out_date {
        return Err(ValidationError::InvertedRange { out_date, in_date });
    }

    Ok(ValidatedSubmission {
        student_name,
        student_id: optional(student_id),
        guardian_name,
        guardian_number,
        out_date,
        in_date,
        reason: optional(reason).unwrap_or_else(|| DEFAULT_REASON.to_string()),
    })
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    optional(value).ok_or(ValidationError::MissingField(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
