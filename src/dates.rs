use chrono::NaiveDateTime;
use serde_json::Value;

use crate::domain::DatasetDates;
use crate::error::HarvestError;

const FRACTIONAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const WHOLE_SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Timestamps read from one revision of a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevisionDates {
    pub last_updated: Option<NaiveDateTime>,
    pub finalised: Option<NaiveDateTime>,
}

impl RevisionDates {
    /// Reads `lastUpdated` and `dateFinalised`; a revision that was never
    /// finalised counts as finalised at its last update.
    pub fn from_record(record: &Value) -> Result<Self, HarvestError> {
        let last_updated = parse_field(record, "lastUpdated")?;
        let finalised = parse_field(record, "dateFinalised")?.or(last_updated);
        Ok(Self {
            last_updated,
            finalised,
        })
    }
}

fn parse_field(record: &Value, field: &str) -> Result<Option<NaiveDateTime>, HarvestError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => parse_timestamp(raw).map(Some),
        Some(other) => Err(HarvestError::InvalidTimestamp(format!("{field}: {other}"))),
    }
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, HarvestError> {
    NaiveDateTime::parse_from_str(raw, FRACTIONAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, WHOLE_SECOND_FORMAT))
        .map_err(|_| HarvestError::InvalidTimestamp(raw.to_string()))
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(WHOLE_SECOND_FORMAT).to_string()
}

/// Latest update and earliest finalisation across all revisions.
pub fn reconcile<I>(revisions: I) -> DatasetDates
where
    I: IntoIterator<Item = RevisionDates>,
{
    let mut modified: Option<NaiveDateTime> = None;
    let mut issued: Option<NaiveDateTime> = None;
    for revision in revisions {
        if let Some(updated) = revision.last_updated {
            modified = Some(modified.map_or(updated, |current| current.max(updated)));
        }
        if let Some(finalised) = revision.finalised {
            issued = Some(issued.map_or(finalised, |current| current.min(finalised)));
        }
    }
    DatasetDates {
        modified: modified.as_ref().map(format_timestamp),
        issued: issued.as_ref().map(format_timestamp),
    }
}
