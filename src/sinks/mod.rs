pub mod csv;
pub mod sqlite;

use crate::error::PipelineError;
use crate::results::{MetricRecord, Row};
use serde::Serialize;

/// Terminal destination for a batch of records.
///
/// Sinks receive the whole batch once, after every page is processed.
pub trait RecordSink {
    /// Writes all records
    fn write(&mut self, records: &[MetricRecord]) -> Result<(), PipelineError>;

    /// Human-readable destination, for logging
    fn describe(&self) -> String;
}

/// A record flattened for tabular storage: list fields become JSON text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRecord {
    pub filename: String,
    pub global_rank: Option<i64>,
    pub total_visits: Option<i64>,
    pub bounce_rate: Option<f64>,
    pub pages_per_visit: Option<i64>,
    pub avg_visit_duration: Option<i64>,
    pub last_month_change: Option<f64>,
    pub rank_changes: String,
    pub monthly_visits: String,
    pub top_countries: String,
    pub age_distribution: String,
    pub status: String,
    pub missing_fields: String,
}

impl FlatRecord {
    pub fn from_record(record: &MetricRecord) -> Result<Self, PipelineError> {
        Ok(Self {
            filename: record.filename.clone(),
            global_rank: record.global_rank,
            total_visits: record.total_visits,
            bounce_rate: record.bounce_rate,
            pages_per_visit: record.pages_per_visit,
            avg_visit_duration: record.avg_visit_duration,
            last_month_change: record.last_month_change,
            rank_changes: rows_json(&record.rank_changes)?,
            monthly_visits: rows_json(&record.monthly_visits)?,
            top_countries: rows_json(&record.top_countries)?,
            age_distribution: rows_json(&record.age_distribution)?,
            status: record.status.to_string(),
            missing_fields: record.missing_fields_joined(),
        })
    }
}

fn rows_json(rows: &[Row]) -> Result<String, PipelineError> {
    Ok(serde_json::to_string(rows)?)
}

/// Parses a stored JSON column back into rows; malformed text reads as empty
pub fn rows_from_json(text: &str) -> Vec<Row> {
    match serde_json::from_str(text) {
        Ok(rows) => rows,
        Err(e) => {
            if !text.trim().is_empty() {
                ::log::warn!("Ignoring malformed JSON column: {}", e);
            }
            Vec::new()
        }
    }
}
