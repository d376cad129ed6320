use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One entry of a structured list field, keyed by the descriptor's
/// configured names (e.g. `{"month": "Jan", "visits": 9100000}`).
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The metrics extracted from every snapshot page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    GlobalRank,
    TotalVisits,
    BounceRate,
    PagesPerVisit,
    AvgVisitDuration,
    LastMonthChange,
    RankChanges,
    MonthlyVisits,
    TopCountries,
    AgeDistribution,
}

impl Field {
    /// Every extractable field, in record column order
    pub const ALL: [Field; 10] = [
        Field::GlobalRank,
        Field::TotalVisits,
        Field::BounceRate,
        Field::PagesPerVisit,
        Field::AvgVisitDuration,
        Field::LastMonthChange,
        Field::RankChanges,
        Field::MonthlyVisits,
        Field::TopCountries,
        Field::AgeDistribution,
    ];

    /// Column name of the field in the output record
    pub fn name(&self) -> &'static str {
        match self {
            Field::GlobalRank => "global_rank",
            Field::TotalVisits => "total_visits",
            Field::BounceRate => "bounce_rate",
            Field::PagesPerVisit => "pages_per_visit",
            Field::AvgVisitDuration => "avg_visit_duration",
            Field::LastMonthChange => "last_month_change",
            Field::RankChanges => "rank_changes",
            Field::MonthlyVisits => "monthly_visits",
            Field::TopCountries => "top_countries",
            Field::AgeDistribution => "age_distribution",
        }
    }

    /// Key names of the rows of a list field, as `(label key, value key)`.
    ///
    /// Normalization and growth analysis look values up under these keys,
    /// so descriptors must produce them.
    pub fn row_keys(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Field::RankChanges => Some(("month", "rank")),
            Field::MonthlyVisits => Some(("month", "visits")),
            Field::TopCountries => Some(("label", "value")),
            Field::AgeDistribution => Some(("age_group", "percentage")),
            _ => None,
        }
    }

    /// Whether the field holds a sequence of rows rather than one value
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Field::RankChanges | Field::MonthlyVisits | Field::TopCountries | Field::AgeDistribution
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chart point read back from an SVG line chart
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub label: String,
    pub value: f64,
}

/// A label/value pair read from the page as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledItem {
    pub label: String,
    pub value: String,
}

impl TimeSeriesPoint {
    /// Converts the point into a row under the given key names
    pub fn into_row(self, x_key: &str, y_key: &str) -> Row {
        let mut row = Row::new();
        row.insert(x_key.to_string(), self.label.into());
        row.insert(y_key.to_string(), self.value.into());
        row
    }
}

impl LabeledItem {
    /// Converts the item into a row under the given key names
    pub fn into_row(self, label_key: &str, value_key: &str) -> Row {
        let mut row = Row::new();
        row.insert(label_key.to_string(), self.label.into());
        row.insert(value_key.to_string(), self.value.into());
        row
    }
}

/// Completeness of one page's extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Complete,
    Partial,
    Failed,
}

impl RecordStatus {
    /// Derives the status from the number of fields that failed extraction.
    ///
    /// `failed` only when every extractable field is missing.
    pub fn from_missing(missing: usize) -> Self {
        if missing >= Field::ALL.len() {
            RecordStatus::Failed
        } else if missing > 0 {
            RecordStatus::Partial
        } else {
            RecordStatus::Complete
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Complete => "complete",
            RecordStatus::Partial => "partial",
            RecordStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized row per snapshot page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    /// Source file name, used as the record identifier
    pub filename: String,
    pub global_rank: Option<i64>,
    pub total_visits: Option<i64>,
    pub bounce_rate: Option<f64>,
    pub pages_per_visit: Option<i64>,
    /// Average visit duration in seconds
    pub avg_visit_duration: Option<i64>,
    pub last_month_change: Option<f64>,
    pub rank_changes: Vec<Row>,
    pub monthly_visits: Vec<Row>,
    pub top_countries: Vec<Row>,
    pub age_distribution: Vec<Row>,
    pub status: RecordStatus,
    #[serde(serialize_with = "serialize_field_names")]
    pub missing_fields: Vec<Field>,
}

impl MetricRecord {
    /// A record for a page where nothing could be extracted
    pub fn failed(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            global_rank: None,
            total_visits: None,
            bounce_rate: None,
            pages_per_visit: None,
            avg_visit_duration: None,
            last_month_change: None,
            rank_changes: Vec::new(),
            monthly_visits: Vec::new(),
            top_countries: Vec::new(),
            age_distribution: Vec::new(),
            status: RecordStatus::Failed,
            missing_fields: Field::ALL.to_vec(),
        }
    }

    /// Missing field names joined the way the tabular sinks store them
    pub fn missing_fields_joined(&self) -> String {
        join_field_names(&self.missing_fields)
    }

    pub fn has_missing(&self) -> bool {
        !self.missing_fields.is_empty()
    }
}

pub fn join_field_names(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn serialize_field_names<S: Serializer>(fields: &[Field], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&join_field_names(fields))
}
