use crate::config::ExtractionConfig;
use crate::error_log::ErrorSink;
use crate::extractors::{FieldOutcome, extract_field};
use crate::normalize::{
    Step, normalize_duration, normalize_list_field, normalize_number, normalize_percentage,
    normalize_rank,
};
use crate::parsers::Page;
use crate::results::{Field, MetricRecord, RecordStatus, Row};
use std::collections::BTreeMap;

/// Extracts every configured field from `page` and builds its record.
///
/// Always returns a record; failed fields are listed in `missing_fields`.
pub fn assemble(page: &Page, config: &ExtractionConfig, sink: &dyn ErrorSink) -> MetricRecord {
    let raw = Field::ALL
        .into_iter()
        .filter_map(|field| {
            let spec = config.spec(field)?;
            Some((field, extract_field(spec, page, sink)))
        })
        .collect();

    let record = build_record(page.id(), raw);
    if record.has_missing() {
        ::log::info!(
            "{}: {} record, missing {}",
            record.filename,
            record.status,
            record.missing_fields_joined()
        );
    } else {
        ::log::debug!("{}: complete record", record.filename);
    }
    record
}

/// Normalizes raw field outcomes into a record
pub fn build_record(filename: &str, mut raw: BTreeMap<Field, FieldOutcome>) -> MetricRecord {
    // Fields without a descriptor count as missing too
    let missing_fields = Field::ALL
        .into_iter()
        .filter(|field| raw.get(field).is_none_or(FieldOutcome::is_missing))
        .collect::<Vec<_>>();
    let status = RecordStatus::from_missing(missing_fields.len());

    let text = |field: Field| raw.get(&field).and_then(FieldOutcome::text);
    let global_rank = text(Field::GlobalRank).and_then(normalize_rank);
    let total_visits = text(Field::TotalVisits).and_then(normalize_number);
    let bounce_rate = text(Field::BounceRate).and_then(normalize_percentage);
    let pages_per_visit = text(Field::PagesPerVisit).and_then(normalize_number);
    let avg_visit_duration = text(Field::AvgVisitDuration).and_then(normalize_duration);
    let last_month_change = text(Field::LastMonthChange).and_then(normalize_percentage);

    let mut rows = |field: Field, steps: &[Step]| -> Vec<Row> {
        let data = raw.remove(&field).and_then(FieldOutcome::into_rows);
        let normalized = match field.row_keys() {
            Some((_, value_key)) => normalize_list_field(data, value_key, steps),
            None => data,
        };
        normalized.unwrap_or_default()
    };
    let rank_changes = rows(Field::RankChanges, &[]);
    let monthly_visits = rows(Field::MonthlyVisits, &[Step::Number]);
    let top_countries = rows(Field::TopCountries, &[Step::Percentage]);
    let age_distribution = rows(
        Field::AgeDistribution,
        &[Step::HandleMissing, Step::Percentage],
    );

    MetricRecord {
        filename: filename.to_string(),
        global_rank,
        total_visits,
        bounce_rate,
        pages_per_visit,
        avg_visit_duration,
        last_month_change,
        rank_changes,
        monthly_visits,
        top_countries,
        age_distribution,
        status,
        missing_fields,
    }
}
