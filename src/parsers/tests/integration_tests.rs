use super::fixtures::{UNRELATED_HTML, snapshot_html};
use crate::assembler::assemble;
use crate::config::ExtractionConfig;
use crate::error_log::{ERROR_LOG_HEADER, MemorySink};
use crate::parsers::Page;
use crate::results::{Field, MetricRecord, RecordStatus, Row};
use crate::{PipelineError, Snapshots};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;

fn rows(values: Value) -> Vec<Row> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
}

fn extract(id: &str, markup: &str) -> (MetricRecord, MemorySink) {
    let sink = MemorySink::default();
    let page = Page::parse(id, markup);
    let record = assemble(&page, &ExtractionConfig::default(), &sink);
    (record, sink)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "traffic-snapshot-it-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_full_snapshot_extraction() {
    let (record, sink) = extract("example.com.html", &snapshot_html(true));

    assert!(sink.entries().is_empty(), "{:?}", sink.entries());
    assert_eq!(record.status, RecordStatus::Complete);
    assert_eq!(record.filename, "example.com.html");
    assert_eq!(record.global_rank, Some(7435));
    assert_eq!(record.total_visits, Some(9_100_000));
    assert_eq!(record.bounce_rate, Some(55.43));
    assert_eq!(record.pages_per_visit, Some(3));
    assert_eq!(record.avg_visit_duration, Some(146));
    assert_eq!(record.last_month_change, Some(-5.43));
}

#[test]
fn test_series_and_lists() {
    let (record, _) = extract("example.com.html", &snapshot_html(true));

    assert_eq!(
        record.rank_changes,
        rows(json!([
            {"month": "Jan", "rank": 100.0},
            {"month": "Feb", "rank": 50.0},
            {"month": "Mar", "rank": 0.0},
        ]))
    );
    assert_eq!(
        record.monthly_visits,
        rows(json!([
            {"month": "Jan", "visits": 8_600_000},
            {"month": "Feb", "visits": 1_234_567},
            {"month": "Mar", "visits": 9_100_000},
        ]))
    );
    assert_eq!(
        record.top_countries,
        rows(json!([
            {"label": "United States", "value": 35.12},
            {"label": "Germany", "value": 6.4},
        ]))
    );
    assert_eq!(
        record.age_distribution,
        rows(json!([
            {"age_group": "18 - 24", "percentage": 21.3},
            {"age_group": "25 - 34", "percentage": 30.15},
            {"age_group": "65+", "percentage": null},
        ]))
    );
}

#[test]
fn test_missing_bounce_rate_gives_partial_record() {
    let (record, sink) = extract("example.com.html", &snapshot_html(false));

    assert_eq!(record.status, RecordStatus::Partial);
    assert_eq!(record.bounce_rate, None);
    assert_eq!(record.missing_fields, vec![Field::BounceRate]);
    assert_eq!(record.global_rank, Some(7435));
    assert_eq!(record.pages_per_visit, Some(3));
    assert_eq!(record.rank_changes.len(), 3);

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].class_name, "AttributeLookup");
    assert_eq!(entries[0].method_name, "bounce_rate");
}

#[test]
fn test_page_keeps_source() {
    let page = Page::parse("other.html", UNRELATED_HTML);
    assert_eq!(page.id(), "other.html");
    assert_eq!(page.markup(), UNRELATED_HTML);
}

#[test]
fn test_unrelated_page_is_failed() {
    let (record, sink) = extract("other.html", UNRELATED_HTML);

    assert_eq!(record, MetricRecord::failed("other.html"));
    assert_eq!(sink.entries().len(), Field::ALL.len());
}

#[test]
fn test_record_json_shape() {
    let (record, _) = extract("example.com.html", &snapshot_html(false));
    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["status"], "partial");
    assert_eq!(value["missing_fields"], "bounce_rate");
    assert_eq!(value["bounce_rate"], Value::Null);
    assert_eq!(value["monthly_visits"][0]["visits"], 8_600_000);
}

#[tokio::test]
async fn test_pipeline_over_directory() {
    let dir = scratch_dir("pipeline");
    let input = dir.join("raw_html");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("b_site.html"), snapshot_html(false)).unwrap();
    fs::write(input.join("a_site.html"), snapshot_html(true)).unwrap();
    fs::write(input.join("c_other.html"), UNRELATED_HTML).unwrap();
    fs::write(input.join("notes.txt"), "not a snapshot").unwrap();

    let error_log = dir.join("logs").join("error_log.csv");
    let records = Snapshots::new(&input)
        .with_max_concurrency(2)
        .with_error_log(&error_log)
        .extract()
        .await
        .unwrap();

    let names = records.iter().map(|r| r.filename.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["a_site.html", "b_site.html", "c_other.html"]);
    let statuses = records.iter().map(|r| r.status).collect::<Vec<_>>();
    assert_eq!(
        statuses,
        [RecordStatus::Complete, RecordStatus::Partial, RecordStatus::Failed]
    );

    let mut reader = csv::Reader::from_path(&error_log).unwrap();
    let headers = reader.headers().unwrap().iter().collect::<Vec<_>>();
    assert_eq!(headers, ERROR_LOG_HEADER);
    let logged = reader.records().map(|r| r.unwrap()).collect::<Vec<_>>();
    assert_eq!(logged.len(), 1 + Field::ALL.len());
    assert!(logged.iter().any(|r| &r[1] == "b_site.html" && &r[3] == "bounce_rate"));

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_pipeline_with_custom_config() {
    let dir = scratch_dir("custom-config");
    fs::write(dir.join("site.html"), snapshot_html(true)).unwrap();
    fs::write(dir.join("site.htm"), snapshot_html(true)).unwrap();

    let records = Snapshots::new(&dir)
        .with_config_str(r#"{"input": {"include_patterns": ["\\.htm$"]}}"#)
        .unwrap()
        .with_error_log(dir.join("errors.csv"))
        .extract()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].filename, "site.htm");
    assert_eq!(records[0].status, RecordStatus::Complete);

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_pipeline_without_inputs() {
    let dir = scratch_dir("empty");
    fs::write(dir.join("readme.txt"), "nothing here").unwrap();

    let result = Snapshots::new(&dir)
        .with_error_log(dir.join("errors.csv"))
        .extract()
        .await;
    assert!(matches!(result, Err(PipelineError::NoInputs { .. })));

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_unreadable_file_yields_failed_record() {
    let dir = scratch_dir("unreadable");
    let input = dir.join("raw_html");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("a_site.html"), snapshot_html(true)).unwrap();
    fs::write(input.join("b_binary.html"), [0x3c, 0x68, 0xff, 0xfe, 0x00, 0x80]).unwrap();

    let error_log = dir.join("errors.csv");
    let records = Snapshots::new(&input)
        .with_error_log(&error_log)
        .extract()
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, RecordStatus::Complete);
    assert_eq!(records[1], MetricRecord::failed("b_binary.html"));

    let mut reader = csv::Reader::from_path(&error_log).unwrap();
    let logged = reader.records().map(|r| r.unwrap()).collect::<Vec<_>>();
    assert_eq!(logged.len(), 1);
    assert_eq!(&logged[0][1], "b_binary.html");
    assert_eq!(&logged[0][2], "PageReader");
    assert_eq!(&logged[0][3], "read");

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_renamed_row_keys_are_rejected() {
    let dir = scratch_dir("renamed-keys");
    fs::write(dir.join("site.html"), snapshot_html(true)).unwrap();

    let mut config = ExtractionConfig::default();
    for spec in &mut config.fields {
        if let crate::config::Strategy::PairedLists { value_key, .. } = &mut spec.strategy {
            if spec.field == Field::MonthlyVisits {
                *value_key = "count".to_string();
            }
        }
    }

    let result = Snapshots::new(&dir)
        .with_config(config)
        .with_error_log(dir.join("errors.csv"))
        .extract()
        .await;
    assert!(matches!(result, Err(PipelineError::Config(_))));

    fs::remove_dir_all(&dir).unwrap();
}
