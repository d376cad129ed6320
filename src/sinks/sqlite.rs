use crate::error::PipelineError;
use crate::results::{MetricRecord, Row};
use crate::sinks::{FlatRecord, RecordSink, rows_from_json};
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};

pub const TABLE: &str = "web_metrics";

const CREATE_TABLE: &str = "
    DROP TABLE IF EXISTS web_metrics;
    CREATE TABLE web_metrics (
        filename TEXT,
        global_rank INTEGER,
        total_visits INTEGER,
        bounce_rate REAL,
        pages_per_visit REAL,
        avg_visit_duration INTEGER,
        last_month_change REAL,
        rank_changes TEXT,
        monthly_visits TEXT,
        top_countries TEXT,
        age_distribution TEXT,
        status TEXT,
        missing_fields TEXT
    );";

const INSERT_ROW: &str = "
    INSERT INTO web_metrics (
        filename, global_rank, total_visits, bounce_rate, pages_per_visit,
        avg_visit_duration, last_month_change, rank_changes, monthly_visits,
        top_countries, age_distribution, status, missing_fields
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

/// Replaces the `web_metrics` table of a SQLite database with a batch
pub struct SqliteSink {
    path: PathBuf,
}

impl SqliteSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for SqliteSink {
    fn write(&mut self, records: &[MetricRecord]) -> Result<(), PipelineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(&self.path)?;
        conn.execute_batch(CREATE_TABLE)?;

        let tx = conn.transaction()?;
        {
            let mut insert = tx.prepare(INSERT_ROW)?;
            for record in records {
                let flat = FlatRecord::from_record(record)?;
                insert.execute(params![
                    flat.filename,
                    flat.global_rank,
                    flat.total_visits,
                    flat.bounce_rate,
                    flat.pages_per_visit,
                    flat.avg_visit_duration,
                    flat.last_month_change,
                    flat.rank_changes,
                    flat.monthly_visits,
                    flat.top_countries,
                    flat.age_distribution,
                    flat.status,
                    flat.missing_fields,
                ])?;
            }
        }
        tx.commit()?;

        ::log::info!(
            "Saved {} records to {} table in {}",
            records.len(),
            TABLE,
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("SQLite database {}", self.path.display())
    }
}

/// The time-series columns of one stored record
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSeries {
    pub filename: String,
    pub monthly_visits: Vec<Row>,
    pub rank_changes: Vec<Row>,
}

/// Reads every record's series back from `db`, in insertion order
pub fn load_series(db: &Path) -> Result<Vec<StoredSeries>, PipelineError> {
    if !db.exists() {
        return Err(PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("database {} does not exist", db.display()),
        )));
    }

    let conn = Connection::open(db)?;
    let mut stmt = conn.prepare(
        "SELECT filename, monthly_visits, rank_changes FROM web_metrics ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    let mut series = Vec::new();
    for row in rows {
        let (filename, visits, ranks) = row?;
        series.push(StoredSeries {
            filename: filename.unwrap_or_default(),
            monthly_visits: visits.as_deref().map(rows_from_json).unwrap_or_default(),
            rank_changes: ranks.as_deref().map(rows_from_json).unwrap_or_default(),
        });
    }
    ::log::debug!("Loaded {} series from {}", series.len(), db.display());
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::RecordStatus;
    use serde_json::json;

    fn temp_db(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "traffic-snapshot-sqlite-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir.join("nested").join("metrics.sqlite")
    }

    fn record_with_visits(name: &str, visits: i64) -> MetricRecord {
        let mut record = MetricRecord::failed(name);
        record.status = RecordStatus::Partial;
        record.global_rank = Some(10);
        record.monthly_visits = vec![
            json!({"month": "Jan", "visits": visits})
                .as_object()
                .cloned()
                .unwrap(),
        ];
        record
    }

    #[test]
    fn test_write_replaces_table_and_reads_back() {
        let db = temp_db("roundtrip");
        let mut sink = SqliteSink::new(&db);

        sink.write(&[record_with_visits("old.html", 1)]).unwrap();
        sink.write(&[
            record_with_visits("a.html", 100),
            record_with_visits("b.html", 200),
        ])
        .unwrap();

        let series = load_series(&db).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].filename, "a.html");
        assert_eq!(series[1].monthly_visits[0].get("visits"), Some(&json!(200)));
        assert!(series[1].rank_changes.is_empty());

        let conn = Connection::open(&db).unwrap();
        let status: String = conn
            .query_row("SELECT status FROM web_metrics LIMIT 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "partial");

        fs::remove_dir_all(db.parent().unwrap().parent().unwrap()).unwrap();
    }

    #[test]
    fn test_malformed_series_read_as_empty() {
        let db = temp_db("malformed");
        SqliteSink::new(&db)
            .write(&[record_with_visits("a.html", 5)])
            .unwrap();

        let conn = Connection::open(&db).unwrap();
        conn.execute("UPDATE web_metrics SET monthly_visits = '{oops'", [])
            .unwrap();
        drop(conn);

        let series = load_series(&db).unwrap();
        assert!(series[0].monthly_visits.is_empty());

        fs::remove_dir_all(db.parent().unwrap().parent().unwrap()).unwrap();
    }

    #[test]
    fn test_missing_database_is_an_error() {
        let db = temp_db("absent");
        assert!(matches!(load_series(&db), Err(PipelineError::Io(_))));
    }
}
