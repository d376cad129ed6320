use crate::error::PipelineError;
use crate::results::MetricRecord;
use crate::sinks::{FlatRecord, RecordSink};
use crate::utils::timestamped_filename;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a batch to one CSV file
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sink writing `data_<timestamp>.csv` inside `dir`
    pub fn timestamped(dir: &Path) -> Self {
        Self::new(dir.join(timestamped_filename("data", "csv")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn write(&mut self, records: &[MetricRecord]) -> Result<(), PipelineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = ::csv::Writer::from_path(&self.path)?;
        for record in records {
            writer.serialize(FlatRecord::from_record(record)?)?;
        }
        writer.flush()?;

        ::log::info!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::RecordStatus;

    #[test]
    fn test_csv_sink_writes_header_and_rows() {
        let dir = std::env::temp_dir().join(format!("traffic-snapshot-csv-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let mut complete = MetricRecord::failed("a.html");
        complete.status = RecordStatus::Complete;
        complete.missing_fields.clear();
        complete.global_rank = Some(7435);
        complete.bounce_rate = Some(55.43);
        let records = vec![complete, MetricRecord::failed("b.html")];

        let mut sink = CsvSink::new(dir.join("out").join("data.csv"));
        sink.write(&records).unwrap();

        let mut reader = ::csv::Reader::from_path(sink.path()).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "filename");
        assert_eq!(&headers[12], "missing_fields");

        let rows = reader.records().map(|r| r.unwrap()).collect::<Vec<_>>();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "7435");
        assert_eq!(&rows[0][2], "");
        assert_eq!(&rows[0][3], "55.43");
        assert_eq!(&rows[0][11], "complete");
        assert_eq!(&rows[1][11], "failed");
        assert!(rows[1][12].starts_with("global_rank, "));

        fs::remove_dir_all(&dir).unwrap();
    }
}
