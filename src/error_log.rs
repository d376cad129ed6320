//! Append-only record of every caught extraction failure.

use crate::error::PipelineError;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Column order of the error log
pub const ERROR_LOG_HEADER: [&str; 6] = [
    "timestamp",
    "document_id",
    "class_name",
    "method_name",
    "error_message",
    "stack_trace",
];

/// One caught failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub timestamp: String,
    pub document_id: String,
    /// Extraction strategy that failed
    pub class_name: String,
    /// Field being extracted
    pub method_name: String,
    pub error_message: String,
    pub stack_trace: String,
}

impl ErrorEntry {
    /// Creates an entry stamped with the current local time
    pub fn now(
        document_id: &str,
        class_name: &str,
        method_name: &str,
        error_message: String,
        stack_trace: String,
    ) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            document_id: document_id.to_string(),
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            error_message,
            stack_trace,
        }
    }

    fn as_row(&self) -> [&str; 6] {
        [
            self.timestamp.as_str(),
            self.document_id.as_str(),
            self.class_name.as_str(),
            self.method_name.as_str(),
            self.error_message.as_str(),
            self.stack_trace.as_str(),
        ]
    }
}

/// Destination for caught failures, shared by all workers of a batch
pub trait ErrorSink: Send + Sync {
    /// Records a failure. Must not fail the caller.
    fn record(&self, entry: ErrorEntry);
}

/// CSV error log opened once per batch.
///
/// Writes are serialized through a mutex; the writer is flushed by
/// [`ErrorLog::flush`] and again when the log is dropped.
pub struct ErrorLog {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
    written: AtomicUsize,
}

impl ErrorLog {
    /// Opens (or creates) the log at `path` for appending, writing the
    /// header row when the file is new.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(ERROR_LOG_HEADER)?;
        }

        ::log::debug!("Error log opened at {}", path.display());
        Ok(Self {
            path,
            writer: Mutex::new(writer),
            written: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written since the log was opened
    pub fn entries_written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> Result<(), PipelineError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| PipelineError::WorkerPool("error log lock poisoned".to_string()))?;
        writer.flush()?;
        Ok(())
    }
}

impl ErrorSink for ErrorLog {
    fn record(&self, entry: ErrorEntry) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        match writer.write_record(entry.as_row()) {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => ::log::error!(
                "Failed to append to error log {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for ErrorLog {
    fn drop(&mut self) {
        let writer = match self.writer.get_mut() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writer.flush() {
            ::log::error!("Failed to flush error log {}: {}", self.path.display(), e);
        }
    }
}

/// In-memory sink for tests
#[cfg(test)]
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<ErrorEntry>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ErrorSink for MemorySink {
    fn record(&self, entry: ErrorEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}
