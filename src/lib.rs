// Re-export modules
pub mod analysis;
pub mod assembler;
pub mod config;
pub mod error;
pub mod error_log;
pub mod extractors;
pub mod filter;
pub mod normalize;
pub mod parsers;
pub mod results;
pub mod sinks;
pub mod utils;
pub mod workers;

// Re-export commonly used types for convenience
pub use config::ExtractionConfig;
pub use error::{ExtractionError, PipelineError};
pub use results::{Field, MetricRecord, RecordStatus};

use error_log::{ErrorLog, ErrorSink};
use filter::{InputFilter, discover_inputs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_ERROR_LOG: &str = "data/logs/error_log.csv";

/// Main builder for extracting records from a directory of snapshots
pub struct Snapshots {
    input_dir: PathBuf,
    max_concurrency: usize,
    config: ExtractionConfig,
    error_log: PathBuf,
}

impl Snapshots {
    /// Create a new Snapshots builder reading `.html` files from `input_dir`
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            max_concurrency: 4, // Default concurrency
            config: ExtractionConfig::default(),
            error_log: PathBuf::from(DEFAULT_ERROR_LOG),
        }
    }

    /// Set the maximum number of pages extracted at once
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Replace the field descriptors and input filter
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let config = ExtractionConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, PipelineError> {
        let config = ExtractionConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    /// Set where extraction failures are appended
    pub fn with_error_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.error_log = path.into();
        self
    }

    /// Extract one record per input file, in file name order
    pub async fn extract(self) -> Result<Vec<MetricRecord>, PipelineError> {
        self.config.validate()?;
        let filter = InputFilter::new(&self.config.input)?;
        let inputs = discover_inputs(&self.input_dir, &filter)?;

        let log = Arc::new(ErrorLog::open(&self.error_log)?);
        let sink: Arc<dyn ErrorSink> = log.clone();
        let records = workers::run(inputs, Arc::new(self.config), sink, self.max_concurrency).await?;

        log.flush()?;
        if log.entries_written() > 0 {
            ::log::warn!(
                "{} extraction errors logged to {}",
                log.entries_written(),
                log.path().display()
            );
        }
        Ok(records)
    }
}
