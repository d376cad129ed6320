use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "traffic-snapshot")]
#[command(about = "Extracts traffic metrics from saved analytics snapshots")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract records from a directory of HTML snapshots
    Extract {
        /// Directory holding the saved .html pages
        #[arg(short, long, default_value = "data/raw_html")]
        input: PathBuf,

        /// Where to persist the records
        #[arg(short, long, value_enum, default_value_t = OutputTarget::Csv)]
        output: OutputTarget,

        /// Directory for timestamped CSV files
        #[arg(long, default_value = "data/output/csv")]
        csv_dir: PathBuf,

        /// SQLite database file
        #[arg(long, default_value = "data/output/sqlite/web_metrics.sqlite")]
        db: PathBuf,

        /// CSV file extraction failures are appended to
        #[arg(long, default_value = "data/logs/error_log.csv")]
        error_log: PathBuf,

        /// Number of pages extracted concurrently
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,

        /// JSON file with field descriptors, replacing the built-in ones
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compute month-over-month growth from a SQLite database
    Analyze {
        /// SQLite database written by `extract`
        #[arg(long, default_value = "data/output/sqlite/web_metrics.sqlite")]
        db: PathBuf,

        /// JSON report path
        #[arg(long, default_value = "data/output/graphs/growth_report.json")]
        report: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputTarget {
    Csv,
    Sqlite,
    Both,
    None,
}

impl OutputTarget {
    pub fn csv(self) -> bool {
        matches!(self, OutputTarget::Csv | OutputTarget::Both)
    }

    pub fn sqlite(self) -> bool {
        matches!(self, OutputTarget::Sqlite | OutputTarget::Both)
    }
}
