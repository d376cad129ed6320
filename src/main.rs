use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use traffic_snapshot::sinks::RecordSink;
use traffic_snapshot::sinks::csv::CsvSink;
use traffic_snapshot::sinks::sqlite::SqliteSink;
use traffic_snapshot::{MetricRecord, PipelineError, RecordStatus, Snapshots, analysis};

mod args;
use args::{Args, Command, OutputTarget};

/// Options of the `extract` subcommand
struct ExtractOptions {
    input: PathBuf,
    output: OutputTarget,
    csv_dir: PathBuf,
    db: PathBuf,
    error_log: PathBuf,
    concurrency: usize,
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let outcome = match args.command {
        Command::Extract {
            input,
            output,
            csv_dir,
            db,
            error_log,
            concurrency,
            config,
        } => {
            let options = ExtractOptions {
                input,
                output,
                csv_dir,
                db,
                error_log,
                concurrency,
                config,
            };
            run_extract(options).await
        }
        Command::Analyze { db, report } => run_analyze(&db, &report),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_extract(options: ExtractOptions) -> Result<(), PipelineError> {
    ::log::info!("Extracting snapshots from {}", options.input.display());
    let start_time = std::time::Instant::now();

    let mut snapshots = Snapshots::new(&options.input)
        .with_max_concurrency(options.concurrency)
        .with_error_log(&options.error_log);
    if let Some(path) = &options.config {
        snapshots = snapshots.with_config_file(path)?;
    }

    let records = snapshots.extract().await?;

    let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();
    if options.output.csv() {
        sinks.push(Box::new(CsvSink::timestamped(&options.csv_dir)));
    }
    if options.output.sqlite() {
        sinks.push(Box::new(SqliteSink::new(&options.db)));
    }
    for sink in &mut sinks {
        ::log::debug!("Writing {} records to {}", records.len(), sink.describe());
        sink.write(&records)?;
    }

    report_summary(&records);
    ::log::info!(
        "Extraction complete - processed {} pages in {:.2} seconds",
        records.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run_analyze(db: &Path, report_path: &Path) -> Result<(), PipelineError> {
    let report = analysis::analyze_database(db, report_path)?;
    println!(
        "Ranked {} sites; report saved to {}",
        report.sites.len(),
        report_path.display()
    );
    Ok(())
}

fn report_summary(records: &[MetricRecord]) {
    let with_missing = records.iter().filter(|r| r.has_missing()).count();
    let failed = records
        .iter()
        .filter(|r| r.status == RecordStatus::Failed)
        .count();

    println!("Extracted {} records", records.len());
    if with_missing > 0 {
        println!("{with_missing} record(s) contained missing data ({failed} failed)");
        for record in records.iter().filter(|r| r.has_missing()) {
            ::log::debug!(
                "{} [{}]: {}",
                record.filename,
                record.status,
                record.missing_fields_joined()
            );
        }
    }
}
