use crate::assembler::assemble;
use crate::config::ExtractionConfig;
use crate::error::PipelineError;
use crate::error_log::{ErrorEntry, ErrorSink};
use crate::parsers::Page;
use crate::results::MetricRecord;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// A queued input file with its position in the batch
type Job = (usize, PathBuf);

/// Extracts every input file with `max_concurrency` workers.
///
/// Records come back in input order regardless of which worker finished
/// first.
pub async fn run(
    inputs: Vec<PathBuf>,
    config: Arc<ExtractionConfig>,
    sink: Arc<dyn ErrorSink>,
    max_concurrency: usize,
) -> Result<Vec<MetricRecord>, PipelineError> {
    let total = inputs.len();
    let num_workers = max_concurrency.clamp(1, total.max(1));
    ::log::info!("Extracting {} pages with {} workers", total, num_workers);

    // Queue every job up front; the queue closes once drained
    let (job_tx, job_rx) = mpsc::channel::<Job>(total.max(1));
    for job in inputs.into_iter().enumerate() {
        job_tx
            .send(job)
            .await
            .map_err(|_| PipelineError::WorkerPool("job queue closed early".to_string()))?;
    }
    drop(job_tx);

    let (result_tx, mut result_rx) = mpsc::channel::<(usize, MetricRecord)>(total.max(1));
    let job_rx = Arc::new(Mutex::new(job_rx));

    let handles = (0..num_workers)
        .map(|worker_id| {
            spawn_worker(
                worker_id,
                Arc::clone(&job_rx),
                result_tx.clone(),
                Arc::clone(&config),
                Arc::clone(&sink),
            )
        })
        .collect::<Vec<_>>();

    // Drop our sender so the result channel closes with the last worker
    drop(result_tx);

    let mut records = Vec::with_capacity(total);
    while let Some(result) = result_rx.recv().await {
        records.push(result);
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| PipelineError::WorkerPool(format!("worker task failed: {e}")))?;
    }

    if records.len() != total {
        return Err(PipelineError::WorkerPool(format!(
            "expected {} records, got {}",
            total,
            records.len()
        )));
    }

    records.sort_by_key(|(index, _)| *index);
    Ok(records.into_iter().map(|(_, record)| record).collect())
}

fn spawn_worker(
    worker_id: usize,
    job_rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    result_tx: mpsc::Sender<(usize, MetricRecord)>,
    config: Arc<ExtractionConfig>,
    sink: Arc<dyn ErrorSink>,
) -> JoinHandle<()> {
    ::log::trace!("Spawning worker {}", worker_id);

    tokio::spawn(async move {
        let mut processed = 0usize;
        loop {
            let next = { job_rx.lock().await.recv().await };
            let Some((index, path)) = next else {
                break;
            };

            let record = process_file(worker_id, &path, Arc::clone(&config), Arc::clone(&sink)).await;
            processed += 1;

            if let Err(e) = result_tx.send((index, record)).await {
                ::log::error!("Worker {} failed to send result: {}", worker_id, e);
                break;
            }
        }
        ::log::debug!("Worker {} finished after {} pages", worker_id, processed);
    })
}

/// Reads, parses and extracts one file. Never fails: unreadable files and
/// crashed extractions come back as failed records.
async fn process_file(
    worker_id: usize,
    path: &Path,
    config: Arc<ExtractionConfig>,
    sink: Arc<dyn ErrorSink>,
) -> MetricRecord {
    let document_id = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    ::log::debug!("Worker {} extracting {}", worker_id, document_id);

    let markup = match tokio::fs::read_to_string(path).await {
        Ok(markup) => markup,
        Err(e) => {
            ::log::error!("Cannot read {}: {}", path.display(), e);
            sink.record(ErrorEntry::now(
                &document_id,
                "PageReader",
                "read",
                e.to_string(),
                format!("{}\n  reading {}", e, path.display()),
            ));
            return MetricRecord::failed(document_id);
        }
    };

    let task_sink = Arc::clone(&sink);
    let task_id = document_id.clone();
    let extraction = tokio::task::spawn_blocking(move || {
        let page = Page::parse(task_id, &markup);
        assemble(&page, &config, task_sink.as_ref())
    })
    .await;

    match extraction {
        Ok(record) => record,
        Err(e) => {
            ::log::error!("Extraction of {} crashed: {}", document_id, e);
            sink.record(ErrorEntry::now(
                &document_id,
                "PageExtractor",
                "assemble",
                e.to_string(),
                format!("{e:?}"),
            ));
            MetricRecord::failed(document_id)
        }
    }
}
