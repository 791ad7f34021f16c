use crate::analyzers::{AggregationSummary, YearlyAggregator};
use crate::error::{PipelineError, Result};
use crate::processors::worker::{self, FileReport};
use crate::readers::discover_station_files;
use crate::store::Store;
use crate::utils::ProgressReporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info};

/// Aggregate outcome of one ingestion run.
#[derive(Debug)]
pub struct IngestionReport {
    pub file_reports: Vec<FileReport>,
    pub failed_files: Vec<(PathBuf, String)>,
    pub aggregation: Option<AggregationSummary>,
    pub elapsed: Duration,
}

impl IngestionReport {
    pub fn total_lines(&self) -> usize {
        self.file_reports.iter().map(|r| r.lines_read).sum()
    }

    pub fn total_inserted(&self) -> usize {
        self.file_reports.iter().map(|r| r.inserted).sum()
    }

    pub fn total_duplicates(&self) -> usize {
        self.file_reports.iter().map(|r| r.duplicates).sum()
    }

    pub fn total_parse_failures(&self) -> usize {
        self.file_reports.iter().map(|r| r.parse_failures).sum()
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Ingested {} files in {:.2}s: {} lines read, {} records stored, {} duplicates skipped, {} parse failures",
            self.file_reports.len(),
            self.elapsed.as_secs_f64(),
            self.total_lines(),
            self.total_inserted(),
            self.total_duplicates(),
            self.total_parse_failures(),
        )];

        for (path, reason) in &self.failed_files {
            lines.push(format!("  failed: {} ({})", path.display(), reason));
        }

        if let Some(agg) = &self.aggregation {
            lines.push(format!(
                "Aggregation: {} observations scanned, {} incomplete skipped, {} (year, station) groups written",
                agg.scanned, agg.skipped, agg.groups
            ));
        }

        lines.join("\n")
    }
}

/// Dispatches one ingestion worker per station file across a bounded pool,
/// barrier-waits, then runs the aggregation pass exactly once.
pub struct IngestionCoordinator {
    max_workers: usize,
    skip_aggregation: bool,
}

impl IngestionCoordinator {
    /// `max_workers` is the explicit concurrency width. Callers pick it;
    /// the CLI defaults to the host core count as a tuning choice, not a
    /// correctness requirement.
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            skip_aggregation: false,
        }
    }

    pub fn with_skip_aggregation(mut self, skip_aggregation: bool) -> Self {
        self.skip_aggregation = skip_aggregation;
        self
    }

    pub async fn run(
        &self,
        store: &Store,
        input_dir: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<IngestionReport> {
        let start = Instant::now();
        let files = discover_station_files(input_dir)?;

        info!(
            files = files.len(),
            max_workers = self.max_workers,
            input_dir = %input_dir.display(),
            "starting ingestion"
        );
        if let Some(p) = progress {
            p.set_message("Ingesting station files...");
        }

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut handles = Vec::with_capacity(files.len());

        for path in files {
            let semaphore = semaphore.clone();
            let store = store.clone();
            let task_path = path.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| PipelineError::Config(e.to_string()))?;
                worker::ingest_file(&store, &task_path).await
            });

            handles.push((path, handle));
        }

        // Barrier: every worker joins before aggregation may run. A failed
        // file is recorded and does not cancel its siblings.
        let mut file_reports = Vec::new();
        let mut failed_files = Vec::new();

        for (path, handle) in handles {
            match handle.await {
                Ok(Ok(report)) => file_reports.push(report),
                Ok(Err(e)) => {
                    error!(file = %path.display(), error = %e, "file ingestion failed");
                    failed_files.push((path, e.to_string()));
                }
                Err(join_err) => {
                    error!(file = %path.display(), error = %join_err, "worker task panicked");
                    failed_files.push((path, join_err.to_string()));
                }
            }
            if let Some(p) = progress {
                p.file_done();
            }
        }

        let aggregation = if self.skip_aggregation {
            None
        } else {
            if let Some(p) = progress {
                p.set_message("Computing yearly statistics...");
            }
            Some(YearlyAggregator::new().aggregate(store).await?)
        };

        let report = IngestionReport {
            file_reports,
            failed_files,
            aggregation,
            elapsed: start.elapsed(),
        };

        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Ingested {} records from {} files",
                report.total_inserted(),
                report.file_reports.len()
            ));
        }

        Ok(report)
    }
}

impl Default for IngestionCoordinator {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
