use crate::error::Result;
use crate::readers::{parse_observation_line, station_id_from_path};
use crate::store::Store;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use std::path::Path;
use std::time::Instant;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, info, warn};

/// Per-file ingestion counts returned to the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub station: String,
    pub lines_read: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub parse_failures: usize,
}

/// Ingest one station source file.
///
/// Fail-soft per line: a malformed line is logged and skipped, and a
/// duplicate key is a skip, not an error. Storage and I/O failures abort
/// the file and surface to the coordinator.
pub async fn ingest_file(store: &Store, path: &Path) -> Result<FileReport> {
    let station = station_id_from_path(path)?;
    let start = Instant::now();

    let mut report = FileReport {
        station: station.clone(),
        ..FileReport::default()
    };

    let file = tokio::fs::File::open(path).await?;
    let reader = tokio::io::BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        report.lines_read += 1;

        if line.trim().is_empty() {
            continue;
        }

        let observation = match parse_observation_line(&line, &station) {
            Ok(observation) => observation,
            Err(e) if e.is_recoverable_parse_error() => {
                warn!(
                    station = %station,
                    line = report.lines_read,
                    error = %e,
                    "skipping malformed line"
                );
                report.parse_failures += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        // Atomic insert-if-absent resolves the dedup race against
        // concurrent workers at the store.
        if store.insert_observation_if_absent(&observation).await? {
            report.inserted += 1;
        } else {
            debug!(
                station = %station,
                date = %observation.date,
                "duplicate observation skipped"
            );
            report.duplicates += 1;
        }
    }

    info!(
        station = %station,
        lines = report.lines_read,
        inserted = report.inserted,
        duplicates = report.duplicates,
        parse_failures = report.parse_failures,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "file ingested"
    );

    Ok(report)
}
