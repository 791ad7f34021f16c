use crate::error::{PipelineError, Result};
use crate::models::{Observation, YearlyStat};
use crate::store::Store;
use futures::TryStreamExt;
use std::collections::BTreeMap;
use tracing::info;

/// Outcome counts for one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationSummary {
    pub scanned: usize,
    pub skipped: usize,
    pub groups: usize,
}

#[derive(Default)]
struct GroupAccumulator {
    count: i64,
    sum_max_temp: f64,
    sum_min_temp: f64,
    sum_precipitation: f64,
}

impl GroupAccumulator {
    fn add(&mut self, max_temp: f64, min_temp: f64, precipitation: f64) {
        self.count += 1;
        self.sum_max_temp += max_temp;
        self.sum_min_temp += min_temp;
        self.sum_precipitation += precipitation;
    }

    fn into_stat(self, year: i32, station: String) -> YearlyStat {
        let n = self.count as f64;
        YearlyStat::new(
            year,
            station,
            self.sum_max_temp / n,
            self.sum_min_temp / n,
            self.sum_precipitation / n,
            self.count,
        )
    }
}

/// Single-threaded full recompute of yearly per-station statistics.
///
/// Runs only after the ingestion barrier, so the store scan sees a
/// quiescent table. Idempotent: the output is a deterministic function of
/// the stored observations.
pub struct YearlyAggregator;

impl YearlyAggregator {
    pub fn new() -> Self {
        Self
    }

    pub async fn aggregate(&self, store: &Store) -> Result<AggregationSummary> {
        let mut rows = store.scan_observations();

        let mut groups: BTreeMap<(i32, String), GroupAccumulator> = BTreeMap::new();
        let mut scanned = 0;
        let mut skipped = 0;

        while let Some(observation) = rows
            .try_next()
            .await
            .map_err(|e| PipelineError::Aggregation(format!("observation scan failed: {e}")))?
        {
            scanned += 1;

            // An observation with any missing measurement contributes to
            // no group.
            let (max_temp, min_temp, precipitation) = match (
                observation.max_temp,
                observation.min_temp,
                observation.precipitation,
            ) {
                (Some(max), Some(min), Some(precip)) => (max, min, precip),
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            groups
                .entry((observation.year(), observation.station.clone()))
                .or_default()
                .add(max_temp, min_temp, precipitation);
        }

        // Release the scan connection before opening the write transaction.
        drop(rows);

        let stats: Vec<YearlyStat> = groups
            .into_iter()
            .map(|((year, station), acc)| acc.into_stat(year, station))
            .collect();

        let summary = AggregationSummary {
            scanned,
            skipped,
            groups: stats.len(),
        };

        // All groups commit in one transaction or none do.
        store
            .replace_yearly_stats(&stats)
            .await
            .map_err(|e| PipelineError::Aggregation(format!("stat upsert failed: {e}")))?;

        info!(
            scanned = summary.scanned,
            skipped = summary.skipped,
            groups = summary.groups,
            "aggregation pass complete"
        );

        Ok(summary)
    }
}

impl Default for YearlyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute yearly stats from an in-memory observation set.
///
/// Same grouping and exclusion rules as `aggregate`, without the store.
pub fn compute_yearly_stats(observations: &[Observation]) -> Vec<YearlyStat> {
    let mut groups: BTreeMap<(i32, String), GroupAccumulator> = BTreeMap::new();

    for observation in observations {
        if let (Some(max), Some(min), Some(precip)) = (
            observation.max_temp,
            observation.min_temp,
            observation.precipitation,
        ) {
            groups
                .entry((observation.year(), observation.station.clone()))
                .or_default()
                .add(max, min, precip);
        }
    }

    groups
        .into_iter()
        .map(|((year, station), acc)| acc.into_stat(year, station))
        .collect()
}
