pub mod yearly_aggregator;

pub use yearly_aggregator::{compute_yearly_stats, AggregationSummary, YearlyAggregator};
