use serde::{Deserialize, Serialize};

/// One (year, station) aggregate, recomputed in full on every aggregation
/// pass. Averages are arithmetic means over the complete observations of
/// the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct YearlyStat {
    pub year: i32,
    pub station: String,
    pub avg_max_temp: f64,
    pub avg_min_temp: f64,
    pub avg_precipitation: f64,
    pub sample_count: i64,
}

impl YearlyStat {
    pub fn new(
        year: i32,
        station: String,
        avg_max_temp: f64,
        avg_min_temp: f64,
        avg_precipitation: f64,
        sample_count: i64,
    ) -> Self {
        Self {
            year,
            station,
            avg_max_temp,
            avg_min_temp,
            avg_precipitation,
            sample_count,
        }
    }
}
