use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One station-day weather reading.
///
/// The store enforces at most one row per (date, station). Measurement
/// fields are `None` where the source file carried the missing-value
/// sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Observation {
    pub date: NaiveDate,
    pub station: String,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub precipitation: Option<f64>,
}

impl Observation {
    pub fn new(
        date: NaiveDate,
        station: String,
        max_temp: Option<f64>,
        min_temp: Option<f64>,
        precipitation: Option<f64>,
    ) -> Self {
        Self {
            date,
            station,
            max_temp,
            min_temp,
            precipitation,
        }
    }

    /// True when all three measurements are present. Incomplete
    /// observations are stored but excluded from aggregation.
    pub fn is_complete(&self) -> bool {
        self.max_temp.is_some() && self.min_temp.is_some() && self.precipitation.is_some()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}
