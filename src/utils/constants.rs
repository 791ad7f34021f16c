/// Raw file format
pub const MISSING_SENTINEL: &str = "-9999";
pub const TENTHS_PER_UNIT: f64 = 10.0;

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const DEFAULT_DATABASE_FILE: &str = "weather_data.db";

/// Pagination defaults
pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 1000;
