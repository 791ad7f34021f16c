use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed date '{value}': expected YYYYMMDD")]
    MalformedDate { value: String },

    #[error("Malformed number '{value}': expected integer tenths")]
    MalformedNumber { value: String },

    #[error("Malformed record: expected 4 tab-separated fields, got {fields}")]
    MalformedRecord { fields: usize },

    #[error("Duplicate observation for {station} on {date}")]
    DuplicateKey {
        date: chrono::NaiveDate,
        station: String,
    },

    #[error("Storage error: {0}")]
    Storage(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Parse-level failures are recovered per line; everything else is fatal
    /// for the file (or pass) that raised it.
    pub fn is_recoverable_parse_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MalformedDate { .. }
                | PipelineError::MalformedNumber { .. }
                | PipelineError::MalformedRecord { .. }
        )
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_are_recoverable() {
        assert!(PipelineError::MalformedDate {
            value: "2020011".to_string()
        }
        .is_recoverable_parse_error());

        assert!(PipelineError::MalformedNumber {
            value: "abc".to_string()
        }
        .is_recoverable_parse_error());

        assert!(PipelineError::MalformedRecord { fields: 2 }.is_recoverable_parse_error());
    }

    #[test]
    fn test_storage_errors_are_fatal() {
        let err = PipelineError::Storage(sqlx::Error::PoolClosed);
        assert!(!err.is_recoverable_parse_error());

        let dup = PipelineError::DuplicateKey {
            date: chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            station: "USC001".to_string(),
        };
        assert!(!dup.is_recoverable_parse_error());
    }
}
