pub mod coordinator;
pub mod worker;

pub use coordinator::{IngestionCoordinator, IngestionReport};
pub use worker::{ingest_file, FileReport};
