pub mod observation;
pub mod stat;

pub use observation::Observation;
pub use stat::YearlyStat;
