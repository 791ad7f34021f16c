pub mod line_parser;
pub mod station_file;

pub use line_parser::parse_observation_line;
pub use station_file::{discover_station_files, station_id_from_path};
