use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};

/// Derive the station identifier from a source file path (file stem,
/// e.g. `wx_data/USC00110072.txt` -> `USC00110072`).
pub fn station_id_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            PipelineError::Config(format!(
                "Cannot derive station identifier from path: {}",
                path.display()
            ))
        })
}

/// Discover station source files in a directory.
///
/// Regular files only; subdirectories are ignored. Sorted by path so file
/// dispatch order is deterministic regardless of directory iteration order.
pub fn discover_station_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(PipelineError::Config(format!(
            "Input path is not a directory: {}",
            input_dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
