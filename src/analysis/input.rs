use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::record::JobRecord;
use crate::error::{CIToolError, Result};
use crate::providers::circleci::RawJobResult;

/// Reads every file (a JSON array of build results) and concatenates the records in order.
///
/// Empty paths are skipped.
pub fn load_records<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<JobRecord>> {
    let mut records = Vec::new();
    for path in paths {
        let path: &Path = path.as_ref();
        if path.as_os_str().is_empty() {
            continue;
        }
        debug!("Input file: {}", path.display());
        records.extend(read_file(path)?);
    }
    Ok(records)
}

fn read_file(path: &Path) -> Result<Vec<JobRecord>> {
    let contents = fs::read_to_string(path).map_err(|source| CIToolError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: Vec<RawJobResult> =
        serde_json::from_str(&contents).map_err(|source| CIToolError::ParseInput {
            path: path.to_path_buf(),
            source,
        })?;
    raw.into_iter().map(JobRecord::try_from).collect()
}

/// Lists the `*.json` files directly inside `dir`, sorted by file name.
pub fn discover_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        CIToolError::NoInput(format!("cannot read directory {}: {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    debug!("Discovered {} input files in {}", files.len(), dir.display());
    Ok(files)
}
