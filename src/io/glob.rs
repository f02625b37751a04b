//! File globbing for batch log inputs.
//!
//! ```no_run
//! use truckbeam::io::glob::expand_glob_required;
//!
//! let files = expand_glob_required("/data/logs/package_log_*.txt")?;
//! # Ok::<(), truckbeam::PipelineError>(())
//! ```

use crate::error::{PipelineError, PipelineResult};
use glob::glob;
use std::path::PathBuf;

/// Expand a glob pattern into a sorted list of matching files.
///
/// Directories are skipped. Zero matches is not an error here; see
/// [`expand_glob_required`].
///
/// # Errors
///
/// [`PipelineError::InvalidPattern`] for a malformed pattern and
/// [`PipelineError::SourceUnavailable`] when a matched path cannot be read.
pub fn expand_glob(pattern: &str) -> PipelineResult<Vec<PathBuf>> {
    let paths = glob(pattern).map_err(|e| PipelineError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut result = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            PipelineError::source_unavailable(path, e.into_error())
        })?;
        if path.is_file() {
            result.push(path);
        }
    }

    // deterministic read order
    result.sort();
    Ok(result)
}

/// Like [`expand_glob`], but zero matches is an error.
///
/// # Errors
///
/// Everything [`expand_glob`] returns, plus [`PipelineError::NoInputFiles`].
pub fn expand_glob_required(pattern: &str) -> PipelineResult<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        return Err(PipelineError::NoInputFiles {
            pattern: pattern.to_string(),
        });
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn matches_files_sorted_and_skips_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package_log_2.txt"), "").unwrap();
        fs::write(dir.path().join("package_log_1.txt"), "").unwrap();
        fs::create_dir(dir.path().join("package_log_dir.txt")).unwrap();

        let pattern = format!("{}/package_log_*.txt", dir.path().display());
        let files = expand_glob(&pattern).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["package_log_1.txt", "package_log_2.txt"]);
    }

    #[test]
    fn required_fails_on_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.txt", dir.path().display());
        let err = expand_glob_required(&pattern).unwrap_err();
        assert!(matches!(err, PipelineError::NoInputFiles { .. }));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = expand_glob("logs/[").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPattern { .. }));
    }
}
