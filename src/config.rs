//! Pipeline configuration.
//!
//! Options come from an optional TOML file and are then overridden by
//! command-line flags. Every field has a default, so an empty file (or no
//! file) runs the local fixture:
//!
//! ```toml
//! mode = "remote"
//! base_path = "/mnt/staging"
//! input_pattern = "logs/package_log_*.txt"
//! output_path = "output/output.txt"
//! partitions = 8
//! ```

use crate::error::{PipelineError, PipelineResult};
use crate::runner::{ExecMode, Runner};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_PATTERN: &str = "logs/package_log_*.txt";
pub const DEFAULT_OUTPUT_PATH: &str = "output/output.txt";

/// Where input comes from and where counts go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// In-memory sample log; counts are logged.
    #[default]
    Local,
    /// Log files under `base_path`; counts are written to a file.
    Remote,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOptions {
    pub mode: RunMode,
    /// Root for relative input and output paths. Required in remote mode.
    pub base_path: Option<PathBuf>,
    pub input_pattern: String,
    pub output_path: PathBuf,
    pub threads: Option<usize>,
    pub partitions: Option<usize>,
    pub sequential: bool,
    pub max_lines: Option<usize>,
    /// Log each parsed record. Defaults to on in local mode only.
    pub inspect_records: Option<bool>,
    pub metrics_path: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Local,
            base_path: None,
            input_pattern: DEFAULT_INPUT_PATTERN.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            threads: None,
            partitions: None,
            sequential: false,
            max_lines: None,
            inspect_records: None,
            metrics_path: None,
        }
    }
}

impl PipelineOptions {
    /// Local fixture run with defaults.
    #[must_use]
    pub fn local() -> Self {
        Self::default()
    }

    /// File run rooted at `base_path` with default input and output locations.
    #[must_use]
    pub fn remote(base_path: impl Into<PathBuf>) -> Self {
        Self {
            mode: RunMode::Remote,
            base_path: Some(base_path.into()),
            ..Self::default()
        }
    }

    /// Parse options from TOML text.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] for malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> PipelineResult<Self> {
        toml::from_str(text).map_err(|e| PipelineError::config(e.to_string()))
    }

    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check option combinations that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] describing the first problem found.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.mode == RunMode::Remote {
            match &self.base_path {
                Some(p) if !p.as_os_str().is_empty() => {}
                _ => return Err(PipelineError::config("remote mode requires base_path")),
            }
        }
        if self.input_pattern.trim().is_empty() {
            return Err(PipelineError::config("input_pattern must not be empty"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(PipelineError::config("output_path must not be empty"));
        }
        if self.threads == Some(0) {
            return Err(PipelineError::config("threads must be at least 1"));
        }
        if self.partitions == Some(0) {
            return Err(PipelineError::config("partitions must be at least 1"));
        }
        Ok(())
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if relative.is_relative() => base.join(relative),
            _ => relative.to_path_buf(),
        }
    }

    /// Input glob with `base_path` applied.
    #[must_use]
    pub fn resolved_input_pattern(&self) -> String {
        self.resolve(Path::new(&self.input_pattern))
            .to_string_lossy()
            .into_owned()
    }

    /// Output file with `base_path` applied.
    #[must_use]
    pub fn resolved_output_path(&self) -> PathBuf {
        self.resolve(&self.output_path)
    }

    #[must_use]
    pub fn inspect_enabled(&self) -> bool {
        self.inspect_records.unwrap_or(self.mode == RunMode::Local)
    }

    #[must_use]
    pub fn exec_mode(&self) -> ExecMode {
        if self.sequential {
            ExecMode::Sequential
        } else {
            ExecMode::Parallel {
                threads: self.threads,
                partitions: self.partitions,
            }
        }
    }

    /// Build the runner these options describe.
    #[must_use]
    pub fn runner(&self) -> Runner {
        Runner {
            mode: self.exec_mode(),
            max_lines: self.max_lines,
            inspect_records: self.inspect_enabled(),
            ..Runner::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_local_defaults() {
        let opts = PipelineOptions::from_toml_str("").unwrap();
        assert_eq!(opts, PipelineOptions::local());
        assert!(opts.inspect_enabled());
    }

    #[test]
    fn remote_paths_resolve_under_base() {
        let opts = PipelineOptions::remote("/staging");
        assert_eq!(
            opts.resolved_input_pattern(),
            "/staging/logs/package_log_*.txt"
        );
        assert_eq!(
            opts.resolved_output_path(),
            PathBuf::from("/staging/output/output.txt")
        );
        assert!(!opts.inspect_enabled());
    }

    #[test]
    fn absolute_output_ignores_base() {
        let opts = PipelineOptions {
            output_path: PathBuf::from("/tmp/counts.txt"),
            ..PipelineOptions::remote("/staging")
        };
        assert_eq!(opts.resolved_output_path(), PathBuf::from("/tmp/counts.txt"));
    }

    #[test]
    fn remote_without_base_is_invalid() {
        let opts = PipelineOptions {
            mode: RunMode::Remote,
            ..PipelineOptions::default()
        };
        assert!(matches!(opts.validate(), Err(PipelineError::Config(_))));
    }
}
