//! Tests for loading and validating pipeline options.

use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use truckbeam::{ExecMode, PipelineError, PipelineOptions, RunMode};

#[test]
fn load_options_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
mode = "remote"
base_path = "/mnt/staging"
input_pattern = "logs/*.txt.gz"
partitions = 8
threads = 2
metrics_path = "/tmp/metrics.json"
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let opts = PipelineOptions::from_file(file.path()).unwrap();
    assert_eq!(opts.mode, RunMode::Remote);
    assert_eq!(opts.resolved_input_pattern(), "/mnt/staging/logs/*.txt.gz");
    assert_eq!(
        opts.resolved_output_path(),
        PathBuf::from("/mnt/staging/output/output.txt")
    );
    assert_eq!(
        opts.exec_mode(),
        ExecMode::Parallel {
            threads: Some(2),
            partitions: Some(8),
        }
    );
    assert!(opts.validate().is_ok());
}

#[test]
fn unknown_keys_are_rejected() {
    let err = PipelineOptions::from_toml_str("runner = \"dataflow\"").unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn zero_partitions_is_invalid() {
    let opts = PipelineOptions {
        partitions: Some(0),
        ..PipelineOptions::local()
    };
    assert!(matches!(opts.validate(), Err(PipelineError::Config(_))));
}

#[test]
fn missing_config_file_is_config_error() {
    let err = PipelineOptions::from_file("/definitely/not/here.toml").unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn sequential_flag_selects_sequential_runner() {
    let opts = PipelineOptions {
        sequential: true,
        max_lines: Some(3),
        ..PipelineOptions::local()
    };
    let runner = opts.runner();
    assert_eq!(runner.mode, ExecMode::Sequential);
    assert_eq!(runner.max_lines, Some(3));
    assert!(runner.inspect_records);
}
