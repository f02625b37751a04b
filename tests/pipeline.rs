//! End-to-end tests for local and remote pipeline runs.

use std::fs;
use std::path::PathBuf;
use truckbeam::pipeline::{Pipeline, Sink, Source, format_counts, read_source};
use truckbeam::testing::{assert_counts_eq, assert_unordered_eq};
use truckbeam::{PipelineError, PipelineOptions, Runner};

const LOG_A: &str = "0, AN, 1467394122, 423, 372A3SZ4J98\n\
0, AN, 1467394122, 423##############\n\
1, AK, 1467394123, 102, 320893JSEFE\n";
const LOG_B: &str = "404 - broken message\n1, AN, 1467394123, 423, 372A3SZ4J98\n";

fn write_logs(base: &std::path::Path) {
    let logs = base.join("logs");
    fs::create_dir_all(&logs).unwrap();
    fs::write(logs.join("package_log_1.txt"), LOG_A).unwrap();
    fs::write(logs.join("package_log_2.txt"), LOG_B).unwrap();
    fs::write(logs.join("other.txt"), "1, ZZ, 1, 1, P\n").unwrap();
}

#[test]
fn local_mode_runs_fixture_to_log() -> anyhow::Result<()> {
    let pipeline = Pipeline::from_options(&PipelineOptions::local())?;
    assert_eq!(pipeline.sink(), &Sink::Log);
    assert!(matches!(pipeline.source(), Source::Fixture(_)));

    let report = pipeline.run()?;
    assert_eq!(report.metrics.rejected(), 3);
    assert_unordered_eq(
        &report.output_lines,
        &["AN: 3".to_string(), "AK: 4".to_string(), "BK: 4".to_string()],
    );
    Ok(())
}

#[test]
fn remote_mode_reads_glob_and_writes_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_logs(dir.path());

    let report = Pipeline::from_options(&PipelineOptions::remote(dir.path()))?
        .run()?;
    assert_eq!(report.metrics.lines_read, 5);
    assert_eq!(report.metrics.rejected(), 2);
    assert_counts_eq(&report.outcome.counts, &[("AN", 2), ("AK", 1)]);

    let written = fs::read_to_string(dir.path().join("output/output.txt"))?;
    let mut lines: Vec<String> = written.lines().map(str::to_string).collect();
    lines.sort();
    assert_eq!(lines, vec!["AK: 1", "AN: 2"]);
    Ok(())
}

#[test]
fn corrupt_bytes_are_counted_not_fatal() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let logs = dir.path().join("logs");
    fs::create_dir_all(&logs)?;
    let mut data = Vec::new();
    data.extend_from_slice(b"0, AN, 1467394122, 423, 372A3SZ4J98\n");
    data.extend_from_slice(b"1, AK, 1467394123, 102, PKG\xff\xfe\n");
    data.extend_from_slice(b"\xff\xfe\n");
    data.extend_from_slice(b"1, AK, 1467394124, 102, 320893JSEFE\n");
    fs::write(logs.join("package_log_1.txt"), data)?;

    let report = Pipeline::from_options(&PipelineOptions::remote(dir.path()))?
        .run()?;
    assert_eq!(report.metrics.lines_read, 4);
    assert_eq!(report.metrics.rejected(), 1);
    assert_counts_eq(&report.outcome.counts, &[("AN", 1), ("AK", 2)]);
    assert!(dir.path().join("output/output.txt").exists());
    Ok(())
}

#[test]
fn missing_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = Pipeline::from_options(&PipelineOptions::remote(dir.path()))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(err.is_source_error());
    assert!(!dir.path().join("output/output.txt").exists());
}

#[test]
fn unwritable_sink_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    // a regular file where the output directory should be
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let pipeline = Pipeline::new(
        Source::Fixture(vec!["0, AN, 1, 1, P".to_string()]),
        Sink::File(blocker.join("out.txt")),
        Runner::sequential(),
    );
    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::SinkWriteFailure { .. }));
}

#[test]
fn metrics_file_is_written() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let metrics_path: PathBuf = dir.path().join("metrics.json");
    let pipeline = Pipeline::new(
        Source::Fixture(vec!["0, AN, 1, 1, P".to_string(), "junk".to_string()]),
        Sink::Log,
        Runner::sequential(),
    )
    .with_metrics_path(&metrics_path);
    pipeline.run()?;

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&metrics_path)?)?;
    assert_eq!(v["invalidLogLines"], 1);
    assert_eq!(v["validRecords"], 1);
    assert_eq!(v["linesRead"], 2);
    Ok(())
}

#[test]
fn stages_compose() -> anyhow::Result<()> {
    let lines = read_source(&Source::Fixture(vec!["x".to_string()]))?;
    assert_eq!(lines, vec!["x"]);
    assert_eq!(format_counts(&[("AN".to_string(), 2)]), vec!["AN: 2"]);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn remote_mode_reads_gzip_logs() -> anyhow::Result<()> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let dir = tempfile::tempdir()?;
    let logs = dir.path().join("logs");
    fs::create_dir_all(&logs)?;
    fs::write(logs.join("package_log_1.txt"), LOG_A)?;
    let mut enc = GzEncoder::new(
        fs::File::create(logs.join("package_log_2.txt.gz"))?,
        Compression::default(),
    );
    enc.write_all(LOG_B.as_bytes())?;
    enc.finish()?;

    let opts = PipelineOptions {
        input_pattern: "logs/package_log_*".to_string(),
        ..PipelineOptions::remote(dir.path())
    };
    let report = Pipeline::from_options(&opts)?.run()?;
    assert_eq!(report.metrics.rejected(), 2);
    assert_counts_eq(&report.outcome.counts, &[("AN", 2), ("AK", 1)]);
    Ok(())
}
