//! Reading log lines and writing count lines.

use crate::error::{PipelineError, PipelineResult};
use crate::io::compression::open_reader;
use crate::io::glob::expand_glob_required;
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read every line of every file in `paths`, in order.
///
/// A trailing `\r` is stripped so CRLF logs parse the same as LF logs.
/// Invalid UTF-8 is replaced with U+FFFD rather than failing the read, so a
/// corrupt line reaches the parser and is counted there.
///
/// # Errors
///
/// [`PipelineError::SourceUnavailable`] if any file cannot be opened or read.
pub fn read_lines(paths: &[PathBuf]) -> PipelineResult<Vec<String>> {
    let mut out = Vec::new();
    for path in paths {
        let mut reader =
            open_reader(path).map_err(|e| PipelineError::source_unavailable(path, e))?;
        let before = out.len();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| PipelineError::source_unavailable(path, e))?;
            if n == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            out.push(String::from_utf8_lossy(&buf).into_owned());
        }
        debug!(path = %path.display(), lines = out.len() - before, "read input file");
    }
    Ok(out)
}

/// Expand `pattern` and read all matching files.
///
/// # Errors
///
/// Any error from [`expand_glob_required`] or [`read_lines`].
pub fn read_lines_from_pattern(pattern: &str) -> PipelineResult<Vec<String>> {
    let files = expand_glob_required(pattern)?;
    read_lines(&files)
}

/// Write one line per entry to `path`, creating parent directories.
///
/// # Errors
///
/// [`PipelineError::SinkWriteFailure`] on any I/O failure.
pub fn write_lines(path: &Path, lines: &[String]) -> PipelineResult<usize> {
    let fail = |e: std::io::Error| PipelineError::sink_write_failure(path, e);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(fail)?;
        }
    }
    let mut w = BufWriter::new(File::create(path).map_err(fail)?);
    for line in lines {
        writeln!(w, "{line}").map_err(fail)?;
    }
    w.flush().map_err(fail)?;
    Ok(lines.len())
}
