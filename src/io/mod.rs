//! Line-oriented sources and sinks.
//!
//! - [`glob`] expands an input pattern into the files to read.
//! - [`compression`] transparently decompresses `.gz` inputs.
//! - [`text`] reads input lines and writes output lines.

pub mod compression;
pub mod glob;
pub mod text;

pub use glob::{expand_glob, expand_glob_required};
pub use text::{read_lines, read_lines_from_pattern, write_lines};
