//! Transparent decompression of input files.
//!
//! Codecs are detected by file extension first and by magic bytes second, so
//! a gzip file without a `.gz` suffix is still read correctly. With no codec
//! features enabled every file is read as plain text.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

#[cfg(feature = "compression-gzip")]
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Compression formats understood by [`open_reader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    Plain,
    #[cfg(feature = "compression-gzip")]
    Gzip,
}

#[cfg(feature = "compression-gzip")]
fn detect_from_extension(path: &Path) -> Option<Codec> {
    let name = path.to_string_lossy().to_lowercase();
    (name.ends_with(".gz") || name.ends_with(".gzip")).then_some(Codec::Gzip)
}

#[cfg(not(feature = "compression-gzip"))]
fn detect_from_extension(_path: &Path) -> Option<Codec> {
    None
}

#[cfg(feature = "compression-gzip")]
fn detect_from_magic<R: BufRead>(reader: &mut R) -> io::Result<Codec> {
    let buf = reader.fill_buf()?;
    Ok(if buf.starts_with(GZIP_MAGIC) {
        Codec::Gzip
    } else {
        Codec::Plain
    })
}

#[cfg(not(feature = "compression-gzip"))]
fn detect_from_magic<R: BufRead>(_reader: &mut R) -> io::Result<Codec> {
    Ok(Codec::Plain)
}

/// Open `path` for line reading, decompressing if needed.
///
/// # Errors
///
/// Any I/O error from opening or peeking at the file.
pub fn open_reader(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let mut reader = BufReader::new(File::open(path)?);
    let codec = match detect_from_extension(path) {
        Some(codec) => codec,
        None => detect_from_magic(&mut reader)?,
    };
    Ok(wrap(reader, codec))
}

fn wrap(reader: BufReader<File>, codec: Codec) -> Box<dyn BufRead> {
    match codec {
        Codec::Plain => Box::new(reader),
        #[cfg(feature = "compression-gzip")]
        Codec::Gzip => Box::new(BufReader::new(flate2::bufread::MultiGzDecoder::new(reader))),
    }
}
