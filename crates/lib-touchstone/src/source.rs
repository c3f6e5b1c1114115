//! Line sources feeding a Touchstone document.
//!
//! Anything with a name and a way to hand out raw lines can be parsed: a file
//! on disk, an archive member, or an in-memory string in tests.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::Path;

/// A named, line-oriented byte source.
pub trait LineSource {
    /// Name of the underlying file, used to derive the part name.
    fn name(&self) -> &str;

    /// Next raw line (terminator included or not), `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        (**self).read_line()
    }
}

/// `LineSource` over any buffered reader.
#[derive(Debug)]
pub struct ReaderSource<R> {
    name: String,
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

impl ReaderSource<Cursor<Vec<u8>>> {
    /// In-memory source, handy for tests and WASM-like environments.
    pub fn from_string(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(name, Cursor::new(content.into().into_bytes()))
    }
}

impl ReaderSource<BufReader<File>> {
    /// Open a file on disk; the source is named after the path.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(path.to_string_lossy(), BufReader::new(file)))
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf))
    }
}

/// Vendor files are Latin-1; every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_source_lines() {
        let mut src = ReaderSource::from_string("a.s1p", "one\ntwo\r\nthree");
        assert_eq!(src.name(), "a.s1p");
        assert_eq!(src.read_line().unwrap().unwrap(), b"one\n");
        assert_eq!(src.read_line().unwrap().unwrap(), b"two\r\n");
        assert_eq!(src.read_line().unwrap().unwrap(), b"three");
        assert!(src.read_line().unwrap().is_none());
    }

    #[test]
    fn test_latin1_decoding() {
        assert_eq!(decode_latin1(b"W\xfcrth \xb5H"), "Würth µH");
    }
}
