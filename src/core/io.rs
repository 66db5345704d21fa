//! Input helpers
//!
//! Opens table files with transparent gzip/bzip2 decompression and provides
//! a line iterator that reuses its buffer.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Compression format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Plain text (uncompressed)
    Plain,
    /// Gzip compressed (.gz)
    Gzip,
    /// Bzip2 compressed (.bz2)
    Bzip2,
}

/// Detect compression format from file path and/or content
///
/// The extension wins; otherwise the gzip (1f 8b) and bzip2 ("BZh") magic
/// bytes are checked.
pub fn detect_compression(path: &Path) -> io::Result<CompressionFormat> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    // First check by extension
    if extension == "gz" {
        return Ok(CompressionFormat::Gzip);
    }
    if extension == "bz2" {
        return Ok(CompressionFormat::Bzip2);
    }

    // Then check by magic bytes
    let mut file = File::open(path)?;
    let mut magic = [0u8; 3];
    let bytes_read = file.read(&mut magic)?;

    if bytes_read >= 2 && magic[0] == 0x1f && magic[1] == 0x8b {
        return Ok(CompressionFormat::Gzip);
    }
    if bytes_read >= 3 && magic[0] == 0x42 && magic[1] == 0x5a && magic[2] == 0x68 {
        return Ok(CompressionFormat::Bzip2);
    }

    Ok(CompressionFormat::Plain)
}

/// Open a table file for buffered line reading, decompressing if needed
pub fn open_reader<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let format = detect_compression(path)?;
    let file = File::open(path)?;

    Ok(match format {
        CompressionFormat::Gzip => Box::new(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            flate2::read::MultiGzDecoder::new(file),
        )),
        CompressionFormat::Bzip2 => Box::new(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            bzip2::read::BzDecoder::new(file),
        )),
        CompressionFormat::Plain => Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file)),
    })
}

/// Line iterator that reuses a buffer to avoid allocations
pub struct LineIterator<R: BufRead> {
    reader: R,
    buffer: String,
    line_number: usize,
}

impl<R: BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(1024),
            line_number: 0,
        }
    }

    /// Read the next line into the internal buffer
    /// Returns None at EOF, Some(Ok(&str)) on success, Some(Err) on error
    pub fn next_line(&mut self) -> Option<io::Result<&str>> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => None, // EOF
            Ok(_) => {
                self.line_number += 1;
                // Remove trailing newline
                if self.buffer.ends_with('\n') {
                    self.buffer.pop();
                    if self.buffer.ends_with('\r') {
                        self.buffer.pop();
                    }
                }
                Some(Ok(&self.buffer))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Like [`next_line`](Self::next_line), paired with the 1-based line number
    pub fn next_numbered(&mut self) -> Option<io::Result<(usize, &str)>> {
        let line_number = self.line_number + 1;
        self.next_line().map(|res| res.map(|line| (line_number, line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_buffer_size() {
        assert_eq!(DEFAULT_BUFFER_SIZE, 128 * 1024);
    }

    #[test]
    fn test_detect_plain() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "TR1\tCHR1\t3\t8M7D6M2I2M11D7M")?;
        temp.flush()?;
        assert_eq!(detect_compression(temp.path())?, CompressionFormat::Plain);
        Ok(())
    }

    #[test]
    fn test_open_gzip_by_magic() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        {
            let mut encoder =
                flate2::write::GzEncoder::new(temp.as_file_mut(), flate2::Compression::default());
            encoder.write_all(b"TR1\t4\nTR2\t0\n")?;
            encoder.finish()?;
        }
        assert_eq!(detect_compression(temp.path())?, CompressionFormat::Gzip);

        let mut iter = LineIterator::new(open_reader(temp.path())?);
        assert_eq!(iter.next_line().unwrap()?, "TR1\t4");
        assert_eq!(iter.next_line().unwrap()?, "TR2\t0");
        assert!(iter.next_line().is_none());
        Ok(())
    }

    #[test]
    fn test_open_bzip2_by_extension() -> io::Result<()> {
        let mut temp = tempfile::Builder::new().suffix(".bz2").tempfile()?;
        {
            let mut encoder =
                bzip2::write::BzEncoder::new(temp.as_file_mut(), bzip2::Compression::default());
            encoder.write_all(b"TR1\t13\n")?;
            encoder.finish()?;
        }
        assert_eq!(detect_compression(temp.path())?, CompressionFormat::Bzip2);

        let mut iter = LineIterator::new(open_reader(temp.path())?);
        assert_eq!(iter.next_line().unwrap()?, "TR1\t13");
        assert!(iter.next_line().is_none());
        Ok(())
    }

    #[test]
    fn test_line_iterator() -> io::Result<()> {
        let data: &[u8] = b"line1\r\nline2\nline3";
        let mut iter = LineIterator::new(data);

        assert_eq!(iter.next_numbered().unwrap()?, (1, "line1"));
        assert_eq!(iter.next_line().unwrap()?, "line2");
        assert_eq!(iter.next_numbered().unwrap()?, (3, "line3"));
        assert!(iter.next_numbered().is_none());
        Ok(())
    }
}
