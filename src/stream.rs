use std::io::{self, Cursor, Read, Result as IoResult, Seek, SeekFrom, Write};

/// Memory-backed, seekable buffer handed from one stage to the next.
///
/// A stage owns the stream it writes until the executor passes it on as the
/// next stage's input.
#[derive(Debug, Default, Clone)]
pub struct Stream {
    cursor: Cursor<Vec<u8>>,
}

impl Stream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream positioned at the start of `buf`.
    pub fn from_bytes(buf: impl Into<Vec<u8>>) -> Self {
        Self {
            cursor: Cursor::new(buf.into()),
        }
    }

    /// True when the stream holds no bytes at all, whatever the read position.
    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    /// The whole buffer, independent of the read position.
    pub fn as_bytes(&self) -> &[u8] {
        self.cursor.get_ref()
    }

    /// The whole buffer as text; invalid UTF-8 is replaced.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.cursor.into_inner()
    }

    /// Move the read position back to the start so the next reader sees everything.
    pub fn rewind(&mut self) {
        self.cursor.set_position(0);
    }
}

impl From<Vec<u8>> for Stream {
    fn from(buf: Vec<u8>) -> Self {
        Self::from_bytes(buf)
    }
}

impl From<String> for Stream {
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

impl From<&str> for Stream {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl Read for Stream {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

impl Write for Stream {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.cursor.write(data)
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> IoResult<u64> {
        self.cursor.seek(pos)
    }
}

/// The interactive input channel commands fall back to when they have nothing
/// else to read.
///
/// `exit` closes it; a closed source reads as empty.
pub struct StdinSource {
    reader: Option<Box<dyn Read>>,
}

impl StdinSource {
    /// Wrap any reader, e.g. a fixed buffer in tests.
    pub fn new(reader: impl Read + 'static) -> Self {
        Self {
            reader: Some(Box::new(reader)),
        }
    }

    /// The process standard input.
    pub fn inherited() -> Self {
        Self::new(io::stdin())
    }

    /// A source that is already closed.
    pub fn closed() -> Self {
        Self { reader: None }
    }

    /// Read everything that is left in the source.
    pub fn read_to_string(&mut self) -> IoResult<String> {
        let mut buf = String::new();
        if let Some(reader) = self.reader.as_mut() {
            reader.read_to_string(&mut buf)?;
        }
        Ok(buf)
    }

    pub fn close(&mut self) {
        self.reader = None;
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emptiness_check_keeps_read_position() {
        let mut stream = Stream::from("abc");
        let mut first = [0u8; 1];
        stream.read_exact(&mut first).unwrap();
        assert!(!stream.is_empty());

        let mut rest = String::new();
        stream.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "bc");
    }

    #[test]
    fn test_written_stream_reads_back_after_rewind() {
        let mut stream = Stream::new();
        assert!(stream.is_empty());
        write!(stream, "hello").unwrap();
        stream.rewind();

        let mut s = String::new();
        stream.read_to_string(&mut s).unwrap();
        assert_eq!(s, "hello");
    }

    #[test]
    fn test_closed_source_reads_empty() {
        let mut source = StdinSource::new(Cursor::new(b"typed\n".to_vec()));
        source.close();
        assert!(source.is_closed());
        assert_eq!(source.read_to_string().unwrap(), "");
    }
}
