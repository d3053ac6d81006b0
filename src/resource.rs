//! Sources a stream-consuming command reads from.
//!
//! Named files come first, in argument order. Piped input, when present and
//! non-empty, is one more source after them.

use crate::error::ShellError;
use crate::stream::Stream;
use std::fs::File;
use std::io::Read;

/// Label used for piped input.
pub const PIPE_LABEL: &str = "pipe";

/// A source before it has been opened.
#[derive(Debug)]
pub enum Resource {
    Named(String),
    Piped(Stream),
}

/// An open, readable source. Dropping it closes the underlying file.
pub struct OpenResource {
    label: String,
    reader: Box<dyn Read>,
}

impl OpenResource {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Read the whole source as raw bytes.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, ShellError> {
        let mut buf = Vec::new();
        self.reader
            .read_to_end(&mut buf)
            .map_err(|source| ShellError::Read {
                name: self.label.clone(),
                source,
            })?;
        Ok(buf)
    }

    /// Read the whole source as text; invalid UTF-8 is replaced.
    pub fn read_text(&mut self) -> Result<String, ShellError> {
        let bytes = self.read_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Resource {
    pub fn open(self) -> Result<OpenResource, ShellError> {
        match self {
            Resource::Named(name) => match File::open(&name) {
                Ok(file) => Ok(OpenResource {
                    label: name,
                    reader: Box::new(file),
                }),
                Err(source) => Err(ShellError::Resource { name, source }),
            },
            Resource::Piped(mut stream) => {
                stream.rewind();
                Ok(OpenResource {
                    label: PIPE_LABEL.to_string(),
                    reader: Box::new(stream),
                })
            }
        }
    }
}

/// Ordered source list for a command: `names` first, then `input` unless it is
/// absent or empty.
pub fn collect(names: &[String], input: Option<Stream>) -> Vec<Resource> {
    names
        .iter()
        .cloned()
        .map(Resource::Named)
        .chain(input.filter(|s| !s.is_empty()).map(Resource::Piped))
        .collect()
}

/// Open sources one at a time, in order. A file is opened only when the
/// iterator reaches it, so at most one is held open by a caller that drops each
/// item before advancing.
pub fn open_all(resources: Vec<Resource>) -> impl Iterator<Item = Result<OpenResource, ShellError>> {
    resources.into_iter().map(Resource::open)
}
