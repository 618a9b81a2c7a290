use bytes::{Buf, Bytes};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::{self, Read};
use std::mem;

/// Byte source of a part body or an attachment
///
/// In-memory resources can be serialized any number of times. Reader
/// resources are one-shot: the first serialization takes the reader and
/// later ones fail with [`Error::Resource`](crate::Error::Resource). Callers
/// which serialize the same message twice have to supply fresh readers.
pub enum Resource {
    /// Shared in-memory data
    Memory(Bytes),

    /// One-shot stream which is read sequentially to the end
    Reader(Box<dyn Read + Send>),

    /// Reader already handed over to a serialization
    Consumed,
}

impl Resource {
    /// Empty in-memory resource
    #[inline]
    pub fn empty() -> Self {
        Resource::Memory(Bytes::new())
    }

    /// Wrap a readable stream
    #[inline]
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Resource::Reader(Box::new(reader))
    }

    /// Whether the one-shot reader was already taken
    #[inline]
    pub fn is_consumed(&self) -> bool {
        matches!(self, Resource::Consumed)
    }

    /// Produce the resource for one serialization pass
    ///
    /// Memory is shared, a reader moves out and leaves [`Resource::Consumed`] behind.
    pub(crate) fn share_or_take(&mut self) -> Resource {
        match self {
            Resource::Memory(data) => Resource::Memory(data.clone()),
            _ => mem::replace(self, Resource::Consumed),
        }
    }
}

impl Default for Resource {
    fn default() -> Self {
        Resource::empty()
    }
}

impl Read for Resource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Resource::Memory(data) => {
                let len = buf.len().min(data.remaining());
                data.copy_to_slice(&mut buf[..len]);
                Ok(len)
            }
            Resource::Reader(reader) => reader.read(buf),
            Resource::Consumed => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "resource stream was already consumed",
            )),
        }
    }
}

impl Debug for Resource {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Resource::Memory(data) => write!(f, "Resource::Memory({} bytes)", data.len()),
            Resource::Reader(_) => f.write_str("Resource::Reader"),
            Resource::Consumed => f.write_str("Resource::Consumed"),
        }
    }
}

impl From<Bytes> for Resource {
    fn from(data: Bytes) -> Self {
        Resource::Memory(data)
    }
}

impl From<Vec<u8>> for Resource {
    fn from(data: Vec<u8>) -> Self {
        Resource::Memory(data.into())
    }
}

impl From<String> for Resource {
    fn from(data: String) -> Self {
        Resource::Memory(data.into())
    }
}

impl From<&'static str> for Resource {
    fn from(data: &'static str) -> Self {
        Resource::Memory(Bytes::from_static(data.as_bytes()))
    }
}

impl From<&'static [u8]> for Resource {
    fn from(data: &'static [u8]) -> Self {
        Resource::Memory(Bytes::from_static(data))
    }
}
