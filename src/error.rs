use crate::header::ContentTransferEncoding;
use std::io;
use std::string::FromUtf8Error;

/// Result type of message composition and serialization
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while turning a message into bytes
///
/// Building the part tree never fails on bad input (unknown priority levels
/// and the like are ignored), so every variant here surfaces while streaming.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The body or attachment source could not be read
    #[error("Resource unavailable: {0}")]
    Resource(#[from] io::Error),

    /// The body contains data the transfer encoding cannot represent
    #[error("Content is not representable in {0} transfer encoding")]
    Coding(ContentTransferEncoding),

    /// The serialized message is not valid UTF-8 text
    #[error("Message is not UTF-8 text: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// The date could not be formatted as RFC 2822
    #[error("Date formatting error: {0}")]
    Format(#[from] time::error::Format),
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Resource(error) => error,
            other => io::Error::other(other),
        }
    }
}
