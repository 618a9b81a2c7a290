//! Incremental content transfer encoding
//!
//! Codecs turn source chunks into encoded chunks while keeping whatever state
//! crosses chunk borders (partial base64 triples, unfinished lines, line
//! length). [`EncoderStream`] pulls a reader chunk by chunk through a codec so
//! bodies are never materialized in memory.

use crate::error::{Error, Result};
use crate::header::ContentTransferEncoding;
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::{ErrorKind, Read};

/// Default size of chunks pulled from body sources
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

pub trait EncoderCodec: Send {
    /// Encode the next chunk of source data
    fn encode_chunk(&mut self, chunk: Bytes) -> Result<Bytes>;

    /// Flush data held back for following chunks
    fn finish(&mut self) -> Result<Bytes> {
        Ok(Bytes::new())
    }
}

/// 7bit codec
///
struct SevenBitCodec {
    line_wrapper: EightBitCodec,
}

impl SevenBitCodec {
    pub fn new() -> Self {
        SevenBitCodec {
            line_wrapper: EightBitCodec::new(),
        }
    }
}

impl EncoderCodec for SevenBitCodec {
    fn encode_chunk(&mut self, chunk: Bytes) -> Result<Bytes> {
        if chunk.iter().all(u8::is_ascii) {
            self.line_wrapper.encode_chunk(chunk)
        } else {
            Err(Error::Coding(ContentTransferEncoding::SevenBit))
        }
    }
}

/// Quoted-Printable codec
///
/// Complete lines are encoded at once so soft line breaks and trailing
/// whitespace do not depend on the chunking. An unfinished line longer than
/// [`QP_MAX_TAIL`] is flushed early ending with a soft line break, so at most
/// that many bytes are held between chunks.
struct QuotedPrintableCodec {
    pending: BytesMut,
}

/// Source bytes of an unfinished line kept for the next chunk
const QP_MAX_TAIL: usize = 76;

/// Encoded characters per line, leaving room for the soft break `=`
const QP_MAX_LINE: usize = 76 - 1;

// Worst case encoded length of a source byte
fn qp_cost(b: u8) -> usize {
    match b {
        b'=' | b' ' | b'\t' => 3,
        b'!'..=b'~' => 1,
        _ => 3,
    }
}

impl QuotedPrintableCodec {
    pub fn new() -> Self {
        QuotedPrintableCodec {
            pending: BytesMut::new(),
        }
    }
}

impl EncoderCodec for QuotedPrintableCodec {
    fn encode_chunk(&mut self, chunk: Bytes) -> Result<Bytes> {
        self.pending.extend_from_slice(&chunk);

        let mut out = BytesMut::new();
        if let Some(last_break) = self.pending.iter().rposition(|b| *b == b'\n') {
            let lines = self.pending.split_to(last_break + 1);
            out.extend_from_slice(&quoted_printable::encode(&lines[..]));
        }

        // the held back tail always ends the pending line, so a trailing CR
        // stays with the LF which may follow it
        while self.pending.len() > QP_MAX_TAIL {
            let mut cost = 0;
            let piece = self
                .pending
                .iter()
                .take_while(|b| {
                    cost += qp_cost(**b);
                    cost <= QP_MAX_LINE
                })
                .count();
            let piece = self.pending.split_to(piece);
            out.extend_from_slice(&quoted_printable::encode(&piece[..]));
            out.extend_from_slice(b"=\r\n");
        }

        Ok(out.freeze())
    }

    fn finish(&mut self) -> Result<Bytes> {
        let rest = self.pending.split();
        Ok(quoted_printable::encode(&rest[..]).into())
    }
}

/// Base64 codec
///
struct Base64Codec {
    pending: BytesMut,
    line_wrapper: EightBitCodec,
}

impl Base64Codec {
    pub fn new() -> Self {
        Base64Codec {
            pending: BytesMut::with_capacity(3),
            line_wrapper: EightBitCodec::new().with_limit(78 - 2),
        }
    }
}

impl EncoderCodec for Base64Codec {
    fn encode_chunk(&mut self, chunk: Bytes) -> Result<Bytes> {
        self.pending.extend_from_slice(&chunk);

        let whole = self.pending.len() / 3 * 3;
        let triples = self.pending.split_to(whole);
        let encoded = STANDARD.encode(&triples[..]);

        self.line_wrapper.encode_chunk(encoded.into())
    }

    fn finish(&mut self) -> Result<Bytes> {
        let rest = self.pending.split();
        if rest.is_empty() {
            return Ok(Bytes::new());
        }
        self.line_wrapper.encode_chunk(STANDARD.encode(&rest[..]).into())
    }
}

/// 8bit codec
///
/// Breaks lines which would exceed the limit, existing line breaks reset it.
struct EightBitCodec {
    max_length: usize,
    line_bytes: usize,
}

const DEFAULT_MAX_LINE_LENGTH: usize = 1000 - 2;

impl EightBitCodec {
    pub fn new() -> Self {
        EightBitCodec {
            max_length: DEFAULT_MAX_LINE_LENGTH,
            line_bytes: 0,
        }
    }

    pub fn with_limit(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

impl EncoderCodec for EightBitCodec {
    fn encode_chunk(&mut self, chunk: Bytes) -> Result<Bytes> {
        let mut out = BytesMut::with_capacity(chunk.len() + chunk.len() / self.max_length * 2 + 2);
        let mut src = &chunk[..];

        while !src.is_empty() {
            // break deferred until more data proves the line continues
            let at_line_end = src.starts_with(b"\n") || src.starts_with(b"\r\n") || src == b"\r";
            if self.line_bytes >= self.max_length && !at_line_end {
                out.put_slice(b"\r\n");
                self.line_bytes = 0;
            }

            let room = self.max_length.saturating_sub(self.line_bytes);
            let window = &src[..src.len().min(room + 2)];

            // a CRLF right after a full line still ends it
            let line_break = window
                .iter()
                .position(|b| *b == b'\n')
                .filter(|&pos| pos <= room || window[pos - 1] == b'\r');

            let taken = match line_break {
                Some(line_break) => {
                    self.line_bytes = 0;
                    line_break + 1
                }
                None => {
                    // a lone CR at the limit goes out ahead of its LF
                    let taken = src.len().min(room).max(1);
                    self.line_bytes += taken;
                    taken
                }
            };

            out.put_slice(&src[..taken]);
            src = &src[taken..];
        }

        Ok(out.freeze())
    }
}

/// Binary codec
///
struct BinaryCodec;

impl EncoderCodec for BinaryCodec {
    fn encode_chunk(&mut self, chunk: Bytes) -> Result<Bytes> {
        Ok(chunk)
    }
}

pub struct EncoderChunk;

impl EncoderChunk {
    pub fn get(encoding: Option<ContentTransferEncoding>) -> Box<dyn EncoderCodec> {
        use self::ContentTransferEncoding::*;
        match encoding {
            Some(SevenBit) => Box::new(SevenBitCodec::new()),
            Some(QuotedPrintable) => Box::new(QuotedPrintableCodec::new()),
            Some(Base64) => Box::new(Base64Codec::new()),
            Some(EightBit) => Box::new(EightBitCodec::new()),
            Some(Binary) | None => Box::new(BinaryCodec),
        }
    }
}

/// Generic data encoder
///
/// Yields encoded chunks of the source, finishing with whatever the codec held back.
pub struct EncoderStream<S> {
    source: S,
    encoder: Box<dyn EncoderCodec>,
    buffer: Vec<u8>,
    done: bool,
}

impl<S> EncoderStream<S> {
    pub fn new(source: S, encoder: Box<dyn EncoderCodec>) -> Self {
        EncoderStream::with_chunk_size(source, encoder, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(source: S, encoder: Box<dyn EncoderCodec>, chunk_size: usize) -> Self {
        EncoderStream {
            source,
            encoder,
            buffer: vec![0; chunk_size.max(1)],
            done: false,
        }
    }

    pub fn wrap(encoding: Option<ContentTransferEncoding>, source: S) -> EncoderStream<S>
    where
        S: Read,
    {
        EncoderStream::new(source, EncoderChunk::get(encoding))
    }

    fn poll(&mut self) -> Result<Option<Bytes>>
    where
        S: Read,
    {
        let read = loop {
            match self.source.read(&mut self.buffer) {
                Ok(read) => break read,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => return Err(Error::Resource(error)),
            }
        };

        if read == 0 {
            self.done = true;
            return self.encoder.finish().map(Some);
        }

        tracing::trace!(read, "encoding body chunk");
        self.encoder
            .encode_chunk(Bytes::copy_from_slice(&self.buffer[..read]))
            .map(Some)
    }
}

impl<S> Iterator for EncoderStream<S>
where
    S: Read,
{
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.poll() {
                Ok(Some(chunk)) if chunk.is_empty() => continue,
                Ok(chunk) => return chunk.map(Ok),
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
            }
        }
        None
    }
}
