use crate::encoder::{EncoderChunk, EncoderStream, DEFAULT_CHUNK_SIZE};
use crate::error::Result;
use crate::header::{name, ContentTransferEncoding, Headers, Parameters};
use crate::resource::Resource;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use mime::Mime;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use textnonce::TextNonce;

/// MIME part variants
///
pub enum Part {
    /// Single part with content
    ///
    Single(SinglePart),

    /// Multiple parts of content
    ///
    Multi(MultiPart),
}

impl Part {
    /// Get the headers of the part
    #[inline]
    pub fn headers(&self) -> &Headers {
        match self {
            Part::Single(part) => part.headers(),
            Part::Multi(part) => part.headers(),
        }
    }

    /// Get a mutable reference to the headers
    #[inline]
    pub fn headers_mut(&mut self) -> &mut Headers {
        match self {
            Part::Single(part) => part.headers_mut(),
            Part::Multi(part) => part.headers_mut(),
        }
    }

    /// Parsed `Content-Type:` of the part
    pub fn content_type(&self) -> Option<Mime> {
        self.headers().get(name::CONTENT_TYPE)?.parse().ok()
    }

    /// Streaming part using the default chunk size
    #[inline]
    pub fn into_stream(self) -> PartStream {
        self.into_stream_chunked(DEFAULT_CHUNK_SIZE)
    }

    /// Streaming part reading bodies by `chunk_size` bytes
    pub fn into_stream_chunked(self, chunk_size: usize) -> PartStream {
        match self {
            Part::Single(part) => PartStream::Single(part.into_stream_chunked(chunk_size)),
            Part::Multi(part) => PartStream::Multi(part.into_stream_chunked(chunk_size)),
        }
    }

    /// Readable serialized part
    #[inline]
    pub fn into_reader(self) -> PartReader {
        PartReader::new(self.into_stream())
    }

    /// Write the serialized part, returning the number of bytes written
    #[inline]
    pub fn write_to<W: Write>(self, writer: &mut W) -> Result<u64> {
        self.into_stream().write_to(writer)
    }

    /// Serialize the whole part in memory
    #[inline]
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.into_stream().into_bytes()
    }

    /// Serialize the whole part as text
    ///
    /// Fails with [`Error::Utf8`](crate::Error::Utf8) on `8bit` or `binary`
    /// bodies which are not UTF-8.
    #[inline]
    pub fn into_string(self) -> Result<String> {
        Ok(String::from_utf8(self.into_bytes()?)?)
    }
}

impl From<SinglePart> for Part {
    fn from(part: SinglePart) -> Self {
        Part::Single(part)
    }
}

impl From<MultiPart> for Part {
    fn from(part: MultiPart) -> Self {
        Part::Multi(part)
    }
}

/// Part stream
pub enum PartStream {
    /// Single part stream
    ///
    Single(SinglePartStream),

    /// Multi part stream
    ///
    Multi(MultiPartStream),
}

impl PartStream {
    /// Drain the stream into a writer
    pub fn write_to<W: Write>(self, writer: &mut W) -> Result<u64> {
        let mut written = 0;
        for chunk in self {
            let chunk = chunk?;
            writer.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        writer.flush()?;
        Ok(written)
    }

    /// Drain the stream into memory
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }
}

impl Iterator for PartStream {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            PartStream::Single(stream) => stream.next(),
            PartStream::Multi(stream) => stream.next(),
        }
    }
}

/// Parts of multipart body
///
pub type Parts = Vec<Part>;

/// Creates builder for single part
///
#[derive(Default)]
pub struct SinglePartBuilder {
    headers: Headers,
}

impl SinglePartBuilder {
    /// Creates a default SinglePartBuilder
    pub fn new() -> Self {
        Self {
            headers: Headers::new(),
        }
    }

    /// Set a header and move the builder
    ///
    #[inline]
    pub fn header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Set the transfer encoding
    #[inline]
    pub fn encoding(self, encoding: ContentTransferEncoding) -> Self {
        self.header(name::CONTENT_TRANSFER_ENCODING, encoding.to_string())
    }

    /// Set the body and move the Part
    ///
    /// Useful for the "builder-style" pattern.
    #[inline]
    pub fn body<T: Into<Resource>>(self, body: T) -> SinglePart {
        SinglePart {
            headers: self.headers,
            body: body.into(),
        }
    }
}

/// Single part
///
/// The body is encoded according to its `Content-Transfer-Encoding:` header
/// while streaming. Parts without the header are passed through as is.
///
/// # Example
///
/// ```
/// use emailbuilder::{SinglePart, header::name};
///
/// let part = SinglePart::builder()
///      .header(name::CONTENT_TYPE, "text/plain; charset=utf-8")
///      .header(name::CONTENT_TRANSFER_ENCODING, "binary")
///      .body("Текст письма в уникоде");
/// ```
///
pub struct SinglePart {
    headers: Headers,
    body: Resource,
}

impl SinglePart {
    /// Creates a default SinglePartBuilder
    pub fn builder() -> SinglePartBuilder {
        SinglePartBuilder::new()
    }

    /// Creates a SinglePart with quoted-printable encoding
    ///
    /// Shortcut for `SinglePart::builder().encoding(ContentTransferEncoding::QuotedPrintable)`.
    pub fn quoted_printable() -> SinglePartBuilder {
        Self::builder().encoding(ContentTransferEncoding::QuotedPrintable)
    }

    /// Creates a SinglePart with base64 encoding
    ///
    /// Shortcut for `SinglePart::builder().encoding(ContentTransferEncoding::Base64)`.
    pub fn base64() -> SinglePartBuilder {
        Self::builder().encoding(ContentTransferEncoding::Base64)
    }

    /// Get the transfer encoding
    ///
    /// Gives `None` when the header is missing or names an unknown encoding.
    #[inline]
    pub fn encoding(&self) -> Option<ContentTransferEncoding> {
        self.headers
            .get(name::CONTENT_TRANSFER_ENCODING)
            .and_then(|label| label.parse().ok())
    }

    /// Get the headers from the Part
    #[inline]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a mutable reference to the headers
    #[inline]
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Set a header and move the Part
    ///
    /// Useful for the "builder-style" pattern.
    #[inline]
    pub fn with_header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Streaming single part
    pub fn into_stream_chunked(self, chunk_size: usize) -> SinglePartStream {
        let SinglePart { headers, body } = self;

        let encoding = match headers.get(name::CONTENT_TRANSFER_ENCODING) {
            Some(label) => match label.parse::<ContentTransferEncoding>() {
                Ok(encoding) => Some(encoding),
                Err(label) => {
                    tracing::warn!(%label, "unknown transfer encoding, body is sent as is");
                    None
                }
            },
            None => None,
        };

        SinglePartStream {
            headers: Some(headers),
            body: Some(EncoderStream::with_chunk_size(
                body,
                EncoderChunk::get(encoding),
                chunk_size,
            )),
        }
    }
}

/// Stream for single part
///
pub struct SinglePartStream {
    headers: Option<Headers>,
    body: Option<EncoderStream<Resource>>,
}

impl Iterator for SinglePartStream {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(headers) = self.headers.take() {
            // stream headers
            return Some(Ok(Bytes::from(headers.to_string() + "\r\n")));
        }

        // stream body
        match self.body.as_mut()?.next() {
            Some(Ok(chunk)) => Some(Ok(chunk)),
            Some(Err(error)) => {
                // no trailer after a failure
                self.body = None;
                Some(Err(error))
            }
            None => {
                // end of stream
                self.body = None;
                Some(Ok(Bytes::from_static(b"\r\n")))
            }
        }
    }
}

/// The kind of multipart
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiPartKind {
    /// Mixed kind to combine unrelated content parts
    ///
    /// For example this kind can be used to mix email message and attachments.
    Mixed,

    /// Alternative kind to join several variants of same email contents.
    ///
    /// That kind is recommended to use for joining plain (text) and rich (HTML) messages into single email message.
    Alternative,

    /// Related kind to mix content and related resources.
    ///
    /// For example, you can include images into HTML content using that.
    Related,
}

impl MultiPartKind {
    fn subtype(self) -> &'static str {
        use self::MultiPartKind::*;
        match self {
            Mixed => "mixed",
            Alternative => "alternative",
            Related => "related",
        }
    }

    fn to_content_type(self, boundary: &str) -> String {
        format!(
            "multipart/{}; {}",
            self.subtype(),
            Parameters::new().with("boundary", boundary)
        )
    }
}

/// Generate a fresh boundary starting with `--=` and the prefix
pub fn make_boundary(prefix: &str) -> String {
    format!("--={}{}", prefix, TextNonce::new().into_string())
}

/// Multipart builder
///
pub struct MultiPartBuilder {
    kind: MultiPartKind,
    boundary: Option<String>,
    headers: Headers,
}

impl MultiPartBuilder {
    /// Creates multipart builder of the given kind
    #[inline]
    pub fn new(kind: MultiPartKind) -> Self {
        Self {
            kind,
            boundary: None,
            headers: Headers::new(),
        }
    }

    /// Set a header
    #[inline]
    pub fn header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Set custom boundary
    #[inline]
    pub fn boundary<S: Into<String>>(mut self, boundary: S) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Creates MultiPart
    ///
    /// A boundary with the default prefix is generated unless one was set.
    pub fn build(self) -> MultiPart {
        let boundary = self
            .boundary
            .unwrap_or_else(|| make_boundary(crate::Config::default().boundary_prefix.as_str()));
        let mut headers = self.headers;
        headers.set(name::CONTENT_TYPE, self.kind.to_content_type(&boundary));

        MultiPart {
            kind: self.kind,
            boundary,
            headers,
            parts: Vec::new(),
        }
    }

    /// Creates MultiPart using part
    #[inline]
    pub fn part<P: Into<Part>>(self, part: P) -> MultiPart {
        self.build().part(part)
    }
}

/// Multipart variant with parts
///
pub struct MultiPart {
    kind: MultiPartKind,
    boundary: String,
    headers: Headers,
    parts: Parts,
}

impl MultiPart {
    /// Creates MultiPart builder of specified kind
    #[inline]
    pub fn builder(kind: MultiPartKind) -> MultiPartBuilder {
        MultiPartBuilder::new(kind)
    }

    /// Creates MultiPart mixed
    ///
    /// Shortcut for `MultiPart::builder(MultiPartKind::Mixed)`
    #[inline]
    pub fn mixed() -> MultiPartBuilder {
        MultiPart::builder(MultiPartKind::Mixed)
    }

    /// Creates MultiPart alternative
    ///
    /// Shortcut for `MultiPart::builder(MultiPartKind::Alternative)`
    #[inline]
    pub fn alternative() -> MultiPartBuilder {
        MultiPart::builder(MultiPartKind::Alternative)
    }

    /// Creates MultiPart related
    ///
    /// Shortcut for `MultiPart::builder(MultiPartKind::Related)`
    #[inline]
    pub fn related() -> MultiPartBuilder {
        MultiPart::builder(MultiPartKind::Related)
    }

    /// Add a sub-part and move the MultiPart
    #[inline]
    pub fn part<P: Into<Part>>(mut self, part: P) -> Self {
        self.parts.push(part.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> MultiPartKind {
        self.kind
    }

    /// Get the boundary of MultiPart contents
    #[inline]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Get the headers from the MultiPart
    #[inline]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a mutable reference to the headers
    #[inline]
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Get the sub-parts from the MultiPart.
    #[inline]
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Get a mutable reference to the sub-parts
    #[inline]
    pub fn parts_mut(&mut self) -> &mut Parts {
        &mut self.parts
    }

    /// Streaming multi part
    pub fn into_stream_chunked(self, chunk_size: usize) -> MultiPartStream {
        MultiPartStream {
            boundary: Bytes::from(self.boundary),
            headers: Some(self.headers),
            parts: self
                .parts
                .into_iter()
                .map(|part| part.into_stream_chunked(chunk_size))
                .collect(),
        }
    }
}

/// Stream for multi part
///
pub struct MultiPartStream {
    boundary: Bytes,
    headers: Option<Headers>,
    parts: VecDeque<PartStream>,
}

impl MultiPartStream {
    fn delimiter(&self, chunk: &mut BytesMut, close: bool) {
        chunk.put_slice(b"--");
        chunk.put_slice(&self.boundary);
        chunk.put_slice(if close { b"--\r\n" } else { b"\r\n" });
    }
}

impl Iterator for MultiPartStream {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(headers) = self.headers.take() {
            // stream headers with the open boundary
            let headers = headers.to_string();
            let mut chunk = BytesMut::with_capacity(headers.len() + self.boundary.len() + 8);
            chunk.put_slice(headers.as_bytes());
            chunk.put_slice(b"\r\n");
            self.delimiter(&mut chunk, self.parts.is_empty());
            return Some(Ok(chunk.freeze()));
        }

        // stream body
        match self.parts.front_mut()?.next() {
            Some(Ok(chunk)) => Some(Ok(chunk)),
            Some(Err(error)) => {
                self.parts.clear();
                Some(Err(error))
            }
            None => {
                // end of sub-part
                self.parts.pop_front();
                let mut chunk = BytesMut::with_capacity(self.boundary.len() + 6);
                self.delimiter(&mut chunk, self.parts.is_empty());
                Some(Ok(chunk.freeze()))
            }
        }
    }
}

/// Blocking reader over serialized part chunks
pub struct PartReader {
    stream: PartStream,
    chunk: Bytes,
}

impl PartReader {
    #[inline]
    pub fn new(stream: PartStream) -> Self {
        PartReader {
            stream,
            chunk: Bytes::new(),
        }
    }
}

impl Read for PartReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while !self.chunk.has_remaining() {
            match self.stream.next() {
                Some(chunk) => self.chunk = chunk?,
                None => return Ok(0),
            }
        }

        let len = buf.len().min(self.chunk.remaining());
        self.chunk.copy_to_slice(&mut buf[..len]);
        Ok(len)
    }
}

#[cfg(test)]
mod test {
    use super::{make_boundary, MultiPart, MultiPartKind, Part, SinglePart};
    use crate::error::Error;
    use crate::header::name;
    use crate::resource::Resource;
    use pretty_assertions::assert_eq;
    use std::io::{self, Read};

    fn text_part(encoding: &str, body: &'static str) -> SinglePart {
        SinglePart::builder()
            .header(name::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(name::CONTENT_TRANSFER_ENCODING, encoding)
            .body(body)
    }

    fn serialize<P: Into<Part>>(part: P) -> String {
        part.into().into_string().unwrap()
    }

    #[test]
    fn single_part_binary() {
        assert_eq!(
            serialize(text_part("binary", "Текст письма в уникоде")),
            concat!(
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: binary\r\n",
                "\r\n",
                "Текст письма в уникоде\r\n"
            )
        );
    }

    #[test]
    fn single_part_quoted_printable() {
        assert_eq!(
            serialize(text_part("quoted-printable", "Текст письма в уникоде")),
            concat!(
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: quoted-printable\r\n",
                "\r\n",
                "=D0=A2=D0=B5=D0=BA=D1=81=D1=82 =D0=BF=D0=B8=D1=81=D1=8C=D0=BC=D0=B0 =D0=B2 =\r\n",
                "=D1=83=D0=BD=D0=B8=D0=BA=D0=BE=D0=B4=D0=B5\r\n"
            )
        );
    }

    #[test]
    fn single_part_base64() {
        assert_eq!(
            serialize(text_part("base64", "Текст письма в уникоде")),
            concat!(
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: base64\r\n",
                "\r\n",
                "0KLQtdC60YHRgiDQv9C40YHRjNC80LAg0LIg0YPQvdC40LrQvtC00LU=\r\n"
            )
        );
    }

    #[test]
    fn unknown_encoding_passes_body_through() {
        let part = text_part("x-uuencode", "raw body");
        assert_eq!(part.encoding(), None);
        assert_eq!(
            serialize(part),
            concat!(
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: x-uuencode\r\n",
                "\r\n",
                "raw body\r\n"
            )
        );
    }

    #[test]
    fn multi_part_mixed() {
        let part = MultiPart::mixed()
            .boundary("--=_F2mTKN843loAAAAA8porEdAjCKhA")
            .part(text_part("binary", "Текст письма в уникоде"))
            .part(
                text_part("binary", "int main() { return 0; }")
                    .with_header(name::CONTENT_DISPOSITION, "attachment; filename=\"example.c\""),
            );

        assert_eq!(part.kind(), MultiPartKind::Mixed);
        assert_eq!(part.parts().len(), 2);

        assert_eq!(
            serialize(part),
            concat!(
                "Content-Type: multipart/mixed; boundary=\"--=_F2mTKN843loAAAAA8porEdAjCKhA\"\r\n",
                "\r\n",
                "----=_F2mTKN843loAAAAA8porEdAjCKhA\r\n",
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: binary\r\n",
                "\r\n",
                "Текст письма в уникоде\r\n",
                "----=_F2mTKN843loAAAAA8porEdAjCKhA\r\n",
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: binary\r\n",
                "Content-Disposition: attachment; filename=\"example.c\"\r\n",
                "\r\n",
                "int main() { return 0; }\r\n",
                "----=_F2mTKN843loAAAAA8porEdAjCKhA--\r\n"
            )
        );
    }

    #[test]
    fn multi_part_mixed_related() {
        let part = MultiPart::mixed()
            .boundary("--=_F2mTKN843loAAAAA8porEdAjCKhA")
            .part(
                MultiPart::related()
                    .boundary("--=_E912L4JH3loAAAAAFu33Gx7PEoTM")
                    .part(
                        SinglePart::builder()
                            .header(name::CONTENT_TYPE, "text/html; charset=utf-8")
                            .header(name::CONTENT_TRANSFER_ENCODING, "binary")
                            .body("<p><img src=\"cid:image\"></p>"),
                    )
                    .part(
                        SinglePart::base64()
                            .header(name::CONTENT_TYPE, "image/png")
                            .header(name::CONTENT_LOCATION, "/image.png")
                            .body("1234567890123456789012345678901234567890123456789012345678901234567890123456789012345678901234567890123456789012345678901234567890"),
                    ),
            )
            .part(text_part("binary", "int main() { return 0; }"));

        assert_eq!(
            serialize(part),
            concat!(
                "Content-Type: multipart/mixed; boundary=\"--=_F2mTKN843loAAAAA8porEdAjCKhA\"\r\n",
                "\r\n",
                "----=_F2mTKN843loAAAAA8porEdAjCKhA\r\n",
                "Content-Type: multipart/related; boundary=\"--=_E912L4JH3loAAAAAFu33Gx7PEoTM\"\r\n",
                "\r\n",
                "----=_E912L4JH3loAAAAAFu33Gx7PEoTM\r\n",
                "Content-Type: text/html; charset=utf-8\r\n",
                "Content-Transfer-Encoding: binary\r\n",
                "\r\n",
                "<p><img src=\"cid:image\"></p>\r\n",
                "----=_E912L4JH3loAAAAAFu33Gx7PEoTM\r\n",
                "Content-Transfer-Encoding: base64\r\n",
                "Content-Type: image/png\r\n",
                "Content-Location: /image.png\r\n",
                "\r\n",
                "MTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMjM0NTY3\r\n",
                "ODkwMTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMjM0\r\n",
                "NTY3ODkwMTIzNDU2Nzg5MA==\r\n",
                "----=_E912L4JH3loAAAAAFu33Gx7PEoTM--\r\n",
                "----=_F2mTKN843loAAAAA8porEdAjCKhA\r\n",
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: binary\r\n",
                "\r\n",
                "int main() { return 0; }\r\n",
                "----=_F2mTKN843loAAAAA8porEdAjCKhA--\r\n"
            )
        );
    }

    #[test]
    fn generated_boundary_is_in_content_type() {
        let part = MultiPart::alternative().build();
        let boundary = part.boundary().to_string();
        assert!(boundary.starts_with("--=_Part_"));
        assert_ne!(boundary, make_boundary("_Part_"));

        let part = Part::from(part);
        let content_type = part.content_type().unwrap();
        assert_eq!(content_type.subtype(), "alternative");
        assert_eq!(content_type.get_param("boundary").unwrap().as_str(), boundary);
    }

    #[test]
    fn reader_matches_string() {
        let build = || {
            MultiPart::alternative()
                .boundary("--=_inner")
                .part(text_part("quoted-printable", "Привет"))
                .part(text_part("base64", "Hello"))
        };

        let mut read = String::new();
        Part::from(build()).into_reader().read_to_string(&mut read).unwrap();

        assert_eq!(read, serialize(build()));
    }

    #[test]
    fn small_chunks_give_same_output() {
        let body = "Line one\r\nLine two is a little bit longer than the first one\r\n";
        let part = || Part::from(text_part("base64", body));

        let chunks: Vec<u8> = part()
            .into_stream_chunked(3)
            .flat_map(|chunk| chunk.unwrap().to_vec())
            .collect();

        assert_eq!(String::from_utf8(chunks).unwrap(), serialize(part()));
    }

    #[test]
    fn seven_bit_rejects_non_ascii() {
        let error = Part::from(text_part("7bit", "Привет")).into_string().unwrap_err();
        assert!(matches!(error, Error::Coding(_)));
    }

    #[test]
    fn consumed_reader_fails() {
        let part = SinglePart::base64()
            .header(name::CONTENT_TYPE, "application/octet-stream")
            .body(Resource::Consumed);

        let error = Part::from(part).into_bytes().unwrap_err();
        match error {
            Error::Resource(error) => assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {}", other),
        }
    }
}
