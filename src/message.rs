use crate::attachment::{Attachment, Attachments};
use crate::config::Config;
use crate::error::Result;
use crate::header::{
    fmt_date, name, with_params, HeaderValue, Parameters, Priority, Sensitivity, MIME_VERSION_1_0,
};
use crate::mailbox::{Mailbox, Mailboxes};
use crate::mimebody::{make_boundary, MultiPart, Part, PartReader, PartStream, SinglePart};
use crate::resource::Resource;
use base64::engine::{general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use time::OffsetDateTime;

/// Message header values in the order they were first set
#[derive(Debug, Clone, Default)]
struct HeaderMap(Vec<(String, HeaderValue)>);

impl HeaderMap {
    fn set<V: Into<HeaderValue>>(&mut self, name: &str, value: V) {
        let value = value.into();
        match self
            .0
            .iter_mut()
            .find(|(other, _)| other.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name.into(), value)),
        }
    }

    fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0
            .iter()
            .find(|(other, _)| other.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    #[inline]
    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn text(&self, name: &str) -> &str {
        self.get(name).and_then(HeaderValue::as_text).unwrap_or("")
    }

    fn mailboxes(&self, name: &str) -> Option<&Mailboxes> {
        match self.get(name) {
            Some(HeaderValue::Mailboxes(mboxes)) => Some(mboxes),
            _ => None,
        }
    }
}

/// One rendition of the message content
#[derive(Debug)]
struct Alternative {
    content_type: String,
    data: Option<Resource>,
    transfer_encoding: String,
    custom_params: Parameters,
}

/// Email message composer
///
/// Collects header values, alternative bodies and attachments, then builds
/// the MIME tree on [`Message::to_part`]:
///
/// ```text
/// multipart/mixed              (when there are unlinked attachments)
///   multipart/related          (when there are linked attachments)
///     multipart/alternative    (when there are several bodies)
///       text/plain
///       text/html
///     inline attachments...
///   attachments...
/// ```
///
/// # Example
///
/// ```
/// use emailbuilder::{Attachment, Message};
///
/// let mut message = Message::new();
/// message
///     .set_from("Kayo <kayo@example.com>".parse().unwrap())
///     .set_to("pony@domain.tld".parse().unwrap())
///     .set_subject("Happy new year")
///     .add_plain("Hello!")
///     .attach(Attachment::new("hello.txt", "text/plain", "Hello!"));
///
/// let text = message.to_string(true).unwrap();
/// assert!(text.contains("Subject: Happy new year\r\n"));
/// ```
#[derive(Debug)]
pub struct Message {
    config: Config,
    headers: HeaderMap,
    alternatives: Vec<Alternative>,
    attachments: Attachments,
    add_empty_text_part: bool,
    add_default_x_mailer: bool,
}

impl Default for Message {
    fn default() -> Self {
        Message::with_config(Config::default())
    }
}

impl Message {
    /// Constructs an empty message with default settings
    #[inline]
    pub fn new() -> Self {
        Message::default()
    }

    /// Constructs an empty message using the settings
    pub fn with_config(config: Config) -> Self {
        Message {
            config,
            headers: HeaderMap::default(),
            alternatives: Vec::new(),
            attachments: Attachments::new(),
            add_empty_text_part: true,
            add_default_x_mailer: true,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Do not synthesize an empty `text/plain` body for messages without content
    pub fn does_not_create_empty_text_part(&mut self) -> &mut Self {
        self.add_empty_text_part = false;
        self
    }

    /// Do not stamp the configured `X-Mailer:` onto the message
    pub fn does_not_add_default_x_mailer(&mut self) -> &mut Self {
        self.add_default_x_mailer = false;
        self
    }

    pub fn set_subject<S: Into<String>>(&mut self, subject: S) -> &mut Self {
        self.headers.set(name::SUBJECT, subject.into());
        self
    }

    pub fn set_in_reply_to<S: Into<String>>(&mut self, in_reply_to: S) -> &mut Self {
        self.headers.set(name::IN_REPLY_TO, in_reply_to.into());
        self
    }

    /// Set `References:` collapsing runs of whitespace
    pub fn set_references<S: AsRef<str>>(&mut self, references: S) -> &mut Self {
        let references = references
            .as_ref()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        self.headers.set(name::REFERENCES, references);
        self
    }

    /// Ask for a read receipt sent to the address
    ///
    /// Sets both `Disposition-Notification-To:` and `X-Confirm-Reading-To:`.
    pub fn set_read_receipt<S: AsRef<str>>(&mut self, email: S) -> &mut Self {
        let email = email.as_ref();
        self.headers.set(name::DISPOSITION_NOTIFICATION_TO, email);
        self.headers.set(name::X_CONFIRM_READING_TO, email);
        self
    }

    /// Same as [`Message::set_read_receipt`]
    #[inline]
    pub fn set_read_confirmation<S: AsRef<str>>(&mut self, email: S) -> &mut Self {
        self.set_read_receipt(email)
    }

    /// Set `Date:`, written in GMT
    pub fn set_date(&mut self, date: OffsetDateTime) -> &mut Self {
        self.headers.set(name::DATE, date);
        self
    }

    pub fn set_message_id<S: Into<String>>(&mut self, message_id: S) -> &mut Self {
        self.headers.set(name::MESSAGE_ID, message_id.into());
        self
    }

    /// Generate a fresh `Message-ID:` for the host
    ///
    /// An empty hint falls back to the configured server name, then to the
    /// OS host name and finally to `localhost`.
    pub fn regenerate_message_id<S: AsRef<str>>(&mut self, hostname_hint: S) -> &mut Self {
        let message_id = generate_message_id(hostname_hint.as_ref(), &self.config);
        self.headers.set(name::MESSAGE_ID, message_id);
        self
    }

    pub fn set_x_mailer<S: Into<String>>(&mut self, x_mailer: S) -> &mut Self {
        self.headers.set(name::X_MAILER, x_mailer.into());
        self
    }

    pub fn set_from(&mut self, from: Mailbox) -> &mut Self {
        self.headers.set(name::FROM, from);
        self
    }

    pub fn set_to(&mut self, to: Mailboxes) -> &mut Self {
        self.headers.set(name::TO, to);
        self
    }

    pub fn set_cc(&mut self, cc: Mailboxes) -> &mut Self {
        self.headers.set(name::CC, cc);
        self
    }

    pub fn set_bcc(&mut self, bcc: Mailboxes) -> &mut Self {
        self.headers.set(name::BCC, bcc);
        self
    }

    pub fn set_reply_to(&mut self, reply_to: Mailboxes) -> &mut Self {
        self.headers.set(name::REPLY_TO, reply_to);
        self
    }

    pub fn set_sender(&mut self, sender: Mailboxes) -> &mut Self {
        self.headers.set(name::SENDER, sender);
        self
    }

    /// Set `X-Priority:` by numeric level, unknown levels are ignored
    pub fn set_priority(&mut self, level: i32) -> &mut Self {
        if let Some(priority) = Priority::from_level(level) {
            self.headers.set(name::X_PRIORITY, priority.to_string());
        }
        self
    }

    /// Set `Sensitivity:` by numeric level, unknown levels are ignored
    pub fn set_sensitivity(&mut self, level: i32) -> &mut Self {
        if let Some(sensitivity) = Sensitivity::from_level(level) {
            self.headers.set(name::SENSITIVITY, sensitivity.to_string());
        }
        self
    }

    /// Set an arbitrary header
    ///
    /// Does nothing when the trimmed name is blank or is not a valid field
    /// name (printable ASCII without `:`).
    pub fn set_custom_header<N: AsRef<str>, V: Into<String>>(&mut self, name: N, value: V) -> &mut Self {
        let name = name.as_ref().trim();
        if is_field_name(name) {
            self.headers.set(name, value.into());
        } else if !name.is_empty() {
            tracing::debug!(?name, "ignoring invalid header name");
        }
        self
    }

    /// Set `X-Draft-Info:` with the folder name base64 encoded
    pub fn set_draft_info<T, U, F>(&mut self, kind: T, uid: U, folder: F) -> &mut Self
    where
        T: Into<String>,
        U: Into<String>,
        F: AsRef<[u8]>,
    {
        let params = Parameters::new()
            .with("type", kind)
            .with("uid", uid)
            .with("folder", STANDARD.encode(folder));
        self.headers.set(name::X_DRAFT_INFO, params);
        self
    }

    /// Add plain text rendition
    pub fn add_plain<S: AsRef<str>>(&mut self, text: S) -> &mut Self {
        self.add_text(text, false)
    }

    /// Add HTML rendition
    pub fn add_html<S: AsRef<str>>(&mut self, html: S) -> &mut Self {
        self.add_text(html, true)
    }

    /// Add text rendition encoded as quoted-printable
    ///
    /// The text is trimmed and its line endings are turned into CRLF.
    pub fn add_text<S: AsRef<str>>(&mut self, text: S, is_html: bool) -> &mut Self {
        let content_type = if is_html {
            mime::TEXT_HTML
        } else {
            mime::TEXT_PLAIN
        };
        let text = normalize_newlines(text.as_ref().trim());

        self.add_alternative(
            content_type.essence_str(),
            Some(text.into()),
            "quoted-printable",
            Parameters::new(),
        )
    }

    /// Add alternative body
    ///
    /// A non-empty `transfer_encoding` sets `Content-Transfer-Encoding:` and
    /// encodes the data while streaming. Missing data gives an empty body.
    pub fn add_alternative<T, E>(
        &mut self,
        content_type: T,
        data: Option<Resource>,
        transfer_encoding: E,
        custom_params: Parameters,
    ) -> &mut Self
    where
        T: Into<String>,
        E: AsRef<str>,
    {
        self.alternatives.push(Alternative {
            content_type: content_type.into(),
            data,
            transfer_encoding: transfer_encoding.as_ref().trim().into(),
            custom_params,
        });
        self
    }

    /// Add attachment
    pub fn attach(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    #[inline]
    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    #[inline]
    pub fn attachments_mut(&mut self) -> &mut Attachments {
        &mut self.attachments
    }

    pub fn get_from(&self) -> Option<&Mailbox> {
        match self.headers.get(name::FROM) {
            Some(HeaderValue::Mailbox(from)) => Some(from),
            _ => None,
        }
    }

    /// Recipients from `To:` without duplicates
    pub fn get_to(&self) -> Mailboxes {
        self.headers
            .mailboxes(name::TO)
            .map(Mailboxes::unique)
            .unwrap_or_default()
    }

    /// Recipients from `Bcc:` without duplicates
    pub fn get_bcc(&self) -> Mailboxes {
        self.headers
            .mailboxes(name::BCC)
            .map(Mailboxes::unique)
            .unwrap_or_default()
    }

    /// Every recipient from `To:`, `Cc:` and `Bcc:` without duplicates
    pub fn get_rcpt(&self) -> Mailboxes {
        let mut rcpt = Mailboxes::new();
        for header in [name::TO, name::CC, name::BCC] {
            if let Some(mboxes) = self.headers.mailboxes(header) {
                rcpt.merge(mboxes);
            }
        }
        rcpt.unique()
    }

    pub fn get_subject(&self) -> &str {
        self.headers.text(name::SUBJECT)
    }

    /// The explicitly set or regenerated `Message-ID:`
    pub fn message_id(&self) -> &str {
        self.headers.text(name::MESSAGE_ID)
    }

    /// Build the MIME tree of the message
    ///
    /// In-memory bodies and attachments are shared with the tree, one-shot
    /// readers move into it, so serializing the message again requires fresh
    /// readers. When the message has no bodies, the empty text part is disabled
    /// and exactly one attachment is present, that attachment becomes the body
    /// and leaves the attachment collection.
    pub fn to_part(&mut self, exclude_bcc: bool) -> Result<Part> {
        tracing::debug!(
            alternatives = self.alternatives.len(),
            attachments = self.attachments.len(),
            "assembling message"
        );

        let part = self.alternative_body();
        let part = self.related_body(part);
        let mut part = self.mixed_body(part);
        self.set_default_headers(&mut part, exclude_bcc)?;

        Ok(part)
    }

    /// Chunked serialization of the message
    pub fn to_stream(&mut self, exclude_bcc: bool) -> Result<PartStream> {
        let chunk_size = self.config.chunk_size;
        Ok(self.to_part(exclude_bcc)?.into_stream_chunked(chunk_size))
    }

    /// Readable serialization of the message
    pub fn to_reader(&mut self, exclude_bcc: bool) -> Result<PartReader> {
        Ok(PartReader::new(self.to_stream(exclude_bcc)?))
    }

    /// Serialize the message into the writer, returning the number of bytes written
    pub fn write_to<W: Write>(&mut self, writer: &mut W, exclude_bcc: bool) -> Result<u64> {
        self.to_stream(exclude_bcc)?.write_to(writer)
    }

    /// Serialize the message in memory
    pub fn to_string(&mut self, exclude_bcc: bool) -> Result<String> {
        Ok(String::from_utf8(self.to_stream(exclude_bcc)?.into_bytes()?)?)
    }

    fn new_boundary(&self) -> String {
        make_boundary(&self.config.boundary_prefix)
    }

    fn alternative_body(&mut self) -> Part {
        match self.alternatives.len() {
            0 => {
                if !self.add_empty_text_part {
                    if let Some(attachment) = self.attachments.take_single() {
                        tracing::debug!(
                            file_name = attachment.file_name(),
                            "promoting single attachment to message body"
                        );
                        let (content_type, resource, params) = attachment.into_body();
                        return alternative_part(&content_type, Some(resource), "", &params)
                            .into();
                    }
                }
                // nothing to promote
                alternative_part(mime::TEXT_PLAIN.essence_str(), None, "", &Parameters::new())
                    .into()
            }
            1 => self.alternatives[0].to_part().into(),
            _ => {
                let mut alternative = MultiPart::alternative()
                    .boundary(self.new_boundary())
                    .build();
                for entry in &mut self.alternatives {
                    alternative = alternative.part(entry.to_part());
                }
                alternative.into()
            }
        }
    }

    fn related_body(&mut self, part: Part) -> Part {
        if !self.attachments.has_linked() {
            return part;
        }

        let mut related = MultiPart::related()
            .boundary(self.new_boundary())
            .part(part);
        for attachment in self.attachments.iter_mut().filter(|a| a.is_inline()) {
            related = related.part(attachment_part(attachment));
        }
        related.into()
    }

    fn mixed_body(&mut self, part: Part) -> Part {
        if !self.attachments.has_unlinked() {
            return part;
        }

        let mut mixed = MultiPart::mixed().boundary(self.new_boundary()).part(part);
        for attachment in self.attachments.iter_mut().filter(|a| !a.is_inline()) {
            mixed = mixed.part(attachment_part(attachment));
        }
        mixed.into()
    }

    fn set_default_headers(&self, part: &mut Part, exclude_bcc: bool) -> Result<()> {
        let headers = part.headers_mut();

        if !self.headers.has(name::DATE) {
            headers.set(name::DATE, fmt_date(OffsetDateTime::now_utc())?);
        }

        if !self.headers.has(name::MESSAGE_ID) {
            headers.set(name::MESSAGE_ID, generate_message_id("", &self.config));
        }

        if self.add_default_x_mailer && !self.headers.has(name::X_MAILER) {
            headers.set(name::X_MAILER, self.config.x_mailer.as_str());
        }

        if !self.headers.has(name::MIME_VERSION) {
            headers.set(name::MIME_VERSION, MIME_VERSION_1_0.to_string());
        }

        for (header, value) in &self.headers.0 {
            if exclude_bcc && header.eq_ignore_ascii_case(name::BCC) {
                continue;
            }
            headers.set(header.as_str(), value.render()?);
        }

        Ok(())
    }
}

impl Alternative {
    fn to_part(&mut self) -> SinglePart {
        alternative_part(
            &self.content_type,
            self.data.as_mut().map(Resource::share_or_take),
            &self.transfer_encoding,
            &self.custom_params,
        )
    }
}

fn alternative_part(
    content_type: &str,
    data: Option<Resource>,
    transfer_encoding: &str,
    custom_params: &Parameters,
) -> SinglePart {
    let mut params = Parameters::new().with("charset", "utf-8");
    params.extend(custom_params.iter().cloned());

    let mut part = SinglePart::builder().header(name::CONTENT_TYPE, with_params(content_type, &params));
    if !transfer_encoding.is_empty() {
        part = part.header(name::CONTENT_TRANSFER_ENCODING, transfer_encoding);
    }
    part.body(data.unwrap_or_default())
}

fn attachment_part(attachment: &mut Attachment) -> SinglePart {
    let file_name = attachment.file_name().trim();
    let (type_params, disposition_params) = if file_name.is_empty() {
        (Parameters::new(), Parameters::new())
    } else {
        (
            Parameters::new().with("name", file_name),
            Parameters::new().with("filename", file_name),
        )
    };
    let disposition = if attachment.is_inline() {
        "inline"
    } else {
        "attachment"
    };

    let mut part = SinglePart::builder()
        .header(
            name::CONTENT_TYPE,
            with_params(attachment.content_type(), &type_params),
        )
        .header(
            name::CONTENT_DISPOSITION,
            with_params(disposition, &disposition_params),
        );

    if !attachment.cid().is_empty() {
        part = part.header(name::CONTENT_ID, attachment.cid());
    }

    if !attachment.content_location().is_empty() {
        part = part.header(name::CONTENT_LOCATION, attachment.content_location());
    }

    // embedded messages are carried as is
    if !attachment.content_type().eq_ignore_ascii_case("message/rfc822") {
        part = part.header(name::CONTENT_TRANSFER_ENCODING, "base64");
    }

    part.body(attachment.take_resource())
}

// RFC 5322 ftext
fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| matches!(b, b'!'..=b'9' | b';'..=b'~'))
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

fn generate_message_id(hostname_hint: &str, config: &Config) -> String {
    let host = resolve_hostname(hostname_hint, config);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(host.as_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(rand::random::<u64>().to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    let digest = hasher.finalize();

    let hash: String = digest[..16].iter().map(|b| format!("{:02x}", b)).collect();
    let message_id = format!("<{}@{}>", hash, host);
    tracing::debug!(%message_id, "generated message id");
    message_id
}

fn resolve_hostname(hint: &str, config: &Config) -> String {
    let hint = hint.trim();
    if !hint.is_empty() {
        return hint.into();
    }

    config
        .server_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .or_else(os_hostname)
        .unwrap_or_else(|| "localhost".into())
}

#[cfg(feature = "hostname")]
fn os_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
}

#[cfg(not(feature = "hostname"))]
fn os_hostname() -> Option<String> {
    None
}
