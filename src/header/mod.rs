mod content;
mod param;
mod special;
mod value;

pub use self::content::*;
pub use self::param::*;
pub use self::special::*;
pub use self::value::*;

pub(crate) use self::value::fmt_date;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::slice::Iter;

/// Names of the headers this crate writes
pub mod name {
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
    pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
    pub const CONTENT_ID: &str = "Content-ID";
    pub const CONTENT_LOCATION: &str = "Content-Location";
    pub const MESSAGE_ID: &str = "Message-ID";
    pub const DATE: &str = "Date";
    pub const MIME_VERSION: &str = "MIME-Version";
    pub const X_MAILER: &str = "X-Mailer";
    pub const X_DRAFT_INFO: &str = "X-Draft-Info";
    pub const X_PRIORITY: &str = "X-Priority";
    pub const X_CONFIRM_READING_TO: &str = "X-Confirm-Reading-To";
    pub const DISPOSITION_NOTIFICATION_TO: &str = "Disposition-Notification-To";
    pub const SENSITIVITY: &str = "Sensitivity";
    pub const SUBJECT: &str = "Subject";
    pub const FROM: &str = "From";
    pub const SENDER: &str = "Sender";
    pub const REPLY_TO: &str = "Reply-To";
    pub const TO: &str = "To";
    pub const CC: &str = "Cc";
    pub const BCC: &str = "Bcc";
    pub const IN_REPLY_TO: &str = "In-Reply-To";
    pub const REFERENCES: &str = "References";
}

/// Soft limit for a header line before it gets folded
const FOLD_LENGTH: usize = 78;

/// Single header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    #[inline]
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Header {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Display for Header {
    /// Writes `Name: Value\r\n` folding the value on whitespace
    ///
    /// Raw CR and LF in the value are written as spaces.
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(&self.name)?;
        f.write_str(":")?;

        let mut line = self.name.len() + 1;
        let words = self.value.split(|c: char| c == ' ' || c == '\r' || c == '\n');
        for (index, word) in words.enumerate() {
            // never fold before an empty word, the new line would be blank
            if index > 0 && !word.is_empty() && line + 1 + word.len() > FOLD_LENGTH && line > 1 {
                f.write_str("\r\n")?;
                line = 0;
            }
            f.write_str(" ")?;
            f.write_str(word)?;
            line += 1 + word.len();
        }

        f.write_str("\r\n")
    }
}

/// Ordered header list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<Header>);

impl Headers {
    #[inline]
    pub fn new() -> Self {
        Headers(Vec::new())
    }

    /// Set or add header
    ///
    /// When `replace` is true the first header with the same name
    /// (case-insensitive) gets the new value, otherwise the header is appended.
    pub fn set_by_name<N, V>(&mut self, name: N, value: V, replace: bool)
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();

        if replace {
            if let Some(header) = self
                .0
                .iter_mut()
                .find(|header| header.name.eq_ignore_ascii_case(&name))
            {
                header.value = value;
                return;
            }
        }

        self.0.push(Header { name, value });
    }

    /// Replace or add header
    #[inline]
    pub fn set<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.set_by_name(name, value, true);
    }

    /// Add header after the existing ones
    #[inline]
    pub fn append<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.set_by_name(name, value, false);
    }

    /// Set a header and move the list
    #[inline]
    pub fn with<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// Value of the first header with the given name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }

    /// Every value of the headers with the given name
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }

    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove every header with the given name
    pub fn remove(&mut self, name: &str) {
        self.0.retain(|header| !header.name.eq_ignore_ascii_case(name));
    }

    #[inline]
    pub fn iter(&self) -> Iter<Header> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        for header in self {
            header.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{name, Header, Headers};
    use pretty_assertions::assert_eq;

    #[test]
    fn set_replaces_first_match() {
        let mut headers = Headers::new();
        headers.append("Received", "a");
        headers.append("received", "b");
        headers.set("RECEIVED", "c");

        assert_eq!(headers.get_all("Received").collect::<Vec<_>>(), vec!["c", "b"]);
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn set_without_replace_appends() {
        let mut headers = Headers::new().with(name::SUBJECT, "A");
        headers.set_by_name(name::SUBJECT, "B", false);

        assert_eq!(headers.get_all("subject").count(), 2);
        assert_eq!(headers.get("Subject"), Some("A"));
    }

    #[test]
    fn keeps_insertion_order() {
        let headers = Headers::new()
            .with(name::DATE, "Tue, 15 Nov 1994 08:12:31 +0000")
            .with(name::SUBJECT, "Hi")
            .with(name::DATE, "Wed, 16 Nov 1994 08:12:31 +0000");

        assert_eq!(
            headers.to_string(),
            concat!(
                "Date: Wed, 16 Nov 1994 08:12:31 +0000\r\n",
                "Subject: Hi\r\n"
            )
        );
    }

    #[test]
    fn remove_all_matches() {
        let mut headers = Headers::new().with(name::BCC, "a@b.c").with(name::TO, "d@e.f");
        headers.remove("bcc");
        assert!(!headers.has(name::BCC));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn fold_long_value() {
        let header = Header::new(
            name::CONTENT_TYPE,
            "multipart/mixed; boundary=\"--=_Part_F2mTKN843loAAAAA8porEdAjCKhArPxGeahYoZYSftse1GT\"",
        );

        assert_eq!(
            header.to_string(),
            concat!(
                "Content-Type: multipart/mixed;\r\n",
                " boundary=\"--=_Part_F2mTKN843loAAAAA8porEdAjCKhArPxGeahYoZYSftse1GT\"\r\n"
            )
        );
    }

    #[test]
    fn fold_keeps_runs_of_spaces_on_content_lines() {
        let value = format!("{}    {}   ", "a".repeat(60), "b".repeat(30));
        let text = Header::new(name::SUBJECT, value.as_str()).to_string();

        assert_eq!(
            text,
            format!("Subject: {}   \r\n {}   \r\n", "a".repeat(60), "b".repeat(30))
        );
        assert!(text.split("\r\n").all(|line| line.is_empty() || !line.trim().is_empty()));
    }

    #[test]
    fn line_breaks_in_value_do_not_start_headers() {
        let header = Header::new(name::CONTENT_LOCATION, "x\r\nBcc: evil@example.com\nTo: other@example.com");

        assert_eq!(
            header.to_string(),
            "Content-Location: x  Bcc: evil@example.com To: other@example.com\r\n"
        );
    }

    #[test]
    fn short_value_unfolded() {
        assert_eq!(
            Header::new(name::MIME_VERSION, "1.0").to_string(),
            "MIME-Version: 1.0\r\n"
        );
    }
}
