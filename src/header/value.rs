use super::Parameters;
use crate::error::Result;
use crate::mailbox::{Mailbox, Mailboxes};
use crate::utf8_b;
use time::format_description::well_known::Rfc2822;
use time::{OffsetDateTime, UtcOffset};

/// Value stored in the message header map
///
/// Structured values keep their type until the header is flushed onto a part,
/// where [`HeaderValue::render`] turns them into header text.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// Unstructured text, RFC 2047 encoded when not plain ASCII
    Text(String),

    /// Single mailbox (`From:`)
    Mailbox(Mailbox),

    /// Mailbox list (`To:`, `Cc:`, ...)
    Mailboxes(Mailboxes),

    /// Parameter list (`X-Draft-Info:`)
    Params(Parameters),

    /// Timestamp written as RFC 2822 date in GMT (`Date:`)
    Date(OffsetDateTime),
}

impl HeaderValue {
    /// Canonical header text of the value
    ///
    /// Fails only for dates which RFC 2822 cannot express (years before 1900).
    pub fn render(&self) -> Result<String> {
        use self::HeaderValue::*;
        Ok(match self {
            Text(text) => utf8_b::encode(text),
            Mailbox(mbox) => fmt_mailboxes([mbox]),
            Mailboxes(mboxes) => fmt_mailboxes(mboxes.iter()),
            Params(params) => params.to_string(),
            Date(date) => fmt_date(*date)?,
        })
    }

    /// Plain text of a textual value
    pub fn as_text(&self) -> Option<&str> {
        if let HeaderValue::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }
}

pub(crate) fn fmt_date(date: OffsetDateTime) -> Result<String> {
    Ok(date.to_offset(UtcOffset::UTC).format(&Rfc2822)?)
}

fn fmt_mailboxes<'a, I>(mboxes: I) -> String
where
    I: IntoIterator<Item = &'a Mailbox>,
{
    mboxes
        .into_iter()
        .map(|mbox| mbox.recode_name(utf8_b::encode).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<String> for HeaderValue {
    fn from(text: String) -> Self {
        HeaderValue::Text(text)
    }
}

impl From<&str> for HeaderValue {
    fn from(text: &str) -> Self {
        HeaderValue::Text(text.into())
    }
}

impl From<Mailbox> for HeaderValue {
    fn from(mbox: Mailbox) -> Self {
        HeaderValue::Mailbox(mbox)
    }
}

impl From<Mailboxes> for HeaderValue {
    fn from(mboxes: Mailboxes) -> Self {
        HeaderValue::Mailboxes(mboxes)
    }
}

impl From<Parameters> for HeaderValue {
    fn from(params: Parameters) -> Self {
        HeaderValue::Params(params)
    }
}

impl From<OffsetDateTime> for HeaderValue {
    fn from(date: OffsetDateTime) -> Self {
        HeaderValue::Date(date)
    }
}

#[cfg(test)]
mod test {
    use super::HeaderValue;
    use crate::header::Parameters;
    use crate::mailbox::{Mailbox, Mailboxes};
    use time::macros::datetime;

    #[test]
    fn render_text() {
        assert_eq!(HeaderValue::from("Hello").render().unwrap(), "Hello");
        assert_eq!(
            HeaderValue::from("яңа ел белән!").render().unwrap(),
            "=?utf-8?b?0Y/So9CwINC10Lsg0LHQtdC705nQvSE=?="
        );
    }

    #[test]
    fn render_single_with_utf8_name() {
        let mbox: Mailbox = "Кайо <kayo@example.com>".parse().unwrap();
        assert_eq!(
            HeaderValue::from(mbox).render().unwrap(),
            "=?utf-8?b?0JrQsNC50L4=?= <kayo@example.com>"
        );
    }

    #[test]
    fn render_multi_with_name() {
        let mboxes: Mailboxes = "K. <kayo@example.com>, Pony P. <pony@domain.tld>"
            .parse()
            .unwrap();
        assert_eq!(
            HeaderValue::from(mboxes).render().unwrap(),
            "\"K.\" <kayo@example.com>, \"Pony P.\" <pony@domain.tld>"
        );
    }

    #[test]
    fn render_params() {
        let params = Parameters::new().with("type", "draft").with("uid", "7");
        assert_eq!(HeaderValue::from(params).render().unwrap(), "type=draft; uid=7");
    }

    #[test]
    fn render_date_in_gmt() {
        assert_eq!(
            HeaderValue::from(datetime!(1994-11-15 11:12:31 +03:00)).render().unwrap(),
            "Tue, 15 Nov 1994 08:12:31 +0000"
        );
    }

    #[test]
    fn date_before_1900_fails() {
        assert!(HeaderValue::from(datetime!(1850-01-01 0:00 UTC)).render().is_err());
    }
}
