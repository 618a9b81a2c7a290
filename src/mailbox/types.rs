use super::check::{check_domain, check_user};
use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult, Write};
use std::slice::Iter;
use std::str::FromStr;

/// Email address
///
/// This type contains email in canonical form (_user@domain.tld_).
///
/// **NOTE**: Enable feature "serde" to be able serialize/deserialize it using [serde](https://serde.rs/).
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Address {
    /// User part
    pub user: String,

    /// Domain part
    pub domain: String,
}

impl Address {
    /// Create email address from parts
    #[inline]
    pub fn new<U: Into<String>, D: Into<String>>(user: U, domain: D) -> Self {
        Address {
            user: user.into(),
            domain: domain.into(),
        }
    }

    /// Lowercased `user@domain` used to compare addresses
    pub fn canonical(&self) -> String {
        format!("{}@{}", self.user, self.domain).to_lowercase()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(&self.user)?;
        f.write_char('@')?;
        f.write_str(&self.domain)
    }
}

impl FromStr for Address {
    type Err = MailboxError;

    fn from_str(val: &str) -> Result<Self, MailboxError> {
        let (user, domain) = val.rsplit_once('@').ok_or(MailboxError::MissingParts)?;

        if user.is_empty() || domain.is_empty() {
            return Err(MailboxError::MissingParts);
        }

        check_user(user)?;
        let domain = check_domain(domain)?;

        Ok(Address::new(user, domain))
    }
}

// RFC 5322 specials which force a display name into a quoted-string
const SPECIALS: &str = "()<>[]:;@\\,.\"";

/// Email address with optional addressee name
///
/// This type contains email address and the sender/recipient name (_Some Name \<user@domain.tld\>_ or _withoutname@domain.tld_).
///
/// **NOTE**: Enable feature "serde" to be able serialize/deserialize it using [serde](https://serde.rs/).
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Mailbox {
    /// User name part
    pub name: Option<String>,

    /// Email address part
    pub email: Address,
}

impl Mailbox {
    /// Create new mailbox using email address and addressee name
    #[inline]
    pub fn new(name: Option<String>, email: Address) -> Self {
        Mailbox { name, email }
    }

    /// Encode addressee name using function
    pub(crate) fn recode_name<F>(&self, f: F) -> Self
    where
        F: FnOnce(&str) -> String,
    {
        Mailbox::new(self.name.as_deref().map(|s| f(s.trim())), self.email.clone())
    }
}

fn write_phrase(f: &mut Formatter, name: &str) -> FmtResult {
    if !name.chars().any(|c| SPECIALS.contains(c)) {
        return f.write_str(name);
    }

    f.write_char('"')?;
    for ch in name.chars() {
        if ch == '"' || ch == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(ch)?;
    }
    f.write_char('"')
}

fn read_phrase(name: &str) -> Option<String> {
    let name = name.trim();
    let name = match name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
        Some(quoted) => {
            let mut out = String::with_capacity(quoted.len());
            let mut chars = quoted.chars();
            while let Some(ch) = chars.next() {
                if ch == '\\' {
                    out.extend(chars.next());
                } else {
                    out.push(ch);
                }
            }
            out
        }
        None => name.into(),
    };

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        if let Some(ref name) = self.name {
            let name = name.trim();
            if !name.is_empty() {
                write_phrase(f, name)?;
                f.write_str(" <")?;
                self.email.fmt(f)?;
                return f.write_char('>');
            }
        }
        self.email.fmt(f)
    }
}

impl FromStr for Mailbox {
    type Err = MailboxError;

    fn from_str(src: &str) -> Result<Mailbox, Self::Err> {
        match (src.rfind('<'), src.rfind('>')) {
            (Some(addr_open), Some(addr_close)) if addr_open < addr_close => {
                let addr = src[addr_open + 1..addr_close].trim().parse()?;
                Ok(Mailbox::new(read_phrase(&src[..addr_open]), addr))
            }
            (Some(_), _) | (None, Some(_)) => Err(MailboxError::Unbalanced),
            _ => Ok(Mailbox::new(None, src.trim().parse()?)),
        }
    }
}

impl From<Address> for Mailbox {
    fn from(email: Address) -> Self {
        Mailbox::new(None, email)
    }
}

/// List or email mailboxes
///
/// This type contains a sequence of mailboxes (_Some Name \<user@domain.tld\>, Another Name \<other@domain.tld\>, withoutname@domain.tld, ..._).
///
/// **NOTE**: Enable feature "serde" to be able serialize/deserialize it using [serde](https://serde.rs/).
#[derive(Debug, Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Mailboxes(Vec<Mailbox>);

impl Mailboxes {
    /// Create mailboxes list
    #[inline]
    pub fn new() -> Self {
        Mailboxes(Vec::new())
    }

    /// Add mailbox to a list
    #[inline]
    pub fn with(mut self, mbox: Mailbox) -> Self {
        self.0.push(mbox);
        self
    }

    /// Add mailbox to a list
    #[inline]
    pub fn push(&mut self, mbox: Mailbox) {
        self.0.push(mbox);
    }

    /// Append every mailbox of other list
    #[inline]
    pub fn merge(&mut self, other: &Mailboxes) {
        self.0.extend(other.iter().cloned());
    }

    /// Copy of the list without repeated addresses
    ///
    /// Addresses are compared case-insensitively, the first occurrence wins.
    pub fn unique(&self) -> Self {
        let mut seen = HashSet::new();
        Mailboxes(
            self.0
                .iter()
                .filter(|mbox| seen.insert(mbox.email.canonical()))
                .cloned()
                .collect(),
        )
    }

    /// Extract first mailbox
    #[inline]
    pub fn into_single(self) -> Option<Mailbox> {
        self.into_iter().next()
    }

    /// Iterate over mailboxes
    #[inline]
    pub fn iter(&self) -> Iter<Mailbox> {
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

impl From<Mailbox> for Mailboxes {
    fn from(single: Mailbox) -> Self {
        Mailboxes(vec![single])
    }
}

impl From<Vec<Mailbox>> for Mailboxes {
    fn from(list: Vec<Mailbox>) -> Self {
        Mailboxes(list)
    }
}

impl From<Mailboxes> for Vec<Mailbox> {
    fn from(list: Mailboxes) -> Self {
        list.0
    }
}

impl IntoIterator for Mailboxes {
    type Item = Mailbox;
    type IntoIter = ::std::vec::IntoIter<Mailbox>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mailboxes {
    type Item = &'a Mailbox;
    type IntoIter = Iter<'a, Mailbox>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<Mailbox> for Mailboxes {
    fn extend<T: IntoIterator<Item = Mailbox>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Mailbox> for Mailboxes {
    fn from_iter<T: IntoIterator<Item = Mailbox>>(iter: T) -> Self {
        Mailboxes(iter.into_iter().collect())
    }
}

impl Display for Mailboxes {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let mut iter = self.iter();

        if let Some(mbox) = iter.next() {
            mbox.fmt(f)?;

            for mbox in iter {
                f.write_str(", ")?;
                mbox.fmt(f)?;
            }
        }

        Ok(())
    }
}

// Split on commas which are not inside a quoted display name
fn split_list(src: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quoted = false;
    let mut escaped = false;
    let mut start = 0;

    for (pos, ch) in src.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                items.push(&src[start..pos]);
                start = pos + 1;
            }
            _ => (),
        }
    }
    items.push(&src[start..]);
    items
}

impl FromStr for Mailboxes {
    type Err = MailboxError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        split_list(src)
            .into_iter()
            .filter(|item| !item.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Mailboxes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MailboxError {
    #[error("Missing domain or user")]
    MissingParts,
    #[error("Unbalanced angle bracket")]
    Unbalanced,
    #[error("Invalid email user")]
    InvalidUser,
    #[error("Invalid email domain")]
    InvalidDomain,
}

#[cfg(test)]
mod test {
    use super::{Address, Mailbox, MailboxError, Mailboxes};
    use pretty_assertions::assert_eq;

    #[test]
    fn mailbox_format_address_only() {
        assert_eq!(
            format!("{}", Mailbox::new(None, "kayo@example.com".parse().unwrap())),
            "kayo@example.com"
        );
    }

    #[test]
    fn mailbox_format_address_with_name() {
        assert_eq!(
            format!(
                "{}",
                Mailbox::new(Some("Kayo".into()), "kayo@example.com".parse().unwrap())
            ),
            "Kayo <kayo@example.com>"
        );
    }

    #[test]
    fn mailbox_format_quotes_specials() {
        assert_eq!(
            format!(
                "{}",
                Mailbox::new(Some("Doe, \"K.\"".into()), "kayo@example.com".parse().unwrap())
            ),
            "\"Doe, \\\"K.\\\"\" <kayo@example.com>"
        );
    }

    #[test]
    fn format_address_with_empty_name() {
        assert_eq!(
            format!(
                "{}",
                Mailbox::new(Some("  ".into()), "kayo@example.com".parse().unwrap())
            ),
            "kayo@example.com"
        );
    }

    #[test]
    fn format_address_with_name_trim() {
        assert_eq!(
            format!(
                "{}",
                Mailbox::new(Some(" Kayo ".into()), "kayo@example.com".parse().unwrap())
            ),
            "Kayo <kayo@example.com>"
        );
    }

    #[test]
    fn parse_address_only() {
        assert_eq!(
            "kayo@example.com".parse(),
            Ok(Mailbox::new(None, Address::new("kayo", "example.com")))
        );
    }

    #[test]
    fn parse_address_with_name() {
        assert_eq!(
            "K. <kayo@example.com>".parse(),
            Ok(Mailbox::new(
                Some("K.".into()),
                Address::new("kayo", "example.com")
            ))
        );
    }

    #[test]
    fn parse_address_with_quoted_name() {
        assert_eq!(
            "\"Doe, \\\"K.\\\"\" <kayo@example.com>".parse(),
            Ok(Mailbox::new(
                Some("Doe, \"K.\"".into()),
                Address::new("kayo", "example.com")
            ))
        );
    }

    #[test]
    fn parse_address_with_empty_name_trim() {
        assert_eq!(
            " <kayo@example.com>".parse(),
            Ok(Mailbox::new(None, Address::new("kayo", "example.com")))
        );
    }

    #[test]
    fn parse_invalid() {
        assert_eq!("kayo".parse::<Mailbox>(), Err(MailboxError::MissingParts));
        assert_eq!("K. <kayo@example.com".parse::<Mailbox>(), Err(MailboxError::Unbalanced));
        assert_eq!("ka yo@example.com".parse::<Mailbox>(), Err(MailboxError::InvalidUser));
    }

    #[test]
    fn parse_idn_domain_as_punycode() {
        let mbox: Mailbox = "Каи <user@пример.рф>".parse().unwrap();
        assert_eq!(mbox.email, Address::new("user", "xn--e1afmkfd.xn--p1ai"));
        assert_eq!(mbox.email.to_string(), "user@xn--e1afmkfd.xn--p1ai");
        assert!(mbox.email.to_string().is_ascii());
    }

    #[test]
    fn parse_list_with_quoted_comma() {
        let list: Mailboxes = "\"Doe, John\" <john@example.com>, jane@example.com"
            .parse()
            .unwrap();
        let names: Vec<_> = list.iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec![Some("Doe, John".to_string()), None]);
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        let list: Mailboxes = "A <a@example.com>, b@example.com, Other A <A@EXAMPLE.COM>, c@example.com, B@example.com"
            .parse()
            .unwrap();

        assert_eq!(
            list.unique().to_string(),
            "A <a@example.com>, b@example.com, c@example.com"
        );
        assert_eq!(list.len(), 5);
    }

    proptest::proptest! {
        #[test]
        fn unique_has_no_repeats(users in proptest::collection::vec("[a-c]{1,2}", 0..12)) {
            let list: Mailboxes = users
                .iter()
                .map(|user| Mailbox::from(Address::new(user.as_str(), "example.com")))
                .collect();
            let unique = list.unique();

            let mut keys: Vec<_> = unique.iter().map(|m| m.email.canonical()).collect();
            let total = keys.len();
            keys.dedup();
            keys.sort();
            keys.dedup();
            proptest::prop_assert_eq!(keys.len(), total);
            proptest::prop_assert!(unique.len() <= list.len());
            proptest::prop_assert_eq!(unique.iter().next(), list.iter().next());
        }
    }
}
