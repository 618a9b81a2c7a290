use super::MailboxError;
use idna::domain_to_ascii;
use regex::Regex;
use std::net::IpAddr;

lazy_static! {
    // https://html.spec.whatwg.org/multipage/forms.html#valid-e-mail-address
    // Quoted-string local parts are rejected
    static ref USER_RE: Regex = Regex::new(r"^(?i)[a-z0-9.!#$%&'*+/=?^_`{|}~-]+\z").unwrap();
    static ref DOMAIN_RE: Regex = Regex::new(
        r"(?i)^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*$"
    ).unwrap();
    // literal form, ipv4 or ipv6 address (SMTP 4.1.3)
    static ref LITERAL_RE: Regex = Regex::new(r"(?i)^\[([a-f0-9:\.]+)\]\z").unwrap();
}

pub fn check_user(user: &str) -> Result<(), MailboxError> {
    if USER_RE.is_match(user) {
        Ok(())
    } else {
        Err(MailboxError::InvalidUser)
    }
}

/// Validate the domain and give its ASCII form
///
/// Internationalized names are converted to punycode.
pub fn check_domain(domain: &str) -> Result<String, MailboxError> {
    if check_domain_ascii(domain).is_ok() {
        return Ok(domain.into());
    }

    let domain = domain_to_ascii(domain).map_err(|_| MailboxError::InvalidDomain)?;
    check_domain_ascii(&domain)?;
    Ok(domain)
}

fn check_domain_ascii(domain: &str) -> Result<(), MailboxError> {
    if DOMAIN_RE.is_match(domain) {
        return Ok(());
    }

    if let Some(cap) = LITERAL_RE.captures(domain).and_then(|caps| caps.get(1)) {
        if cap.as_str().parse::<IpAddr>().is_ok() {
            return Ok(());
        }
    }

    Err(MailboxError::InvalidDomain)
}
