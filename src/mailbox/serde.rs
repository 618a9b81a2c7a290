use super::{
    check::{check_domain, check_user},
    Address, Mailbox, Mailboxes,
};
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

// Every address type reads either from its string form or from an object
#[derive(Deserialize)]
#[serde(untagged)]
enum AddressRepr {
    Text(String),
    Parts { user: String, domain: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MailboxRepr {
    Text(String),
    Parts { name: Option<String>, email: Address },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MailboxesRepr {
    Text(String),
    List(Vec<Mailbox>),
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match AddressRepr::deserialize(deserializer)? {
            AddressRepr::Text(text) => text.parse().map_err(DeError::custom),
            AddressRepr::Parts { user, domain } => {
                check_user(&user).map_err(DeError::custom)?;
                let domain = check_domain(&domain).map_err(DeError::custom)?;
                Ok(Address::new(user, domain))
            }
        }
    }
}

impl Serialize for Mailbox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Mailbox {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match MailboxRepr::deserialize(deserializer)? {
            MailboxRepr::Text(text) => text.parse().map_err(DeError::custom),
            MailboxRepr::Parts { name, email } => Ok(Mailbox::new(name, email)),
        }
    }
}

impl Serialize for Mailboxes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Mailboxes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match MailboxesRepr::deserialize(deserializer)? {
            MailboxesRepr::Text(text) => text.parse().map_err(DeError::custom),
            MailboxesRepr::List(list) => Ok(list.into()),
        }
    }
}
