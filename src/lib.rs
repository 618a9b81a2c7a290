/*!

## Email message composer

This crate builds RFC 5322 email messages with MIME 1.0 bodies: plain text
and HTML alternatives, inline (linked) and regular attachments, and the
default headers every message needs.

The message is assembled into a tree of [`Part`]s which is serialized as a
chunked stream. Transfer encodings (quoted-printable, base64) are applied to
each chunk while it is copied, so large attachments are never loaded whole.

```
use emailbuilder::{Attachment, Message, Resource};
use std::io::Cursor;

let mut message = Message::new();
message
    .set_from("Каи <kayo@example.com>".parse().unwrap())
    .set_to("Pony O.P. <pony@domain.tld>".parse().unwrap())
    .set_subject("яңа ел белән!")
    .add_plain("Happy new year!")
    .add_html("<p>Happy new year!</p>")
    .attach(Attachment::new(
        "notes.txt",
        "text/plain",
        Resource::reader(Cursor::new(b"One-shot data".to_vec())),
    ));

let mut output = Vec::new();
message.write_to(&mut output, true).unwrap();
```

*/

#[macro_use]
extern crate lazy_static;

mod attachment;
mod config;
mod encoder;
mod error;
pub mod header;
mod mailbox;
mod message;
mod mimebody;
mod resource;
mod utf8_b;

pub use self::attachment::*;
pub use self::config::*;
pub use self::encoder::{EncoderCodec, EncoderStream, DEFAULT_CHUNK_SIZE};
pub use self::error::*;
pub use self::mailbox::*;
pub use self::message::*;
pub use self::mimebody::*;
pub use self::resource::*;
