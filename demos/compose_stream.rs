use emailbuilder::{Attachment, Config, Message, Resource};
use std::fs::File;
use std::io::{self, Cursor};
use std::str::from_utf8;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // small chunks to show how the body flows
    let config = Config::default()
        .with_server_name("domain.tld")
        .with_chunk_size(64);

    // attach the file given on the command line or some generated data
    let resource = match std::env::args().nth(1) {
        Some(path) => Resource::reader(File::open(path).unwrap()),
        None => Resource::reader(Cursor::new(vec![0x5a; 300])),
    };

    let mut m = Message::with_config(config);
    m.set_from("NoBody <nobody@domain.tld>".parse().unwrap())
        .set_to("Hei <hei@domain.tld>".parse().unwrap())
        .set_bcc("Hidden <hidden@domain.tld>".parse().unwrap())
        .set_subject("Happy new year")
        .add_plain("Be happy!")
        .attach(Attachment::new("data.bin", "application/octet-stream", resource));

    for chunk in m.to_stream(true).unwrap() {
        let chunk = chunk.unwrap();
        println!("CHUNK[[\n{}]]", from_utf8(&chunk).unwrap());
    }

    // the reader was consumed by the stream above
    if let Err(error) = m.write_to(&mut io::sink(), true) {
        println!("second pass: {}", error);
    }
}
