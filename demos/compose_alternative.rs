use emailbuilder::{Attachment, Message};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut m = Message::new();
    m.set_from("NoBody <nobody@domain.tld>".parse().unwrap())
        .set_reply_to("Yuin <yuin@domain.tld>".parse().unwrap())
        .set_to("Hei <hei@domain.tld>".parse().unwrap())
        .set_subject("Happy new year")
        .set_priority(1)
        .add_plain("Привет, мир!")
        .add_html("<p><b>Hello</b>, <i>world</i>! <img src=\"cid:smile\"></p>")
        .attach(
            Attachment::new("smile.png", "image/png", "<smile-raw-image-data>")
                .with_cid("smile")
                .inline(),
        )
        .attach(Attachment::new(
            "example.c",
            "text/plain",
            "int main() { return 0; }",
        ));

    println!("{}", m.to_string(true).unwrap());
}
