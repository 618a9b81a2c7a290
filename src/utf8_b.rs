//! RFC 2047 encoded-words using the `utf-8` charset and `b` encoding

use base64::{engine::general_purpose::STANDARD, Engine};

// 45 octets become 60 base64 chars, keeping each word within 75 chars
const MAX_WORD_OCTETS: usize = 45;

/// Encode text as a sequence of encoded-words
///
/// Plain ASCII text without control characters is returned unchanged.
pub fn encode(s: &str) -> String {
    if s.bytes().all(|b| (b' '..=b'~').contains(&b) || b == b'\t') && !s.contains("=?") {
        return s.into();
    }

    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;

    for (pos, ch) in s.char_indices() {
        let next = pos + ch.len_utf8();
        if next - start > MAX_WORD_OCTETS {
            words.push(&s[start..end]);
            start = end;
        }
        end = next;
    }
    if start < end {
        words.push(&s[start..end]);
    }

    words
        .into_iter()
        .map(|word| format!("=?utf-8?b?{}?=", STANDARD.encode(word)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::encode;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(encode("Happy new year"), "Happy new year");
    }

    #[test]
    fn encode_utf8() {
        assert_eq!(encode("Каи"), "=?utf-8?b?0JrQsNC4?=");
        assert_eq!(
            encode("яңа ел белән!"),
            "=?utf-8?b?0Y/So9CwINC10Lsg0LHQtdC705nQvSE=?="
        );
    }

    #[test]
    fn encode_long_utf8_splits_words() {
        let encoded = encode(&"ж".repeat(40));
        let words: Vec<&str> = encoded.split(' ').collect();
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|w| w.len() <= 75));
        assert!(words.iter().all(|w| w.starts_with("=?utf-8?b?") && w.ends_with("?=")));
    }
}
