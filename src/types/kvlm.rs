use crate::error::{Error, Result};

/// key-value list with message: the payload shape shared by commits and tags
///
/// keys are ASCII byte strings and may repeat (multiple `parent` lines);
/// insertion order is preserved. A value may embed newlines, which the wire
/// form encodes as continuation lines (`\n` followed by a space). The first
/// blank line separates the headers from the free-form message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kvlm {
    fields: Vec<(Vec<u8>, Vec<u8>)>,
    message: Vec<u8>,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// parse the wire form
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut fields = Vec::new();
        let mut pos = 0;

        loop {
            if pos >= raw.len() {
                // headers ran to the end without a blank separator
                return Ok(Self {
                    fields,
                    message: Vec::new(),
                });
            }
            if raw[pos] == b'\n' {
                // blank line: the rest is the message, final newlines included
                return Ok(Self {
                    fields,
                    message: raw[pos + 1..].to_vec(),
                });
            }

            let sp = find(raw, b' ', pos)
                .ok_or_else(|| Error::Malformed("header line without key".to_string()))?;
            if find(raw, b'\n', pos).is_some_and(|nl| nl < sp) {
                return Err(Error::Malformed("header line without key".to_string()));
            }

            // the value runs until a newline not followed by a space
            let mut end = sp;
            loop {
                end = find(raw, b'\n', end + 1)
                    .ok_or_else(|| Error::Malformed("unterminated header value".to_string()))?;
                if raw.get(end + 1) != Some(&b' ') {
                    break;
                }
            }

            let key = raw[pos..sp].to_vec();
            let value = unfold(&raw[sp + 1..end]);
            fields.push((key, value));
            pos = end + 1;
        }
    }

    /// exact inverse of `parse`
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, value) in &self.fields {
            out.extend_from_slice(key);
            out.push(b' ');
            out.extend_from_slice(&fold(value));
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    /// first value for a key
    pub fn first(&self, key: &[u8]) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// all values for a key, in insertion order
    pub fn values(&self, key: &[u8]) -> Vec<&[u8]> {
        self.fields
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .collect()
    }

    /// append a field
    pub fn push(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<Vec<u8>>) {
        self.message = message.into();
    }
}

fn find(raw: &[u8], byte: u8, from: usize) -> Option<usize> {
    raw[from..].iter().position(|&b| b == byte).map(|i| i + from)
}

/// drop the leading space of each continuation line
fn unfold(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\n' && raw.get(i + 1) == Some(&b' ') {
            out.push(b'\n');
            i += 2;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

/// re-wrap embedded newlines as continuation lines
fn fold(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for &b in value {
        out.push(b);
        if b == b'\n' {
            out.push(b' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
parent 206941306e8a8af65b66eaaaea388a7ae24d49a0\n\
author Alice <alice@example.com> 1527025023 +0200\n\
committer Alice <alice@example.com> 1527025044 +0200\n\
gpgsig -----BEGIN PGP SIGNATURE-----\n \n iQIzBAABCAAdFiEE\n =lgTX\n -----END PGP SIGNATURE-----\n\
\n\
Create first draft\n";

    #[test]
    fn test_parse_sample_commit() {
        let kvlm = Kvlm::parse(SAMPLE).unwrap();

        assert_eq!(
            kvlm.first(b"tree").unwrap(),
            b"29ff16c9c14e2652b22f8b78bb08a5a07930c147"
        );
        assert_eq!(kvlm.message(), b"Create first draft\n");
    }

    #[test]
    fn test_continuation_lines_folded() {
        let kvlm = Kvlm::parse(SAMPLE).unwrap();
        let sig = kvlm.first(b"gpgsig").unwrap();

        // embedded newlines survive, leading spaces are gone
        assert!(sig.starts_with(b"-----BEGIN PGP SIGNATURE-----\n"));
        assert!(sig.ends_with(b"-----END PGP SIGNATURE-----"));
        assert!(!sig.windows(2).any(|w| w == &b"\n "[..]));
    }

    #[test]
    fn test_roundtrip() {
        let kvlm = Kvlm::parse(SAMPLE).unwrap();
        let reparsed = Kvlm::parse(&kvlm.serialize()).unwrap();
        assert_eq!(kvlm, reparsed);
        assert_eq!(kvlm.serialize(), SAMPLE);
    }

    #[test]
    fn test_duplicate_parents_keep_order() {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", "29ff16c9c14e2652b22f8b78bb08a5a07930c147");
        kvlm.push("parent", "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        kvlm.push("parent", "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        kvlm.set_message("merge\n");

        let reparsed = Kvlm::parse(&kvlm.serialize()).unwrap();
        let parents = reparsed.values(b"parent");
        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0], b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(parents[1], b"bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        assert_eq!(reparsed, kvlm);
    }

    #[test]
    fn test_message_trailing_newlines_preserved() {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", "29ff16c9c14e2652b22f8b78bb08a5a07930c147");
        kvlm.set_message("subject\n\nbody\n\n\n");

        let reparsed = Kvlm::parse(&kvlm.serialize()).unwrap();
        assert_eq!(reparsed.message(), b"subject\n\nbody\n\n\n");
    }

    #[test]
    fn test_message_only() {
        let kvlm = Kvlm::parse(b"\njust a message\n").unwrap();
        assert!(kvlm.first(b"tree").is_none());
        assert_eq!(kvlm.message(), b"just a message\n");
    }

    #[test]
    fn test_unterminated_header_rejected() {
        assert!(matches!(
            Kvlm::parse(b"tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147"),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_value() {
        let kvlm = Kvlm::new();
        assert!(kvlm.first(b"tree").is_none());
        assert!(kvlm.values(b"parent").is_empty());
    }
}
