use std::fmt;
use std::fmt::Write as FmtWrite;
use std::hash;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};

use super::{punycode, Error, Reader, Writer};

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

/// Upper bound on compression pointers followed while reading one name.
///
/// Every pointer has to go to an offset before the segment it was found
/// in, so this only bounds the work done on long pointer chains.
const MAX_POINTER_HOPS: usize = 127;

const ACE_PREFIX: &str = "xn--";

/// A domain name
///
/// Names are kept as their labels in wire form (the root label is
/// implied) together with the human readable, "original" form. Labels
/// holding non-ASCII text are stored in their ASCII compatible `xn--`
/// form; `original()` shows them as unicode again.
///
/// Names compare and hash ignoring ASCII case. `to_string()` gives the
/// escaped, fully qualified presentation form.
#[derive(Debug, Clone)]
pub struct Name {
    labels: Vec<Vec<u8>>,
    original: String,
}

impl Name {
    pub fn root() -> Name {
        Name {
            labels: Vec::new(),
            original: ".".to_owned(),
        }
    }

    /// Creates a name from raw labels, excluding the root label.
    pub fn from_labels<I, L>(labels: I) -> Result<Name, Error>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut wire_len = 1;
        let mut owned = Vec::new();
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() {
                return Err(Error::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(Error::LabelTooLong { len: label.len() });
            }
            wire_len += label.len() + 1;
            owned.push(label.to_vec());
        }
        if wire_len > MAX_NAME_LEN {
            return Err(Error::NameTooLong { len: wire_len });
        }
        Ok(Name::from_checked_labels(owned))
    }

    fn from_checked_labels(labels: Vec<Vec<u8>>) -> Name {
        let original = original_form(&labels);
        Name { labels, original }
    }

    /// Reads a name at the reader's cursor, following compression
    /// pointers.
    ///
    /// The cursor ends up behind the name's representation at the original
    /// position, that is behind the first pointer if there is one.
    pub fn scan(reader: &mut Reader) -> Result<Name, Error> {
        let data = reader.message();
        let limit = reader.limit();
        let start = reader.position();
        let mut pos = start;
        let mut segment = start;
        let mut resume = None;
        let mut hops = 0;
        let mut wire_len = 0;
        let mut labels = Vec::new();

        loop {
            // Only the part at the cursor is held to the reader's limit.
            let bound = if resume.is_none() { limit } else { data.len() };
            let byte = *data[..bound].get(pos).ok_or(Error::UnexpectedEof {
                offset: pos,
                needed: 1,
            })?;
            if byte == 0 {
                pos += 1;
                break;
            } else if byte & 0b1100_0000 == 0b1100_0000 {
                if bound < pos + 2 {
                    return Err(Error::UnexpectedEof {
                        offset: pos,
                        needed: 2,
                    });
                }
                let target =
                    (BigEndian::read_u16(&data[pos..pos + 2]) & !0b1100_0000_0000_0000) as usize;
                if target >= data.len() {
                    return Err(Error::UnexpectedEof {
                        offset: target,
                        needed: 1,
                    });
                }
                if target >= segment {
                    return Err(Error::InvalidPointer {
                        offset: pos,
                        target,
                    });
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(Error::TooManyPointers { offset: start });
                }
                if resume.is_none() {
                    resume = Some(pos + 2);
                }
                pos = target;
                segment = target;
            } else if byte & 0b1100_0000 == 0 {
                let len = byte as usize;
                let end = pos + 1 + len;
                if end > bound {
                    return Err(Error::UnexpectedEof {
                        offset: pos + 1,
                        needed: len,
                    });
                }
                wire_len += len + 1;
                if wire_len + 1 > MAX_NAME_LEN {
                    return Err(Error::NameTooLong { len: wire_len + 1 });
                }
                labels.push(data[pos + 1..end].to_vec());
                pos = end;
            } else {
                return Err(Error::UnknownLabelFormat { offset: pos, byte });
            }
        }

        reader.seek(resume.unwrap_or(pos))?;
        Ok(Name::from_checked_labels(labels))
    }

    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.iter().map(|label| &label[..])
    }

    /// Number of labels, not counting the root.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Length of the uncompressed wire form, including the root label.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// The human readable form with ACE labels shown as unicode.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn write_to(&self, writer: &mut Writer) {
        for label in &self.labels {
            writer.write_u8(label.len() as u8);
            writer.write_bytes(label);
        }
        writer.write_u8(0);
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut writer = Writer::with_capacity(self.wire_len());
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Returns a copy with all ASCII letters lowercased.
    pub fn to_lowercase(&self) -> Name {
        Name::from_checked_labels(
            self.labels
                .iter()
                .map(|label| label.to_ascii_lowercase())
                .collect(),
        )
    }
}

impl FromStr for Name {
    type Err = Error;

    /// Parses the presentation form.
    ///
    /// A trailing dot is optional; `""` and `"."` are the root. Escapes
    /// `\X` and `\DDD` are understood. Labels containing non-ASCII
    /// characters are lowercased and converted to their `xn--` form.
    fn from_str(text: &str) -> Result<Name, Error> {
        if text.is_empty() || text == "." {
            return Ok(Name::root());
        }

        let mut labels = Vec::new();
        let mut label = Vec::new();
        let mut unicode = false;
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if label.is_empty() {
                        return Err(Error::EmptyLabel);
                    }
                    labels.push(finish_label(label, unicode)?);
                    label = Vec::new();
                    unicode = false;
                }
                '\\' => match chars.next() {
                    Some(d) if d.is_ascii_digit() => {
                        let mut value = d as u32 - '0' as u32;
                        for _ in 0..2 {
                            let digit = chars
                                .next()
                                .and_then(|c| c.to_digit(10))
                                .ok_or(Error::InvalidEscape)?;
                            value = value * 10 + digit;
                        }
                        if value > 255 {
                            return Err(Error::InvalidEscape);
                        }
                        label.push(value as u8);
                    }
                    Some(other) => push_char(&mut label, &mut unicode, other),
                    None => return Err(Error::InvalidEscape),
                },
                other => push_char(&mut label, &mut unicode, other),
            }
        }
        if !label.is_empty() {
            labels.push(finish_label(label, unicode)?);
        }

        Name::from_labels(labels)
    }
}

fn push_char(label: &mut Vec<u8>, unicode: &mut bool, c: char) {
    if c.is_ascii() {
        label.push(c as u8);
    } else {
        *unicode = true;
        let mut buf = [0; 4];
        label.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
}

fn finish_label(raw: Vec<u8>, unicode: bool) -> Result<Vec<u8>, Error> {
    if !unicode {
        return Ok(raw);
    }
    let text = String::from_utf8(raw).map_err(|_| Error::InvalidEscape)?;
    let mut ace = String::from(ACE_PREFIX);
    ace.push_str(&punycode::encode(&text.to_lowercase())?);
    Ok(ace.into_bytes())
}

fn write_escaped<W: FmtWrite>(out: &mut W, label: &[u8]) -> fmt::Result {
    for &byte in label {
        match byte {
            b'.' | b'\\' | b'"' | b'(' | b')' | b';' | b'@' | b'$' => {
                out.write_char('\\')?;
                out.write_char(byte as char)?;
            }
            0x21..=0x7e => out.write_char(byte as char)?,
            _ => write!(out, "\\{:03}", byte)?,
        }
    }
    Ok(())
}

fn decode_ace(label: &[u8]) -> Option<String> {
    if label.len() <= ACE_PREFIX.len()
        || !label[..ACE_PREFIX.len()].eq_ignore_ascii_case(ACE_PREFIX.as_bytes())
        || !label.is_ascii()
    {
        return None;
    }
    let text = std::str::from_utf8(&label[ACE_PREFIX.len()..]).ok()?;
    punycode::decode(text).ok()
}

fn original_form(labels: &[Vec<u8>]) -> String {
    if labels.is_empty() {
        return ".".to_owned();
    }
    let mut out = String::new();
    for label in labels {
        match decode_ace(label) {
            Some(unicode) => out.push_str(&unicode),
            None => {
                // Writing into a String cannot fail.
                let _ = write_escaped(&mut out, label);
            }
        }
        out.push('.');
    }
    out
}

impl fmt::Display for Name {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.labels.is_empty() {
            return fmt.write_char('.');
        }
        for label in &self.labels {
            write_escaped(fmt, label)?;
            fmt.write_char('.')?;
        }
        Ok(())
    }
}

impl hash::Hash for Name {
    fn hash<H>(&self, state: &mut H)
    where
        H: hash::Hasher,
    {
        for label in &self.labels {
            state.write_u8(label.len() as u8);
            for byte in label {
                state.write_u8(byte.to_ascii_lowercase());
            }
        }
        state.write_u8(0);
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Name) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Eq for Name {}

#[cfg(test)]
mod test {
    use super::*;

    fn name(text: &str) -> Name {
        Name::from_str(text).unwrap()
    }

    #[test]
    fn parse_and_display() {
        let example = name("www.example.com");
        assert_eq!(example.label_count(), 3);
        assert_eq!(example.to_string(), "www.example.com.");
        assert_eq!(example, name("WWW.Example.COM."));
        assert_eq!(name(".").to_string(), ".");
        assert!(name("").is_root());
        assert_eq!(Name::from_str("a..b"), Err(Error::EmptyLabel));
        assert_eq!(Name::from_str(".com"), Err(Error::EmptyLabel));
    }

    #[test]
    fn escapes() {
        let dotted = name(r"a\.b.example");
        assert_eq!(dotted.label_count(), 2);
        assert_eq!(dotted.labels().next().unwrap(), b"a.b");
        assert_eq!(dotted.to_string(), r"a\.b.example.");

        let binary = name(r"\000\255x.example");
        assert_eq!(binary.labels().next().unwrap(), &[0, 255, b'x']);
        assert_eq!(binary.to_string(), r"\000\255x.example.");

        assert_eq!(Name::from_str(r"bad\25"), Err(Error::InvalidEscape));
        assert_eq!(Name::from_str(r"bad\256"), Err(Error::InvalidEscape));
        assert_eq!(Name::from_str("bad\\"), Err(Error::InvalidEscape));
    }

    #[test]
    fn international_labels() {
        let idn = name("Bücher.example");
        assert_eq!(idn.to_string(), "xn--bcher-kva.example.");
        assert_eq!(idn.original(), "bücher.example.");
        assert_eq!(idn, name("xn--bcher-kva.example"));
        assert_eq!(name("xn--bcher-kva.example").original(), "bücher.example.");
    }

    #[test]
    fn length_limits() {
        let label = "a".repeat(63);
        assert!(Name::from_str(&label).is_ok());
        assert_eq!(
            Name::from_str(&"a".repeat(64)),
            Err(Error::LabelTooLong { len: 64 })
        );

        // 4 * (1 + 62) + 1 = 253 octets fits, one more label does not.
        let fits = vec!["b".repeat(62); 4].join(".");
        assert_eq!(name(&fits).wire_len(), 253);
        let too_long = format!("{}.xy", fits);
        assert_eq!(
            Name::from_str(&too_long),
            Err(Error::NameTooLong { len: 256 })
        );
    }

    #[test]
    fn wire_round_trip() {
        for text in &["example.com", ".", "_sip._tcp.example.org", r"a\032b.c"] {
            let original = name(text);
            let wire = original.to_wire();
            assert_eq!(wire.len(), original.wire_len());
            let mut reader = Reader::new(&wire);
            let decoded = reader.read_name().unwrap();
            assert_eq!(decoded, original);
            assert_eq!(decoded.to_string(), original.to_string());
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn follows_compression_pointers() {
        // "example.com" at offset 0, then "www" + pointer to offset 0.
        let data = b"\x07example\x03com\x00\x03www\xc0\x00\xff";
        let mut reader = Reader::new(data);
        assert_eq!(reader.read_name().unwrap(), name("example.com"));
        assert_eq!(reader.position(), 13);
        assert_eq!(reader.read_name().unwrap(), name("www.example.com"));
        // Only the pointer's two bytes were consumed.
        assert_eq!(reader.position(), 19);
        assert_eq!(reader.read_u8().unwrap(), 0xff);
    }

    #[test]
    fn rejects_bad_pointers() {
        let self_pointer = b"\xc0\x00";
        assert_eq!(
            Reader::new(self_pointer).read_name(),
            Err(Error::InvalidPointer {
                offset: 0,
                target: 0
            })
        );

        // A label followed by a pointer back to that same label.
        let cycle = b"\x01a\xc0\x00";
        assert_eq!(
            Reader::new(cycle).read_name(),
            Err(Error::InvalidPointer {
                offset: 2,
                target: 0
            })
        );

        // Two names pointing at each other.
        let mutual = b"\x00\x01a\xc0\x05\x01b\xc0\x01";
        let mut reader = Reader::new(mutual);
        reader.seek(5).unwrap();
        assert_eq!(
            reader.read_name(),
            Err(Error::InvalidPointer {
                offset: 3,
                target: 5
            })
        );

        let forward = b"\xc0\x04\x00\x00\x00";
        assert_eq!(
            Reader::new(forward).read_name(),
            Err(Error::InvalidPointer {
                offset: 0,
                target: 4
            })
        );

        let past_end = b"\x00\xc0\x40";
        let mut reader = Reader::new(past_end);
        reader.seek(1).unwrap();
        assert_eq!(
            reader.read_name(),
            Err(Error::UnexpectedEof {
                offset: 0x40,
                needed: 1
            })
        );
    }

    #[test]
    fn rejects_bad_labels() {
        assert_eq!(
            Reader::new(b"\x80abc").read_name(),
            Err(Error::UnknownLabelFormat {
                offset: 0,
                byte: 0x80
            })
        );
        assert_eq!(
            Reader::new(b"\x05abc").read_name(),
            Err(Error::UnexpectedEof {
                offset: 1,
                needed: 5
            })
        );
        assert_eq!(
            Reader::new(b"\x03abc").read_name(),
            Err(Error::UnexpectedEof {
                offset: 4,
                needed: 1
            })
        );
    }

    #[test]
    fn expansion_is_bounded() {
        // Each entry is a 62-byte label followed by a pointer to the
        // previous entry; the fifth one expands past 255 octets.
        let mut data = Vec::new();
        let mut previous = None;
        let mut offsets = Vec::new();
        for _ in 0..5 {
            offsets.push(data.len());
            data.push(62);
            data.extend_from_slice(&[b'x'; 62]);
            match previous {
                Some(offset) => {
                    data.push(0xc0 | (offset >> 8) as u8);
                    data.push(offset as u8);
                }
                None => data.push(0),
            }
            previous = Some(*offsets.last().unwrap());
        }
        let mut reader = Reader::new(&data);
        reader.seek(offsets[3]).unwrap();
        assert_eq!(reader.read_name().unwrap().label_count(), 4);
        reader.seek(offsets[4]).unwrap();
        assert_eq!(reader.read_name(), Err(Error::NameTooLong { len: 316 }));
    }
}
