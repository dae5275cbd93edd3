use std::time::Instant;

use super::{Class, Error, Name, RRData, Reader, Type, Writer};

/// A parsed chunk of data in the Query section of the packet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub qname: Name,
    pub qtype: Type,
    pub qclass: Class,
}

impl Question {
    pub fn new(qname: Name, qtype: Type, qclass: Class) -> Question {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    pub fn parse(reader: &mut Reader) -> Result<Question, Error> {
        let qname = reader.read_name()?;
        let qtype = Type::from(reader.read_u16()?);
        let qclass = Class::from(reader.read_u16()?);
        Ok(Question {
            qname,
            qtype,
            qclass,
        })
    }

    pub fn write_to(&self, writer: &mut Writer) {
        self.qname.write_to(writer);
        writer.write_u16(self.qtype.into());
        writer.write_u16(self.qclass.into());
    }
}

/// The envelope shared by all resource records
///
/// The TTL is captured together with the instant the record was read, so
/// that `ttl()` can count down while the record sits in a cache.
#[derive(Debug, Clone)]
pub struct RecordInfo {
    pub name: Name,
    pub rtype: Type,
    pub class: Class,
    pub initial_ttl: u32,
    pub rdlength: u16,
    captured: Instant,
}

impl RecordInfo {
    pub fn new(name: Name, rtype: Type, class: Class, ttl: u32, rdlength: u16) -> RecordInfo {
        RecordInfo {
            name,
            rtype,
            class,
            initial_ttl: ttl,
            rdlength,
            captured: Instant::now(),
        }
    }

    /// Reads the record envelope up to, and including, RDLENGTH.
    pub fn parse(reader: &mut Reader) -> Result<RecordInfo, Error> {
        let name = reader.read_name()?;
        let rtype = Type::from(reader.read_u16()?);
        let class = Class::from(reader.read_u16()?);
        let ttl = reader.read_u32()?;
        let rdlength = reader.read_u16()?;
        Ok(RecordInfo::new(name, rtype, class, ttl, rdlength))
    }

    /// The remaining TTL in seconds, never below zero.
    pub fn ttl(&self) -> u32 {
        let elapsed = self.captured.elapsed().as_secs();
        (self.initial_ttl as u64).saturating_sub(elapsed) as u32
    }
}

/// A single DNS record
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub info: RecordInfo,
    pub data: RRData,
}

impl ResourceRecord {
    /// Creates a record for sending, RDLENGTH is filled in when written.
    pub fn new(name: Name, class: Class, ttl: u32, data: RRData) -> ResourceRecord {
        ResourceRecord {
            info: RecordInfo::new(name, data.typ(), class, ttl, 0),
            data,
        }
    }

    pub fn name(&self) -> &Name {
        &self.info.name
    }

    pub fn rtype(&self) -> Type {
        self.info.rtype
    }

    pub fn class(&self) -> Class {
        self.info.class
    }

    pub fn ttl(&self) -> u32 {
        self.info.ttl()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn question_wire_format() {
        let question = Question::new(
            Name::from_str("_xmpp-server._tcp.gmail.com").unwrap(),
            Type::SRV,
            Class::IN,
        );
        let mut writer = Writer::new();
        question.write_to(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(
            &bytes[..],
            &b"\x0c_xmpp-server\x04_tcp\x05gmail\x03com\x00\x00!\x00\x01"[..]
        );
        assert_eq!(Question::parse(&mut Reader::new(&bytes)).unwrap(), question);
    }

    #[test]
    fn ttl_counts_down() {
        let mut info = RecordInfo::new(Name::root(), Type::A, Class::IN, 10, 4);
        assert_eq!(info.ttl(), 10);
        info.captured -= Duration::from_secs(4);
        assert_eq!(info.ttl(), 6);
        info.captured -= Duration::from_secs(60);
        assert_eq!(info.ttl(), 0);
    }
}
