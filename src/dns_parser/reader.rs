use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ByteOrder};

use super::{Error, Name};

/// A bounds-checked cursor over a received message
///
/// The reader always sees the whole message so that compression pointers
/// can be followed to any earlier offset. Every read checks that it stays
/// below the limit, which is the end of the buffer unless set otherwise,
/// and fails with `Error::UnexpectedEof` if not.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader {
            buf,
            pos: 0,
            limit: buf.len(),
        }
    }

    /// The whole underlying message.
    pub fn message(&self) -> &'a [u8] {
        self.buf
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the limit.
    pub fn remaining(&self) -> usize {
        self.limit - self.pos
    }

    /// Absolute offset reads may not go past.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Confines reads to offsets before `limit` and returns the previous
    /// limit.
    ///
    /// Compression pointers are not affected, they can still reach any
    /// earlier offset of the message.
    pub fn set_limit(&mut self, limit: usize) -> Result<usize, Error> {
        if limit > self.buf.len() || limit < self.pos {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                needed: limit.saturating_sub(self.pos),
            });
        }
        Ok(std::mem::replace(&mut self.limit, limit))
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Moves the cursor to an absolute offset.
    pub fn seek(&mut self, pos: usize) -> Result<(), Error> {
        if pos > self.limit {
            return Err(Error::UnexpectedEof {
                offset: pos,
                needed: 0,
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn check(&self, len: usize) -> Result<(), Error> {
        match self.pos.checked_add(len) {
            Some(end) if end <= self.limit => Ok(()),
            _ => Err(Error::UnexpectedEof {
                offset: self.pos,
                needed: len,
            }),
        }
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.check(len)?;
        self.pos += len;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.check(len)?;
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    /// Reads a length octet followed by exactly that many bytes.
    pub fn read_character_string(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_u8()? as usize;
        self.read_bytes(len)
    }

    pub fn read_ipv4(&mut self) -> Result<Ipv4Addr, Error> {
        Ok(Ipv4Addr::from(self.read_u32()?))
    }

    pub fn read_ipv6(&mut self) -> Result<Ipv6Addr, Error> {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(self.read_bytes(16)?);
        Ok(Ipv6Addr::from(octets))
    }

    /// Reads everything up to the absolute offset `end`.
    pub fn read_until(&mut self, end: usize) -> Result<&'a [u8], Error> {
        let len = end.checked_sub(self.pos).ok_or(Error::UnexpectedEof {
            offset: self.pos,
            needed: 0,
        })?;
        self.read_bytes(len)
    }

    /// Reads a possibly compressed domain name.
    pub fn read_name(&mut self) -> Result<Name, Error> {
        Name::scan(self)
    }
}
