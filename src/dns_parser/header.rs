use byteorder::{BigEndian, ByteOrder};

use super::{Error, Opcode, ResponseCode};

mod flag {
    pub const QUERY: u16 = 0b1000_0000_0000_0000;
    pub const OPCODE_MASK: u16 = 0b0111_1000_0000_0000;
    pub const AUTHORITATIVE: u16 = 0b0000_0100_0000_0000;
    pub const TRUNCATED: u16 = 0b0000_0010_0000_0000;
    pub const RECURSION_DESIRED: u16 = 0b0000_0001_0000_0000;
    pub const RECURSION_AVAILABLE: u16 = 0b0000_0000_1000_0000;
    pub const AUTHENTICATED_DATA: u16 = 0b0000_0000_0010_0000;
    pub const CHECKING_DISABLED: u16 = 0b0000_0000_0001_0000;
    pub const RESPONSE_CODE_MASK: u16 = 0b0000_0000_0000_1111;
}

pub const HEADER_LEN: usize = 12;

/// Represents parsed header of the packet
///
/// `query` is true for requests, i.e. when the QR bit is clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub query: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub authenticated_data: bool,
    pub checking_disabled: bool,
    /// The four bits of response code carried in the header itself
    pub response_code: ResponseCode,
    pub questions: u16,
    pub answers: u16,
    pub nameservers: u16,
    pub additional: u16,
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Header, Error> {
        if data.len() < HEADER_LEN {
            return Err(Error::HeaderTooShort { len: data.len() });
        }
        let flags = BigEndian::read_u16(&data[2..4]);
        Ok(Header {
            id: BigEndian::read_u16(&data[..2]),
            query: flags & flag::QUERY == 0,
            opcode: Opcode::from((flags & flag::OPCODE_MASK) >> 11),
            authoritative: flags & flag::AUTHORITATIVE != 0,
            truncated: flags & flag::TRUNCATED != 0,
            recursion_desired: flags & flag::RECURSION_DESIRED != 0,
            recursion_available: flags & flag::RECURSION_AVAILABLE != 0,
            authenticated_data: flags & flag::AUTHENTICATED_DATA != 0,
            checking_disabled: flags & flag::CHECKING_DISABLED != 0,
            response_code: ResponseCode::from_wire(flags & flag::RESPONSE_CODE_MASK),
            questions: BigEndian::read_u16(&data[4..6]),
            answers: BigEndian::read_u16(&data[6..8]),
            nameservers: BigEndian::read_u16(&data[8..10]),
            additional: BigEndian::read_u16(&data[10..12]),
        })
    }

    /// Writes the header to the first twelve bytes of `data`.
    ///
    /// Only the lower four bits of the response code are written.
    ///
    /// # Panics
    ///
    /// When `data` is shorter than twelve bytes.
    pub fn write(&self, data: &mut [u8]) {
        let mut flags = 0u16;
        flags |= (u16::from(self.opcode) << 11) & flag::OPCODE_MASK;
        flags |= self.response_code.to_wire().unwrap_or_default() & flag::RESPONSE_CODE_MASK;
        if !self.query {
            flags |= flag::QUERY;
        }
        if self.authoritative {
            flags |= flag::AUTHORITATIVE;
        }
        if self.truncated {
            flags |= flag::TRUNCATED;
        }
        if self.recursion_desired {
            flags |= flag::RECURSION_DESIRED;
        }
        if self.recursion_available {
            flags |= flag::RECURSION_AVAILABLE;
        }
        if self.authenticated_data {
            flags |= flag::AUTHENTICATED_DATA;
        }
        if self.checking_disabled {
            flags |= flag::CHECKING_DISABLED;
        }
        BigEndian::write_u16(&mut data[..2], self.id);
        BigEndian::write_u16(&mut data[2..4], flags);
        BigEndian::write_u16(&mut data[4..6], self.questions);
        BigEndian::write_u16(&mut data[6..8], self.answers);
        BigEndian::write_u16(&mut data[8..10], self.nameservers);
        BigEndian::write_u16(&mut data[10..12], self.additional);
    }

    pub fn id(data: &[u8]) -> Option<u16> {
        data.get(..2).map(BigEndian::read_u16)
    }

    pub fn set_truncated(data: &mut [u8]) {
        data[2] |= (flag::TRUNCATED >> 8) as u8;
    }

    /// Replaces the lower four response code bits.
    pub fn set_response_code(data: &mut [u8], code: ResponseCode) {
        let bits = code.to_wire().unwrap_or_default() & flag::RESPONSE_CODE_MASK;
        data[3] = (data[3] & !(flag::RESPONSE_CODE_MASK as u8)) | bits as u8;
    }

    pub fn question_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[4..6])
    }

    pub fn answer_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[6..8])
    }

    pub fn nameserver_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[8..10])
    }

    pub fn additional_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[10..12])
    }

    fn inc_count(data: &mut [u8], offset: usize, section: &'static str) -> Result<u16, Error> {
        let count = BigEndian::read_u16(&data[offset..offset + 2])
            .checked_add(1)
            .ok_or(Error::SectionOverflow { section })?;
        BigEndian::write_u16(&mut data[offset..offset + 2], count);
        Ok(count)
    }

    pub fn inc_questions(data: &mut [u8]) -> Result<u16, Error> {
        Header::inc_count(data, 4, "question")
    }

    pub fn inc_answers(data: &mut [u8]) -> Result<u16, Error> {
        Header::inc_count(data, 6, "answer")
    }

    pub fn inc_nameservers(data: &mut [u8]) -> Result<u16, Error> {
        Header::inc_count(data, 8, "authority")
    }

    pub fn inc_additional(data: &mut [u8]) -> Result<u16, Error> {
        Header::inc_count(data, 10, "additional")
    }
}
