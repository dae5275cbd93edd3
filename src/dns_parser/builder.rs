use std::marker::PhantomData;

use super::header::HEADER_LEN;
use super::{Class, Error, Header, Name, Opcode, RRData, ResponseCode, Type, Writer};

pub enum Questions {}
pub enum Answers {}
pub enum Nameservers {}
pub enum Additional {}

pub trait MoveTo<T> {}
impl<T> MoveTo<T> for T {}

impl MoveTo<Answers> for Questions {}

impl MoveTo<Nameservers> for Questions {}
impl MoveTo<Nameservers> for Answers {}

impl MoveTo<Additional> for Questions {}
impl MoveTo<Additional> for Answers {}
impl MoveTo<Additional> for Nameservers {}

/// Allows to build a DNS packet
///
/// Sections have to be filled in order, which the type parameter enforces.
/// Names are written uncompressed.
pub struct Builder<S> {
    writer: Writer,
    max_size: Option<usize>,
    _state: PhantomData<S>,
}

impl Builder<Questions> {
    /// Creates a new query
    ///
    /// Initially all sections are empty. You're expected to fill
    /// the questions section with `add_question`
    pub fn new_query(id: u16, recursion: bool) -> Builder<Questions> {
        Builder::with_header(Header {
            id,
            query: true,
            opcode: Opcode::StandardQuery,
            authoritative: false,
            truncated: false,
            recursion_desired: recursion,
            recursion_available: false,
            authenticated_data: false,
            checking_disabled: false,
            response_code: ResponseCode::NoError,
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
        })
    }

    pub fn new_response(id: u16, recursion: bool, authoritative: bool) -> Builder<Questions> {
        Builder::with_header(Header {
            id,
            query: false,
            opcode: Opcode::StandardQuery,
            authoritative,
            truncated: false,
            recursion_desired: recursion,
            recursion_available: recursion,
            authenticated_data: false,
            checking_disabled: false,
            response_code: ResponseCode::NoError,
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
        })
    }

    fn with_header(head: Header) -> Builder<Questions> {
        let mut writer = Writer::new();
        writer.write_bytes(&[0u8; HEADER_LEN]);
        head.write(writer.as_mut_slice());
        Builder {
            writer,
            max_size: None,
            _state: PhantomData,
        }
    }
}

impl<T> Builder<T> {
    fn write_rr(&mut self, name: &Name, cls: Class, ttl: u32, data: &RRData) -> Result<(), Error> {
        name.write_to(&mut self.writer);
        self.writer.write_u16(data.typ().into());
        self.writer.write_u16(cls.into());
        self.writer.write_u32(ttl);

        let size_offset = self.writer.position();
        self.writer.write_u16(0);

        let data_offset = self.writer.position();
        data.write_to(&mut self.writer)?;
        let data_size = self.writer.position() - data_offset;
        if data_size > u16::MAX as usize {
            return Err(Error::RdataTooLong { len: data_size });
        }

        self.writer.write_u16_at(size_offset, data_size as u16);
        Ok(())
    }

    fn header_mut(&mut self) -> &mut [u8] {
        &mut self.writer.as_mut_slice()[..HEADER_LEN]
    }

    pub fn set_response_code(&mut self, code: ResponseCode) {
        Header::set_response_code(self.header_mut(), code);
    }

    pub fn set_truncated(&mut self) {
        Header::set_truncated(self.header_mut());
    }

    /// Returns the final packet
    ///
    /// When packet is not truncated method returns `Ok(packet)`. If
    /// packet exceeds the maximum size the TC bit is set and the method
    /// returns `Err(packet)`. In both cases the packet is fully valid.
    pub fn build(mut self) -> Result<Vec<u8>, Vec<u8>> {
        match self.max_size {
            Some(max_size) if self.writer.position() > max_size => {
                self.set_truncated();
                Err(self.writer.into_bytes())
            }
            _ => Ok(self.writer.into_bytes()),
        }
    }

    pub fn move_to<U>(self) -> Builder<U>
    where
        T: MoveTo<U>,
    {
        Builder {
            writer: self.writer,
            max_size: self.max_size,
            _state: PhantomData,
        }
    }

    pub fn set_max_size(&mut self, max_size: Option<usize>) {
        self.max_size = max_size;
    }

    pub fn is_empty(&self) -> bool {
        let head = self.writer.as_slice();
        Header::question_count(head) == 0
            && Header::answer_count(head) == 0
            && Header::nameserver_count(head) == 0
            && Header::additional_count(head) == 0
    }
}

impl<T: MoveTo<Questions>> Builder<T> {
    /// Adds a question to the packet
    pub fn add_question(
        self,
        qname: &Name,
        qtype: Type,
        qclass: Class,
    ) -> Result<Builder<Questions>, Error> {
        let mut builder = self.move_to::<Questions>();

        qname.write_to(&mut builder.writer);
        builder.writer.write_u16(qtype.into());
        builder.writer.write_u16(qclass.into());
        Header::inc_questions(builder.header_mut())?;
        Ok(builder)
    }
}

impl<T: MoveTo<Answers>> Builder<T> {
    pub fn add_answer(
        self,
        name: &Name,
        cls: Class,
        ttl: u32,
        data: &RRData,
    ) -> Result<Builder<Answers>, Error> {
        let mut builder = self.move_to::<Answers>();

        builder.write_rr(name, cls, ttl, data)?;
        Header::inc_answers(builder.header_mut())?;

        Ok(builder)
    }
}

impl<T: MoveTo<Nameservers>> Builder<T> {
    pub fn add_nameserver(
        self,
        name: &Name,
        cls: Class,
        ttl: u32,
        data: &RRData,
    ) -> Result<Builder<Nameservers>, Error> {
        let mut builder = self.move_to::<Nameservers>();

        builder.write_rr(name, cls, ttl, data)?;
        Header::inc_nameservers(builder.header_mut())?;

        Ok(builder)
    }
}

impl<T: MoveTo<Additional>> Builder<T> {
    pub fn add_additional(
        self,
        name: &Name,
        cls: Class,
        ttl: u32,
        data: &RRData,
    ) -> Result<Builder<Additional>, Error> {
        let mut builder = self.move_to::<Additional>();

        builder.write_rr(name, cls, ttl, data)?;
        Header::inc_additional(builder.header_mut())?;

        Ok(builder)
    }

    /// Adds an EDNS(0) OPT pseudo-record advertising `payload_size`.
    pub fn add_opt(self, payload_size: u16) -> Result<Builder<Additional>, Error> {
        self.add_additional(
            &Name::root(),
            Class::from(payload_size),
            0,
            &RRData::OPT(Vec::new()),
        )
    }
}
