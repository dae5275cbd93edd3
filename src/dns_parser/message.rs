use rand::Rng;

use super::header::HEADER_LEN;
use super::{
    Builder, Class, Error, Header, Name, Question, RRData, Reader, RecordFactory, ResourceRecord,
    ResponseCode, Type,
};

/// A query to send to a name server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: u16,
    pub question: Question,
    pub recursion_desired: bool,
    /// Appends an OPT record advertising this UDP payload size
    pub edns_payload_size: Option<u16>,
}

impl Request {
    /// Creates a recursive query with a random id.
    pub fn new(qname: Name, qtype: Type, qclass: Class) -> Request {
        Request {
            id: rand::thread_rng().gen(),
            question: Question::new(qname, qtype, qclass),
            recursion_desired: true,
            edns_payload_size: None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let builder = Builder::new_query(self.id, self.recursion_desired).add_question(
            &self.question.qname,
            self.question.qtype,
            self.question.qclass,
        )?;
        let packet = match self.edns_payload_size {
            Some(size) => builder.add_opt(size)?.build(),
            None => builder.build(),
        };
        Ok(packet.unwrap_or_else(|x| x))
    }
}

/// A parsed response message
#[derive(Debug, Clone)]
pub struct Response {
    pub header: Header,
    /// The full response code, extended by an OPT record if there was one
    pub response_code: ResponseCode,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub nameservers: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
    /// UDP payload size advertised by the server's OPT record
    pub edns_payload_size: Option<u16>,
    /// Size of the message on the wire
    pub size: usize,
}

impl Response {
    /// Parses a whole message, records are read with `factory`.
    pub fn parse(data: &[u8], factory: &RecordFactory) -> Result<Response, Error> {
        let header = Header::parse(data)?;
        let mut reader = Reader::new(data);
        reader.skip(HEADER_LEN)?;

        let mut questions = Vec::with_capacity(header.questions as usize);
        for _ in 0..header.questions {
            questions.push(Question::parse(&mut reader)?);
        }
        let answers = parse_records(&mut reader, factory, header.answers)?;
        let nameservers = parse_records(&mut reader, factory, header.nameservers)?;
        let additional = parse_records(&mut reader, factory, header.additional)?;

        let mut response_code = header.response_code;
        let mut edns_payload_size = None;
        if let Some(opt) = additional.iter().find(|rr| rr.rtype() == Type::OPT) {
            // The OPT TTL carries the upper eight bits of the response code.
            let upper = (opt.info.initial_ttl >> 24) as u16;
            let lower = response_code.to_wire().unwrap_or_default();
            response_code = ResponseCode::from_wire(upper << 4 | lower);
            edns_payload_size = Some(u16::from(opt.class()));
        }

        Ok(Response {
            header,
            response_code,
            questions,
            answers,
            nameservers,
            additional,
            edns_payload_size,
            size: data.len(),
        })
    }

    pub fn id(&self) -> u16 {
        self.header.id
    }

    pub fn is_truncated(&self) -> bool {
        self.header.truncated
    }

    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// All records of the answer, authority and additional sections.
    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(self.nameservers.iter())
            .chain(self.additional.iter())
    }

    /// Answer records of the given type.
    pub fn answers_of(&self, rtype: Type) -> impl Iterator<Item = &RRData> {
        self.answers
            .iter()
            .filter(move |rr| rr.rtype() == rtype)
            .map(|rr| &rr.data)
    }

    /// The smallest current TTL of all records, OPT excluded.
    ///
    /// A response without any records has a TTL of zero.
    pub fn min_ttl(&self) -> u32 {
        self.records()
            .filter(|rr| rr.rtype() != Type::OPT)
            .map(ResourceRecord::ttl)
            .min()
            .unwrap_or(0)
    }
}

fn parse_records(
    reader: &mut Reader,
    factory: &RecordFactory,
    count: u16,
) -> Result<Vec<ResourceRecord>, Error> {
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        records.push(factory.parse_record(reader)?);
    }
    Ok(records)
}
