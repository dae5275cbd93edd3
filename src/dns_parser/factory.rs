use std::collections::HashMap;

use super::rrdata::read_type_bitmap;
use super::{
    Dnskey, Ds, EdnsOption, Error, Nsec3, Nsec3Param, RRData, Reader, RecordInfo, ResourceRecord,
    Rrsig, Soa, Type,
};

/// Parses the RDATA of one record type
///
/// The reader is positioned at the start of the RDATA and limited to its
/// end; compression pointers still reach earlier parts of the message. It
/// must be left right behind the RDATA.
pub type ParseFn = fn(&RecordInfo, &mut Reader) -> Result<RRData, Error>;

/// Maps record types to their RDATA parsers
///
/// Types without a parser are kept as opaque bytes. The factory is built
/// once and then only read, so it can be shared between lookups.
#[derive(Clone)]
pub struct RecordFactory {
    parsers: HashMap<Type, ParseFn>,
}

impl Default for RecordFactory {
    fn default() -> RecordFactory {
        RecordFactory::new()
    }
}

impl RecordFactory {
    /// A factory knowing all built-in record types.
    pub fn new() -> RecordFactory {
        let builtin: [(Type, ParseFn); 33] = [
            (Type::A, parse_a),
            (Type::AAAA, parse_aaaa),
            (Type::NS, |_, r| Ok(RRData::NS(r.read_name()?))),
            (Type::CNAME, |_, r| Ok(RRData::CNAME(r.read_name()?))),
            (Type::PTR, |_, r| Ok(RRData::PTR(r.read_name()?))),
            (Type::DNAME, |_, r| Ok(RRData::DNAME(r.read_name()?))),
            (Type::MB, |_, r| Ok(RRData::MB(r.read_name()?))),
            (Type::MG, |_, r| Ok(RRData::MG(r.read_name()?))),
            (Type::MR, |_, r| Ok(RRData::MR(r.read_name()?))),
            (Type::SOA, parse_soa),
            (Type::HINFO, parse_hinfo),
            (Type::MINFO, parse_minfo),
            (Type::MX, parse_mx),
            (Type::TXT, |i, r| Ok(RRData::TXT(read_strings(i, r)?))),
            (Type::SPF, |i, r| Ok(RRData::SPF(read_strings(i, r)?))),
            (Type::RP, parse_rp),
            (Type::AFSDB, parse_afsdb),
            (Type::SRV, parse_srv),
            (Type::NAPTR, parse_naptr),
            (Type::OPT, parse_opt),
            (Type::DS, |i, r| Ok(RRData::DS(read_ds(i, r)?))),
            (Type::CDS, |i, r| Ok(RRData::CDS(read_ds(i, r)?))),
            (Type::SSHFP, parse_sshfp),
            (Type::RRSIG, parse_rrsig),
            (Type::NSEC, parse_nsec),
            (Type::DNSKEY, |i, r| Ok(RRData::DNSKEY(read_dnskey(i, r)?))),
            (Type::CDNSKEY, |i, r| Ok(RRData::CDNSKEY(read_dnskey(i, r)?))),
            (Type::NSEC3, parse_nsec3),
            (Type::NSEC3PARAM, parse_nsec3param),
            (Type::TLSA, parse_tlsa),
            (Type::URI, parse_uri),
            (Type::CAA, parse_caa),
            (Type::NULL, |i, r| Ok(RRData::NULL(read_rest(i, r).to_vec()))),
        ];
        let mut factory = RecordFactory::empty();
        for &(typ, parser) in builtin.iter() {
            factory.parsers.insert(typ, parser);
        }
        factory
    }

    /// A factory treating every record type as opaque.
    pub fn empty() -> RecordFactory {
        RecordFactory {
            parsers: HashMap::new(),
        }
    }

    /// Registers, or replaces, the parser for `typ`.
    pub fn with_parser(mut self, typ: Type, parser: ParseFn) -> RecordFactory {
        self.parsers.insert(typ, parser);
        self
    }

    pub fn knows(&self, typ: Type) -> bool {
        self.parsers.contains_key(&typ)
    }

    /// Reads a whole resource record at the reader's position.
    pub fn parse_record(&self, reader: &mut Reader) -> Result<ResourceRecord, Error> {
        let info = RecordInfo::parse(reader)?;
        let data = self.parse_rdata(&info, reader)?;
        Ok(ResourceRecord { info, data })
    }

    /// Parses RDATA of `info.rdlength` bytes and leaves the reader behind it.
    ///
    /// A parser that wants more or fewer bytes than declared fails with
    /// `Error::RdataLengthMismatch`, no matter what follows the record.
    pub fn parse_rdata(&self, info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
        let start = reader.position();
        let declared = info.rdlength as usize;
        if declared > reader.remaining() {
            return Err(Error::UnexpectedEof {
                offset: start,
                needed: declared,
            });
        }
        let end = start + declared;
        let outer = reader.set_limit(end)?;
        let parsed = match self.parsers.get(&info.rtype) {
            Some(parser) => parser(info, reader),
            None => reader.read_bytes(declared).map(|data| RRData::Unknown {
                typ: info.rtype,
                data: data.to_vec(),
            }),
        };
        reader.set_limit(outer)?;

        let mismatch = |consumed| Error::RdataLengthMismatch {
            rtype: info.rtype,
            declared,
            consumed,
            offset: start,
        };
        let data = match parsed {
            Err(Error::UnexpectedEof { offset, needed })
                if offset >= start && offset <= end && offset.saturating_add(needed) > end =>
            {
                return Err(mismatch(offset.saturating_add(needed) - start));
            }
            parsed => parsed?,
        };
        if reader.position() != end {
            return Err(mismatch(reader.position().wrapping_sub(start)));
        }
        Ok(data)
    }
}

/// Absolute offset where the RDATA ends, for a reader at its start.
fn rdata_end(info: &RecordInfo, reader: &Reader) -> usize {
    reader.position() + info.rdlength as usize
}

/// Everything left of the RDATA. Empty when the reader already went past.
fn read_rest<'a>(info: &RecordInfo, reader: &mut Reader<'a>) -> &'a [u8] {
    read_up_to(reader, rdata_end(info, reader))
}

fn read_up_to<'a>(reader: &mut Reader<'a>, end: usize) -> &'a [u8] {
    if reader.position() >= end {
        return &[];
    }
    reader.read_until(end).unwrap_or(&[])
}

fn expect_len(info: &RecordInfo, expected: usize) -> Result<(), Error> {
    if info.rdlength as usize != expected {
        return Err(Error::WrongRdataLength {
            rtype: info.rtype,
            expected,
            actual: info.rdlength as usize,
        });
    }
    Ok(())
}

fn parse_a(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    expect_len(info, 4)?;
    Ok(RRData::A(reader.read_ipv4()?))
}

fn parse_aaaa(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    expect_len(info, 16)?;
    Ok(RRData::AAAA(reader.read_ipv6()?))
}

fn parse_soa(_: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    Ok(RRData::SOA(Soa {
        mname: reader.read_name()?,
        rname: reader.read_name()?,
        serial: reader.read_u32()?,
        refresh: reader.read_u32()?,
        retry: reader.read_u32()?,
        expire: reader.read_u32()?,
        minimum: reader.read_u32()?,
    }))
}

fn parse_hinfo(_: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    Ok(RRData::HINFO {
        cpu: reader.read_character_string()?.to_vec(),
        os: reader.read_character_string()?.to_vec(),
    })
}

fn parse_minfo(_: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    Ok(RRData::MINFO {
        rmailbx: reader.read_name()?,
        emailbx: reader.read_name()?,
    })
}

fn parse_mx(_: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    Ok(RRData::MX {
        preference: reader.read_u16()?,
        exchange: reader.read_name()?,
    })
}

fn read_strings(info: &RecordInfo, reader: &mut Reader) -> Result<Vec<Vec<u8>>, Error> {
    let end = rdata_end(info, reader);
    let mut strings = Vec::new();
    while reader.position() < end {
        strings.push(reader.read_character_string()?.to_vec());
    }
    Ok(strings)
}

fn parse_rp(_: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    Ok(RRData::RP {
        mbox: reader.read_name()?,
        txt: reader.read_name()?,
    })
}

fn parse_afsdb(_: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    Ok(RRData::AFSDB {
        subtype: reader.read_u16()?,
        hostname: reader.read_name()?,
    })
}

fn parse_srv(_: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    Ok(RRData::SRV {
        priority: reader.read_u16()?,
        weight: reader.read_u16()?,
        port: reader.read_u16()?,
        target: reader.read_name()?,
    })
}

fn parse_naptr(_: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    Ok(RRData::NAPTR {
        order: reader.read_u16()?,
        preference: reader.read_u16()?,
        flags: reader.read_character_string()?.to_vec(),
        services: reader.read_character_string()?.to_vec(),
        regexp: reader.read_character_string()?.to_vec(),
        replacement: reader.read_name()?,
    })
}

fn parse_opt(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    let end = rdata_end(info, reader);
    let mut options = Vec::new();
    while reader.position() < end {
        let code = reader.read_u16()?;
        let len = reader.read_u16()? as usize;
        options.push(EdnsOption {
            code,
            data: reader.read_bytes(len)?.to_vec(),
        });
    }
    Ok(RRData::OPT(options))
}

fn read_ds(info: &RecordInfo, reader: &mut Reader) -> Result<Ds, Error> {
    let end = rdata_end(info, reader);
    Ok(Ds {
        key_tag: reader.read_u16()?,
        algorithm: reader.read_u8()?,
        digest_type: reader.read_u8()?,
        digest: read_up_to(reader, end).to_vec(),
    })
}

fn parse_sshfp(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    let end = rdata_end(info, reader);
    Ok(RRData::SSHFP {
        algorithm: reader.read_u8()?,
        fingerprint_type: reader.read_u8()?,
        fingerprint: read_up_to(reader, end).to_vec(),
    })
}

fn parse_rrsig(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    let end = rdata_end(info, reader);
    Ok(RRData::RRSIG(Rrsig {
        type_covered: Type::from(reader.read_u16()?),
        algorithm: reader.read_u8()?,
        labels: reader.read_u8()?,
        original_ttl: reader.read_u32()?,
        expiration: reader.read_u32()?,
        inception: reader.read_u32()?,
        key_tag: reader.read_u16()?,
        signer_name: reader.read_name()?,
        signature: read_up_to(reader, end).to_vec(),
    }))
}

fn parse_nsec(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    let end = rdata_end(info, reader);
    let next_domain = reader.read_name()?;
    let types = read_type_bitmap(reader, end)?;
    Ok(RRData::NSEC { next_domain, types })
}

fn read_dnskey(info: &RecordInfo, reader: &mut Reader) -> Result<Dnskey, Error> {
    let end = rdata_end(info, reader);
    Ok(Dnskey {
        flags: reader.read_u16()?,
        protocol: reader.read_u8()?,
        algorithm: reader.read_u8()?,
        public_key: read_up_to(reader, end).to_vec(),
    })
}

fn parse_nsec3(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    let end = rdata_end(info, reader);
    let hash_algorithm = reader.read_u8()?;
    let flags = reader.read_u8()?;
    let iterations = reader.read_u16()?;
    let salt = reader.read_character_string()?.to_vec();
    let next_hashed_owner = reader.read_character_string()?.to_vec();
    let types = read_type_bitmap(reader, end)?;
    Ok(RRData::NSEC3(Nsec3 {
        hash_algorithm,
        flags,
        iterations,
        salt,
        next_hashed_owner,
        types,
    }))
}

fn parse_nsec3param(_: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    Ok(RRData::NSEC3PARAM(Nsec3Param {
        hash_algorithm: reader.read_u8()?,
        flags: reader.read_u8()?,
        iterations: reader.read_u16()?,
        salt: reader.read_character_string()?.to_vec(),
    }))
}

fn parse_tlsa(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    let end = rdata_end(info, reader);
    Ok(RRData::TLSA {
        cert_usage: reader.read_u8()?,
        selector: reader.read_u8()?,
        matching_type: reader.read_u8()?,
        data: read_up_to(reader, end).to_vec(),
    })
}

fn parse_uri(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    let end = rdata_end(info, reader);
    Ok(RRData::URI {
        priority: reader.read_u16()?,
        weight: reader.read_u16()?,
        target: read_up_to(reader, end).to_vec(),
    })
}

fn parse_caa(info: &RecordInfo, reader: &mut Reader) -> Result<RRData, Error> {
    let end = rdata_end(info, reader);
    Ok(RRData::CAA {
        flags: reader.read_u8()?,
        tag: reader.read_character_string()?.to_vec(),
        value: read_up_to(reader, end).to_vec(),
    })
}
