use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::{Error, Name, Reader, Type, Writer};

/// Start of authority data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soa {
    pub mname: Name,
    pub rname: Name,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// Delegation signer data, shared by DS and CDS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

/// Public key data, shared by DNSKEY and CDNSKEY
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dnskey {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rrsig {
    pub type_covered: Type,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: Name,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nsec3 {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
    pub next_hashed_owner: Vec<u8>,
    pub types: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nsec3Param {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

/// A single option of an OPT pseudo-record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

/// The enumeration that represents known types of DNS resource records data
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RRData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(Name),
    CNAME(Name),
    PTR(Name),
    DNAME(Name),
    MB(Name),
    MG(Name),
    MR(Name),
    SOA(Soa),
    HINFO {
        cpu: Vec<u8>,
        os: Vec<u8>,
    },
    MINFO {
        rmailbx: Name,
        emailbx: Name,
    },
    MX {
        preference: u16,
        exchange: Name,
    },
    TXT(Vec<Vec<u8>>),
    SPF(Vec<Vec<u8>>),
    RP {
        mbox: Name,
        txt: Name,
    },
    AFSDB {
        subtype: u16,
        hostname: Name,
    },
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: Name,
    },
    NAPTR {
        order: u16,
        preference: u16,
        flags: Vec<u8>,
        services: Vec<u8>,
        regexp: Vec<u8>,
        replacement: Name,
    },
    OPT(Vec<EdnsOption>),
    DS(Ds),
    CDS(Ds),
    SSHFP {
        algorithm: u8,
        fingerprint_type: u8,
        fingerprint: Vec<u8>,
    },
    RRSIG(Rrsig),
    NSEC {
        next_domain: Name,
        types: Vec<Type>,
    },
    DNSKEY(Dnskey),
    CDNSKEY(Dnskey),
    NSEC3(Nsec3),
    NSEC3PARAM(Nsec3Param),
    TLSA {
        cert_usage: u8,
        selector: u8,
        matching_type: u8,
        data: Vec<u8>,
    },
    URI {
        priority: u16,
        weight: u16,
        target: Vec<u8>,
    },
    CAA {
        flags: u8,
        tag: Vec<u8>,
        value: Vec<u8>,
    },
    NULL(Vec<u8>),
    /// Anything without a registered parser, kept as raw bytes
    Unknown {
        typ: Type,
        data: Vec<u8>,
    },
}

impl RRData {
    pub fn typ(&self) -> Type {
        match *self {
            RRData::A(..) => Type::A,
            RRData::AAAA(..) => Type::AAAA,
            RRData::NS(..) => Type::NS,
            RRData::CNAME(..) => Type::CNAME,
            RRData::PTR(..) => Type::PTR,
            RRData::DNAME(..) => Type::DNAME,
            RRData::MB(..) => Type::MB,
            RRData::MG(..) => Type::MG,
            RRData::MR(..) => Type::MR,
            RRData::SOA(..) => Type::SOA,
            RRData::HINFO { .. } => Type::HINFO,
            RRData::MINFO { .. } => Type::MINFO,
            RRData::MX { .. } => Type::MX,
            RRData::TXT(..) => Type::TXT,
            RRData::SPF(..) => Type::SPF,
            RRData::RP { .. } => Type::RP,
            RRData::AFSDB { .. } => Type::AFSDB,
            RRData::SRV { .. } => Type::SRV,
            RRData::NAPTR { .. } => Type::NAPTR,
            RRData::OPT(..) => Type::OPT,
            RRData::DS(..) => Type::DS,
            RRData::CDS(..) => Type::CDS,
            RRData::SSHFP { .. } => Type::SSHFP,
            RRData::RRSIG(..) => Type::RRSIG,
            RRData::NSEC { .. } => Type::NSEC,
            RRData::DNSKEY(..) => Type::DNSKEY,
            RRData::CDNSKEY(..) => Type::CDNSKEY,
            RRData::NSEC3(..) => Type::NSEC3,
            RRData::NSEC3PARAM(..) => Type::NSEC3PARAM,
            RRData::TLSA { .. } => Type::TLSA,
            RRData::URI { .. } => Type::URI,
            RRData::CAA { .. } => Type::CAA,
            RRData::NULL(..) => Type::NULL,
            RRData::Unknown { typ, .. } => typ,
        }
    }

    /// The address of A and AAAA records.
    pub fn address(&self) -> Option<IpAddr> {
        match *self {
            RRData::A(ip) => Some(ip.into()),
            RRData::AAAA(ip) => Some(ip.into()),
            _ => None,
        }
    }

    /// The target name of records that just point somewhere else.
    pub fn target(&self) -> Option<&Name> {
        match *self {
            RRData::NS(ref name)
            | RRData::CNAME(ref name)
            | RRData::PTR(ref name)
            | RRData::DNAME(ref name)
            | RRData::MB(ref name)
            | RRData::MG(ref name)
            | RRData::MR(ref name) => Some(name),
            RRData::MX { ref exchange, .. } => Some(exchange),
            RRData::SRV { ref target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn write_to(&self, writer: &mut Writer) -> Result<(), Error> {
        match *self {
            RRData::A(ip) => writer.write_u32(ip.into()),
            RRData::AAAA(ip) => writer.write_bytes(&ip.octets()),
            RRData::NS(ref name)
            | RRData::CNAME(ref name)
            | RRData::PTR(ref name)
            | RRData::DNAME(ref name)
            | RRData::MB(ref name)
            | RRData::MG(ref name)
            | RRData::MR(ref name) => name.write_to(writer),
            RRData::SOA(ref soa) => {
                soa.mname.write_to(writer);
                soa.rname.write_to(writer);
                writer.write_u32(soa.serial);
                writer.write_u32(soa.refresh);
                writer.write_u32(soa.retry);
                writer.write_u32(soa.expire);
                writer.write_u32(soa.minimum);
            }
            RRData::HINFO { ref cpu, ref os } => {
                writer.write_character_string(cpu)?;
                writer.write_character_string(os)?;
            }
            RRData::MINFO {
                ref rmailbx,
                ref emailbx,
            } => {
                rmailbx.write_to(writer);
                emailbx.write_to(writer);
            }
            RRData::MX {
                preference,
                ref exchange,
            } => {
                writer.write_u16(preference);
                exchange.write_to(writer);
            }
            RRData::TXT(ref strings) | RRData::SPF(ref strings) => {
                for string in strings {
                    writer.write_character_string(string)?;
                }
            }
            RRData::RP { ref mbox, ref txt } => {
                mbox.write_to(writer);
                txt.write_to(writer);
            }
            RRData::AFSDB {
                subtype,
                ref hostname,
            } => {
                writer.write_u16(subtype);
                hostname.write_to(writer);
            }
            RRData::SRV {
                priority,
                weight,
                port,
                ref target,
            } => {
                writer.write_u16(priority);
                writer.write_u16(weight);
                writer.write_u16(port);
                target.write_to(writer);
            }
            RRData::NAPTR {
                order,
                preference,
                ref flags,
                ref services,
                ref regexp,
                ref replacement,
            } => {
                writer.write_u16(order);
                writer.write_u16(preference);
                writer.write_character_string(flags)?;
                writer.write_character_string(services)?;
                writer.write_character_string(regexp)?;
                replacement.write_to(writer);
            }
            RRData::OPT(ref options) => {
                for option in options {
                    writer.write_u16(option.code);
                    writer.write_u16(option.data.len() as u16);
                    writer.write_bytes(&option.data);
                }
            }
            RRData::DS(ref ds) | RRData::CDS(ref ds) => {
                writer.write_u16(ds.key_tag);
                writer.write_u8(ds.algorithm);
                writer.write_u8(ds.digest_type);
                writer.write_bytes(&ds.digest);
            }
            RRData::SSHFP {
                algorithm,
                fingerprint_type,
                ref fingerprint,
            } => {
                writer.write_u8(algorithm);
                writer.write_u8(fingerprint_type);
                writer.write_bytes(fingerprint);
            }
            RRData::RRSIG(ref sig) => {
                writer.write_u16(sig.type_covered.into());
                writer.write_u8(sig.algorithm);
                writer.write_u8(sig.labels);
                writer.write_u32(sig.original_ttl);
                writer.write_u32(sig.expiration);
                writer.write_u32(sig.inception);
                writer.write_u16(sig.key_tag);
                sig.signer_name.write_to(writer);
                writer.write_bytes(&sig.signature);
            }
            RRData::NSEC {
                ref next_domain,
                ref types,
            } => {
                next_domain.write_to(writer);
                write_type_bitmap(types, writer);
            }
            RRData::DNSKEY(ref key) | RRData::CDNSKEY(ref key) => {
                writer.write_u16(key.flags);
                writer.write_u8(key.protocol);
                writer.write_u8(key.algorithm);
                writer.write_bytes(&key.public_key);
            }
            RRData::NSEC3(ref nsec3) => {
                writer.write_u8(nsec3.hash_algorithm);
                writer.write_u8(nsec3.flags);
                writer.write_u16(nsec3.iterations);
                writer.write_character_string(&nsec3.salt)?;
                writer.write_character_string(&nsec3.next_hashed_owner)?;
                write_type_bitmap(&nsec3.types, writer);
            }
            RRData::NSEC3PARAM(ref param) => {
                writer.write_u8(param.hash_algorithm);
                writer.write_u8(param.flags);
                writer.write_u16(param.iterations);
                writer.write_character_string(&param.salt)?;
            }
            RRData::TLSA {
                cert_usage,
                selector,
                matching_type,
                ref data,
            } => {
                writer.write_u8(cert_usage);
                writer.write_u8(selector);
                writer.write_u8(matching_type);
                writer.write_bytes(data);
            }
            RRData::URI {
                priority,
                weight,
                ref target,
            } => {
                writer.write_u16(priority);
                writer.write_u16(weight);
                writer.write_bytes(target);
            }
            RRData::CAA {
                flags,
                ref tag,
                ref value,
            } => {
                writer.write_u8(flags);
                writer.write_character_string(tag)?;
                writer.write_bytes(value);
            }
            RRData::NULL(ref data) | RRData::Unknown { ref data, .. } => writer.write_bytes(data),
        }
        Ok(())
    }
}

/// Largest bitmap a single window may carry.
const MAX_WINDOW_LEN: usize = 32;

/// Reads `(window, length, bitmap)` triples up to the absolute offset `end`.
pub(crate) fn read_type_bitmap(reader: &mut Reader, end: usize) -> Result<Vec<Type>, Error> {
    let mut types = Vec::new();
    while reader.position() < end {
        let offset = reader.position();
        if end - offset < 2 {
            return Err(Error::InvalidTypeBitmap { offset });
        }
        let window = reader.read_u8()? as u16;
        let len = reader.read_u8()? as usize;
        if len == 0 || len > MAX_WINDOW_LEN || reader.position() + len > end {
            return Err(Error::InvalidTypeBitmap { offset });
        }
        for (i, &byte) in reader.read_bytes(len)?.iter().enumerate() {
            for bit in 0..8 {
                if byte & (0x80 >> bit) != 0 {
                    types.push(Type::from((window << 8) | (i as u16 * 8 + bit)));
                }
            }
        }
    }
    Ok(types)
}

pub(crate) fn write_type_bitmap(types: &[Type], writer: &mut Writer) {
    let mut windows: BTreeMap<u8, [u8; MAX_WINDOW_LEN]> = BTreeMap::new();
    for &typ in types {
        let value = u16::from(typ);
        let bitmap = windows
            .entry((value >> 8) as u8)
            .or_insert([0; MAX_WINDOW_LEN]);
        let low = (value & 0xff) as usize;
        bitmap[low / 8] |= 0x80 >> (low % 8);
    }
    for (window, bitmap) in windows {
        let len = bitmap.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        writer.write_u8(window);
        writer.write_u8(len as u8);
        writer.write_bytes(&bitmap[..len]);
    }
}
