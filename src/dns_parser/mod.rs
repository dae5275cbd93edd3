//! The DNS wire format: names, records and whole messages.

mod builder;
mod enums;
mod error;
mod factory;
pub(crate) mod header;
mod message;
mod name;
mod punycode;
mod reader;
mod rrdata;
mod structs;
mod writer;

pub use self::builder::{Additional, Answers, Builder, MoveTo, Nameservers, Questions};
pub use self::enums::{Class, Opcode, ResponseCode, Type};
pub use self::error::Error;
pub use self::factory::{ParseFn, RecordFactory};
pub use self::header::Header;
pub use self::message::{Request, Response};
pub use self::name::{Name, MAX_LABEL_LEN, MAX_NAME_LEN};
pub use self::reader::Reader;
pub use self::rrdata::{Dnskey, Ds, EdnsOption, Nsec3, Nsec3Param, RRData, Rrsig, Soa};
pub use self::structs::{Question, RecordInfo, ResourceRecord};
pub use self::writer::Writer;
