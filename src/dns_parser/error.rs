use thiserror::Error;

use super::Type;

/// Error parsing or composing a DNS packet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("packet of {len} bytes is smaller than header size")]
    HeaderTooShort { len: usize },
    #[error("packet has incomplete data: {needed} bytes wanted at offset {offset}")]
    UnexpectedEof { offset: usize, needed: usize },
    #[error("label at offset {offset} has unknown label format 0x{byte:02x}")]
    UnknownLabelFormat { offset: usize, byte: u8 },
    #[error("compression pointer at offset {offset} refers to offset {target} which is not before it")]
    InvalidPointer { offset: usize, target: usize },
    #[error("name at offset {offset} follows too many compression pointers")]
    TooManyPointers { offset: usize },
    #[error("label of {len} bytes exceeds 63 bytes")]
    LabelTooLong { len: usize },
    #[error("name of {len} bytes exceeds 255 bytes")]
    NameTooLong { len: usize },
    #[error("name contains an empty label")]
    EmptyLabel,
    #[error("invalid escape sequence in name")]
    InvalidEscape,
    #[error("label cannot be converted to or from punycode")]
    InvalidPunycode,
    #[error("{rtype} record has RDATA of {actual} bytes, {expected} expected")]
    WrongRdataLength {
        rtype: Type,
        expected: usize,
        actual: usize,
    },
    #[error("{rtype} record at offset {offset} declared {declared} bytes of RDATA but {consumed} were consumed")]
    RdataLengthMismatch {
        rtype: Type,
        declared: usize,
        consumed: usize,
        offset: usize,
    },
    #[error("invalid type bitmap at offset {offset}")]
    InvalidTypeBitmap { offset: usize },
    #[error("character string of {len} bytes exceeds 255 bytes")]
    CharacterStringTooLong { len: usize },
    #[error("RDATA of {len} bytes does not fit into a record")]
    RdataTooLong { len: usize },
    #[error("too many entries in {section} section")]
    SectionOverflow { section: &'static str },
    #[error("message has no question")]
    NoQuestion,
}
