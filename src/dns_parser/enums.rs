use std::fmt;

/// Declares an IANA registry as an enum with an `Unknown` fallback arm.
macro_rules! int_enum {
    ( $(#[$attr:meta])* $name:ident, $prefix:expr;
      $( $(#[$vattr:meta])* ( $variant:ident => $value:literal, $mnemonic:literal ) )* ) => {
        $(#[$attr])*
        #[allow(clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vattr])* $variant, )*
            /// A value without a well-known mnemonic.
            Unknown(u16),
        }

        impl From<u16> for $name {
            fn from(value: u16) -> Self {
                match value {
                    $( $value => $name::$variant, )*
                    other => $name::Unknown(other),
                }
            }
        }

        impl From<$name> for u16 {
            fn from(value: $name) -> u16 {
                match value {
                    $( $name::$variant => $value, )*
                    $name::Unknown(other) => other,
                }
            }
        }

        impl $name {
            /// Returns the registered mnemonic, if there is one.
            pub fn to_mnemonic(self) -> Option<&'static str> {
                match $name::from(u16::from(self)) {
                    $( $name::$variant => Some($mnemonic), )*
                    $name::Unknown(_) => None,
                }
            }

            /// Looks up a value by its mnemonic, ignoring ASCII case.
            pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
                $(
                    if mnemonic.eq_ignore_ascii_case($mnemonic) {
                        return Some($name::$variant);
                    }
                )*
                None
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match self.to_mnemonic() {
                    Some(mnemonic) => f.write_str(mnemonic),
                    None => write!(f, "{}{}", $prefix, u16::from(*self)),
                }
            }
        }
    };
}

int_enum! {
    /// Resource record and query types
    Type, "TYPE";
    (A => 1, "A")
    (NS => 2, "NS")
    (CNAME => 5, "CNAME")
    (SOA => 6, "SOA")
    (MB => 7, "MB")
    (MG => 8, "MG")
    (MR => 9, "MR")
    (NULL => 10, "NULL")
    (PTR => 12, "PTR")
    (HINFO => 13, "HINFO")
    (MINFO => 14, "MINFO")
    (MX => 15, "MX")
    (TXT => 16, "TXT")
    (RP => 17, "RP")
    (AFSDB => 18, "AFSDB")
    (AAAA => 28, "AAAA")
    (SRV => 33, "SRV")
    (NAPTR => 35, "NAPTR")
    (DNAME => 39, "DNAME")
    (OPT => 41, "OPT")
    (DS => 43, "DS")
    (SSHFP => 44, "SSHFP")
    (RRSIG => 46, "RRSIG")
    (NSEC => 47, "NSEC")
    (DNSKEY => 48, "DNSKEY")
    (NSEC3 => 50, "NSEC3")
    (NSEC3PARAM => 51, "NSEC3PARAM")
    (TLSA => 52, "TLSA")
    (CDS => 59, "CDS")
    (CDNSKEY => 60, "CDNSKEY")
    (SPF => 99, "SPF")
    (IXFR => 251, "IXFR")
    (AXFR => 252, "AXFR")
    (MAILB => 253, "MAILB")
    /// Query type asking for all records
    (ANY => 255, "ANY")
    (URI => 256, "URI")
    (CAA => 257, "CAA")
}

int_enum! {
    /// Record and query classes
    Class, "CLASS";
    (IN => 1, "IN")
    (CS => 2, "CS")
    (CH => 3, "CH")
    (HS => 4, "HS")
    (NONE => 254, "NONE")
    (ANY => 255, "ANY")
}

int_enum! {
    /// The kind of query held in a message
    Opcode, "OPCODE";
    (StandardQuery => 0, "QUERY")
    (InverseQuery => 1, "IQUERY")
    (ServerStatus => 2, "STATUS")
    (Notify => 4, "NOTIFY")
    (Update => 5, "UPDATE")
}

/// Response codes
///
/// The first sixteen values fit into the header, the remaining ones need
/// the upper eight bits carried by an OPT record. `ConnectionFailure` is
/// never sent by a server; the resolver reports it when no server gave an
/// answer at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    YXDomain,
    YXRRSet,
    NXRRSet,
    NotAuth,
    NotZone,
    /// BADVERS for OPT, BADSIG for TSIG
    BadVers,
    BadKey,
    BadTime,
    BadMode,
    BadName,
    BadAlg,
    BadTrunc,
    BadCookie,
    Unknown(u16),
    ConnectionFailure,
}

impl ResponseCode {
    /// Alias of `BadVers` used by TSIG.
    pub const BAD_SIG: ResponseCode = ResponseCode::BadVers;

    pub fn is_success(self) -> bool {
        self == ResponseCode::NoError
    }

    /// Returns the value as it appears on the wire.
    ///
    /// `ConnectionFailure` has no wire value and yields `None`.
    pub fn to_wire(self) -> Option<u16> {
        use self::ResponseCode::*;
        Some(match self {
            NoError => 0,
            FormatError => 1,
            ServerFailure => 2,
            NameError => 3,
            NotImplemented => 4,
            Refused => 5,
            YXDomain => 6,
            YXRRSet => 7,
            NXRRSet => 8,
            NotAuth => 9,
            NotZone => 10,
            BadVers => 16,
            BadKey => 17,
            BadTime => 18,
            BadMode => 19,
            BadName => 20,
            BadAlg => 21,
            BadTrunc => 22,
            BadCookie => 23,
            Unknown(code) => code,
            ConnectionFailure => return None,
        })
    }

    pub fn from_wire(code: u16) -> ResponseCode {
        use self::ResponseCode::*;
        match code {
            0 => NoError,
            1 => FormatError,
            2 => ServerFailure,
            3 => NameError,
            4 => NotImplemented,
            5 => Refused,
            6 => YXDomain,
            7 => YXRRSet,
            8 => NXRRSet,
            9 => NotAuth,
            10 => NotZone,
            16 => BadVers,
            17 => BadKey,
            18 => BadTime,
            19 => BadMode,
            20 => BadName,
            21 => BadAlg,
            22 => BadTrunc,
            23 => BadCookie,
            code => Unknown(code),
        }
    }

    pub fn to_mnemonic(self) -> Option<&'static str> {
        use self::ResponseCode::*;
        Some(match self {
            NoError => "NOERROR",
            FormatError => "FORMERR",
            ServerFailure => "SERVFAIL",
            NameError => "NXDOMAIN",
            NotImplemented => "NOTIMP",
            Refused => "REFUSED",
            YXDomain => "YXDOMAIN",
            YXRRSet => "YXRRSET",
            NXRRSet => "NXRRSET",
            NotAuth => "NOTAUTH",
            NotZone => "NOTZONE",
            BadVers => "BADVERS",
            BadKey => "BADKEY",
            BadTime => "BADTIME",
            BadMode => "BADMODE",
            BadName => "BADNAME",
            BadAlg => "BADALG",
            BadTrunc => "BADTRUNC",
            BadCookie => "BADCOOKIE",
            ConnectionFailure => "CONNECTION_FAILURE",
            Unknown(_) => return None,
        })
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "RCODE{}", self.to_wire().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn type_values_round_trip() {
        assert_eq!(Type::from(28), Type::AAAA);
        assert_eq!(u16::from(Type::CAA), 257);
        assert_eq!(Type::from(65280), Type::Unknown(65280));
        assert_eq!(Type::from_mnemonic("nsec3param"), Some(Type::NSEC3PARAM));
        assert_eq!(Type::from(4242).to_string(), "TYPE4242");
        assert_eq!(Class::IN.to_string(), "IN");
    }

    #[test]
    fn extended_response_codes() {
        assert_eq!(ResponseCode::from_wire(23), ResponseCode::BadCookie);
        assert_eq!(ResponseCode::from_wire(16), ResponseCode::BAD_SIG);
        assert_eq!(ResponseCode::from_wire(3).to_string(), "NXDOMAIN");
        assert_eq!(ResponseCode::ConnectionFailure.to_wire(), None);
        assert_eq!(ResponseCode::from_wire(3841).to_string(), "RCODE3841");
        assert!(!ResponseCode::Refused.is_success());
    }
}
