//! The store/dispatcher-level error taxonomy. Wraps `dns_proto`'s
//! lower-level codec errors so callers here never need to know about
//! `DecodeError`/`EncodeError`/`ValidationError` directly.

use std::fmt;
use std::io;

use dns_proto::Rcode;

/// Errors a store operation or the dispatcher can raise.
#[derive(Debug)]
pub enum Error {
    /// Construction-time rejection: empty name, short TTL, empty
    /// target/text, address-family mismatch.
    InvalidInput(dns_proto::ValidationError),
    /// No record at the requested (name) or (name, type).
    NotFound,
    /// A mutation or recursive lookup was invoked with type code 0.
    InvalidType,
    /// A store operation received no record, or an empty name.
    NilRecord,
    /// A wire-format problem: decode truncation, an out-of-range
    /// label length, or a structurally invalid datagram.
    Codec(dns_proto::DecodeError),
    /// A message could not be serialised (see `dns_proto::EncodeError`).
    Encode(dns_proto::EncodeError),
    /// Socket bind, read, or write failure.
    Io(io::Error),
}

impl Error {
    /// The rcode a response carrying this error should report, per
    /// the rcode mapping table.
    pub fn rcode(&self) -> Rcode {
        match self {
            Error::NotFound => Rcode::NameError,
            Error::InvalidType => Rcode::NotImplemented,
            Error::InvalidInput(_) => Rcode::FormatError,
            Error::NilRecord | Error::Codec(_) | Error::Encode(_) | Error::Io(_) => {
                Rcode::ServerFailure
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Error::NotFound => write!(f, "no matching record"),
            Error::InvalidType => write!(f, "invalid record type"),
            Error::NilRecord => write!(f, "no record or name given"),
            Error::Codec(err) => write!(f, "codec error: {err}"),
            Error::Encode(err) => write!(f, "encode error: {err}"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidInput(err) => Some(err),
            Error::Codec(err) => Some(err),
            Error::Encode(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::NotFound | Error::InvalidType | Error::NilRecord => None,
        }
    }
}

impl From<dns_proto::ValidationError> for Error {
    fn from(err: dns_proto::ValidationError) -> Self {
        Error::InvalidInput(err)
    }
}

impl From<dns_proto::DecodeError> for Error {
    fn from(err: dns_proto::DecodeError) -> Self {
        Error::Codec(err)
    }
}

impl From<dns_proto::EncodeError> for Error {
    fn from(err: dns_proto::EncodeError) -> Self {
        Error::Encode(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
