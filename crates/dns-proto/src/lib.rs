//! Wire format codec and record types for an authoritative DNS server.
//!
//! This crate has no knowledge of sockets, stores, or dispatch: it only
//! knows how to turn [`message::Message`] values into bytes and back,
//! bit-exact to the subset of RFC 1035 this server implements.

pub mod buffer;
pub mod error;
pub mod message;
pub mod name;
pub mod record;

pub use error::{DecodeError, EncodeError, ValidationError};
pub use message::{Header, Message, Opcode, Question, Rcode};
pub use name::DomainName;
pub use record::{QueryClass, QueryType, RecordClass, RecordData, RecordType, ResourceRecord};
