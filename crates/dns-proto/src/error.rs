//! Error types for the wire codec.
//!
//! These mirror the split the original resolver crate used: one enum for
//! encode-time failures (which only ever happen because a counter didn't
//! fit), one for decode-time failures (which carry the query ID so a
//! caller can still build an error response), and one for the validation
//! performed by the constructors in [`crate::record`].

use std::fmt;

/// Errors encountered while serialising a message to the wire format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EncodeError {
    /// A section counter (e.g. `ancount`) does not fit in the width the
    /// wire format allows for it.
    CounterTooLarge { counter: usize, bits: u32 },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::CounterTooLarge { counter, bits } => {
                write!(f, "'{counter}' cannot be converted to a u{bits}")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// Errors encountered while parsing a datagram. Every variant that can
/// occur after the first two octets have been read carries the query ID,
/// so that a caller can still send an error response back to the client.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DecodeError {
    /// The datagram is not even 2 octets long, so it doesn't contain a
    /// valid ID. No response can be sent for this one.
    CompletelyBusted,
    /// The header is missing one or more required fields.
    HeaderTooShort(u16),
    /// A question ends with an incomplete field.
    QuestionTooShort(u16),
    /// A resource record ends with an incomplete field.
    ResourceRecordTooShort(u16),
    /// A resource record's RDATA did not consume exactly `rdlength` octets.
    ResourceRecordInvalid(u16),
    /// A domain name is missing its terminating label.
    DomainTooShort(u16),
    /// A domain name is over 255 octets once fully expanded.
    DomainTooLong(u16),
    /// A compression pointer points at or after the name currently being
    /// parsed.
    DomainPointerInvalid(u16),
    /// A label length octet is neither a plain length nor a compression
    /// pointer prefix.
    DomainLabelInvalid(u16),
}

impl DecodeError {
    /// The query ID this error should be reported against, if any.
    pub fn id(self) -> Option<u16> {
        match self {
            DecodeError::CompletelyBusted => None,
            DecodeError::HeaderTooShort(id)
            | DecodeError::QuestionTooShort(id)
            | DecodeError::ResourceRecordTooShort(id)
            | DecodeError::ResourceRecordInvalid(id)
            | DecodeError::DomainTooShort(id)
            | DecodeError::DomainTooLong(id)
            | DecodeError::DomainPointerInvalid(id)
            | DecodeError::DomainLabelInvalid(id) => Some(id),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::CompletelyBusted => write!(f, "datagram too short to contain an ID"),
            DecodeError::HeaderTooShort(id) => write!(f, "[{id}] header is truncated"),
            DecodeError::QuestionTooShort(id) => write!(f, "[{id}] question is truncated"),
            DecodeError::ResourceRecordTooShort(id) => {
                write!(f, "[{id}] resource record is truncated")
            }
            DecodeError::ResourceRecordInvalid(id) => {
                write!(f, "[{id}] resource record rdlength does not match its rdata")
            }
            DecodeError::DomainTooShort(id) => write!(f, "[{id}] domain name is truncated"),
            DecodeError::DomainTooLong(id) => write!(f, "[{id}] domain name exceeds 255 octets"),
            DecodeError::DomainPointerInvalid(id) => {
                write!(f, "[{id}] compression pointer does not point backwards")
            }
            DecodeError::DomainLabelInvalid(id) => write!(f, "[{id}] invalid label length"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Errors raised by the validated record/name constructors.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ValidationError {
    /// An owner or target name was empty.
    EmptyName,
    /// A label exceeded 63 octets.
    LabelTooLong,
    /// A domain name exceeded 255 octets once encoded.
    NameTooLong,
    /// A TTL below the minimum of 5 seconds was supplied.
    TtlTooShort(u32),
    /// An `A`/`AAAA` record was constructed with an address of the wrong
    /// family.
    AddressFamilyMismatch,
    /// A `TXT` record was constructed with no text.
    EmptyText,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "name must not be empty"),
            ValidationError::LabelTooLong => write!(f, "label exceeds 63 octets"),
            ValidationError::NameTooLong => write!(f, "name exceeds 255 octets"),
            ValidationError::TtlTooShort(ttl) => {
                write!(f, "ttl of {ttl}s is below the minimum of 5s")
            }
            ValidationError::AddressFamilyMismatch => {
                write!(f, "address family does not match record type")
            }
            ValidationError::EmptyText => write!(f, "TXT record must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}
