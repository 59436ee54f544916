//! The 12-byte header, the question section, and the top-level
//! `Message` container that ties header/question/answer/authority/
//! additional sections together.

use crate::buffer::{usize_to_u16, ConsumableBuffer, WritableBuffer};
use crate::error::{DecodeError, EncodeError};
use crate::name::DomainName;
use crate::record::{QueryClass, QueryType, RecordClass, ResourceRecord};

const HEADER_MASK_QR: u8 = 0b1000_0000;
const HEADER_MASK_OPCODE: u8 = 0b0111_1000;
const HEADER_OFFSET_OPCODE: u8 = 3;
const HEADER_MASK_AA: u8 = 0b0000_0100;
const HEADER_MASK_TC: u8 = 0b0000_0010;
const HEADER_MASK_RD: u8 = 0b0000_0001;
const HEADER_MASK_RA: u8 = 0b1000_0000;
const HEADER_MASK_RCODE: u8 = 0b0000_1111;

/// The four-bit opcode field. Only `Standard` is ever produced by this
/// server; the others exist so a decoded message from an unusual
/// client still round-trips.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Opcode {
    Standard,
    Inverse,
    Status,
    Unknown(u8),
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        match value {
            0 => Opcode::Standard,
            1 => Opcode::Inverse,
            2 => Opcode::Status,
            other => Opcode::Unknown(other),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        match value {
            Opcode::Standard => 0,
            Opcode::Inverse => 1,
            Opcode::Status => 2,
            Opcode::Unknown(tag) => tag,
        }
    }
}

/// The four-bit response code. See the glossary for the meaning of
/// each value; `Unknown` exists only for round-tripping decoded
/// messages that carry a reserved value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Rcode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Unknown(u8),
}

impl Rcode {
    pub fn code(self) -> u8 {
        match self {
            Rcode::NoError => 0,
            Rcode::FormatError => 1,
            Rcode::ServerFailure => 2,
            Rcode::NameError => 3,
            Rcode::NotImplemented => 4,
            Rcode::Refused => 5,
            Rcode::Unknown(tag) => tag,
        }
    }
}

impl From<u8> for Rcode {
    fn from(value: u8) -> Self {
        match value {
            0 => Rcode::NoError,
            1 => Rcode::FormatError,
            2 => Rcode::ServerFailure,
            3 => Rcode::NameError,
            4 => Rcode::NotImplemented,
            5 => Rcode::Refused,
            other => Rcode::Unknown(other),
        }
    }
}

impl From<Rcode> for u8 {
    fn from(value: Rcode) -> Self {
        value.code()
    }
}

/// The 12-byte message header, minus the section counts (which are
/// derived from the sections themselves rather than authored, just
/// like a record's `rdlength`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Header {
    pub id: u16,
    pub is_response: bool,
    pub opcode: Opcode,
    pub is_authoritative: bool,
    pub is_truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub rcode: Rcode,
}

impl Header {
    fn serialise(self, buffer: &mut WritableBuffer) {
        let flag_qr = if self.is_response { HEADER_MASK_QR } else { 0 };
        let field_opcode = HEADER_MASK_OPCODE & (u8::from(self.opcode) << HEADER_OFFSET_OPCODE);
        let flag_aa = if self.is_authoritative {
            HEADER_MASK_AA
        } else {
            0
        };
        let flag_tc = if self.is_truncated { HEADER_MASK_TC } else { 0 };
        let flag_rd = if self.recursion_desired {
            HEADER_MASK_RD
        } else {
            0
        };
        let flag_ra = if self.recursion_available {
            HEADER_MASK_RA
        } else {
            0
        };
        let field_rcode = HEADER_MASK_RCODE & u8::from(self.rcode);

        buffer.write_u16(self.id);
        buffer.write_u8(flag_qr | field_opcode | flag_aa | flag_tc | flag_rd);
        buffer.write_u8(flag_ra | field_rcode);
    }

    fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, DecodeError> {
        let id = buffer.next_u16().ok_or(DecodeError::CompletelyBusted)?;
        let octet2 = buffer.next_u8().ok_or(DecodeError::HeaderTooShort(id))?;
        let octet3 = buffer.next_u8().ok_or(DecodeError::HeaderTooShort(id))?;

        Ok(Header {
            id,
            is_response: octet2 & HEADER_MASK_QR != 0,
            opcode: Opcode::from((octet2 & HEADER_MASK_OPCODE) >> HEADER_OFFSET_OPCODE),
            is_authoritative: octet2 & HEADER_MASK_AA != 0,
            is_truncated: octet2 & HEADER_MASK_TC != 0,
            recursion_desired: octet2 & HEADER_MASK_RD != 0,
            recursion_available: octet3 & HEADER_MASK_RA != 0,
            rcode: Rcode::from(octet3 & HEADER_MASK_RCODE),
        })
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Header {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Header {
            id: u.arbitrary()?,
            is_response: u.arbitrary()?,
            opcode: Opcode::from(u.int_in_range::<u8>(0..=2)?),
            is_authoritative: u.arbitrary()?,
            is_truncated: u.arbitrary()?,
            recursion_desired: u.arbitrary()?,
            recursion_available: u.arbitrary()?,
            rcode: Rcode::from(u.int_in_range::<u8>(0..=5)?),
        })
    }
}

/// A single `(name, qtype, qclass)` triple from the question section.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Question {
    pub name: DomainName,
    pub qtype: QueryType,
    pub qclass: QueryClass,
}

impl Question {
    fn serialise(&self, buffer: &mut WritableBuffer) {
        self.name.serialise(buffer);
        buffer.write_u16(self.qtype.into());
        buffer.write_u16(self.qclass.into());
    }

    fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, DecodeError> {
        let name = DomainName::deserialise(id, buffer)?;
        let qtype = QueryType::from(
            buffer
                .next_u16()
                .ok_or(DecodeError::QuestionTooShort(id))?,
        );
        let qclass = QueryClass::from(
            buffer
                .next_u16()
                .ok_or(DecodeError::QuestionTooShort(id))?,
        );
        Ok(Question {
            name,
            qtype,
            qclass,
        })
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Question {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        const CODES: [u16; 8] = [1, 5, 12, 15, 16, 28, 33, 255];
        let code = *u.choose(&CODES)?;
        Ok(Question {
            name: DomainName::arbitrary(u)?,
            qtype: QueryType::from(code),
            qclass: QueryClass::IN,
        })
    }
}

/// A full DNS message: header plus the four sections. Section counts
/// are never carried as fields of this type (to avoid them getting out
/// of sync with the sections themselves); they are computed on
/// serialise and consumed (but not stored) on deserialise.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// Build the skeleton of a response to `self`: same id and opcode,
    /// `RD` echoed, `QR`/`AA` set, everything else left for the caller
    /// to fill in. Matches the dispatcher's response header rules
    /// (ANCOUNT etc. follow from the sections, not from this struct).
    pub fn make_response(&self) -> Self {
        Message {
            header: Header {
                id: self.header.id,
                is_response: true,
                opcode: self.header.opcode,
                is_authoritative: true,
                is_truncated: false,
                recursion_desired: self.header.recursion_desired,
                recursion_available: false,
                rcode: Rcode::NoError,
            },
            questions: self.questions.clone(),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn to_octets(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buffer = WritableBuffer::default();
        self.serialise(&mut buffer)?;
        Ok(buffer.octets)
    }

    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), EncodeError> {
        let qdcount = usize_to_u16(self.questions.len())?;
        let ancount = usize_to_u16(self.answers.len())?;
        let nscount = usize_to_u16(self.authority.len())?;
        let arcount = usize_to_u16(self.additional.len())?;

        self.header.serialise(buffer);
        buffer.write_u16(qdcount);
        buffer.write_u16(ancount);
        buffer.write_u16(nscount);
        buffer.write_u16(arcount);

        for question in &self.questions {
            question.serialise(buffer);
        }
        for rr in &self.answers {
            rr.serialise(buffer)?;
        }
        for rr in &self.authority {
            rr.serialise(buffer)?;
        }
        for rr in &self.additional {
            rr.serialise(buffer)?;
        }

        Ok(())
    }

    pub fn from_octets(octets: &[u8]) -> Result<Self, DecodeError> {
        let mut buffer = ConsumableBuffer::new(octets);
        Self::deserialise(&mut buffer)
    }

    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, DecodeError> {
        let header = Header::deserialise(buffer)?;
        let id = header.id;

        let qdcount = buffer.next_u16().ok_or(DecodeError::HeaderTooShort(id))?;
        let ancount = buffer.next_u16().ok_or(DecodeError::HeaderTooShort(id))?;
        let nscount = buffer.next_u16().ok_or(DecodeError::HeaderTooShort(id))?;
        let arcount = buffer.next_u16().ok_or(DecodeError::HeaderTooShort(id))?;

        let mut questions = Vec::with_capacity(qdcount as usize);
        for _ in 0..qdcount {
            questions.push(Question::deserialise(id, buffer)?);
        }

        let mut answers = Vec::with_capacity(ancount as usize);
        for _ in 0..ancount {
            answers.push(ResourceRecord::deserialise(id, buffer)?);
        }

        let mut authority = Vec::with_capacity(nscount as usize);
        for _ in 0..nscount {
            authority.push(ResourceRecord::deserialise(id, buffer)?);
        }

        let mut additional = Vec::with_capacity(arcount as usize);
        for _ in 0..arcount {
            additional.push(ResourceRecord::deserialise(id, buffer)?);
        }

        Ok(Message {
            header,
            questions,
            answers,
            authority,
            additional,
        })
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Message {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_questions = u.int_in_range::<usize>(0..=3)?;
        let num_answers = u.int_in_range::<usize>(0..=3)?;

        let mut questions = Vec::with_capacity(num_questions);
        for _ in 0..num_questions {
            questions.push(Question::arbitrary(u)?);
        }
        let mut answers = Vec::with_capacity(num_answers);
        for _ in 0..num_answers {
            answers.push(ResourceRecord::arbitrary(u)?);
        }

        Ok(Message {
            header: Header::arbitrary(u)?,
            questions,
            answers,
            authority: Vec::new(),
            additional: Vec::new(),
        })
    }
}
