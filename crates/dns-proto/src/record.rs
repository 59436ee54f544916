//! Record type/class tags and the resource record variants this server
//! serves, plus validated constructors for each.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::buffer::{ConsumableBuffer, WritableBuffer};
use crate::error::{DecodeError, ValidationError};
use crate::name::DomainName;

/// Minimum TTL this server will accept at construction time.
pub const MIN_TTL_SECONDS: u32 = 5;

/// The 16-bit type codes this server understands, plus a catch-all for
/// anything else so the decoder can still walk past records it doesn't
/// serve (e.g. an `OPT` pseudo-record from an EDNS(0)-aware client).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RecordType {
    A,
    CNAME,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    Unknown(u16),
}

impl RecordType {
    pub fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::CNAME => 5,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::Unknown(tag) => tag,
        }
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            5 => RecordType::CNAME,
            12 => RecordType::PTR,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            33 => RecordType::SRV,
            other => RecordType::Unknown(other),
        }
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> Self {
        value.code()
    }
}

/// A query type is a superset of record types: it additionally includes
/// `ANY` (255), which asks for every record at a name regardless of
/// type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum QueryType {
    Record(RecordType),
    Any,
}

impl From<u16> for QueryType {
    fn from(value: u16) -> Self {
        if value == 255 {
            QueryType::Any
        } else {
            QueryType::Record(RecordType::from(value))
        }
    }
}

impl From<QueryType> for u16 {
    fn from(value: QueryType) -> Self {
        match value {
            QueryType::Any => 255,
            QueryType::Record(rtype) => rtype.into(),
        }
    }
}

/// Only the `IN` (Internet) class is ever produced; `Unknown` exists so
/// a decoded message from an unusual client doesn't fail to parse.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RecordClass {
    IN,
    Unknown(u16),
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordClass::IN,
            other => RecordClass::Unknown(other),
        }
    }
}

impl From<RecordClass> for u16 {
    fn from(value: RecordClass) -> Self {
        match value {
            RecordClass::IN => 1,
            RecordClass::Unknown(tag) => tag,
        }
    }
}

/// As [`RecordClass`], but for the class field of a question.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum QueryClass {
    IN,
    Any,
    Unknown(u16),
}

impl From<u16> for QueryClass {
    fn from(value: u16) -> Self {
        match value {
            1 => QueryClass::IN,
            255 => QueryClass::Any,
            other => QueryClass::Unknown(other),
        }
    }
}

impl From<QueryClass> for u16 {
    fn from(value: QueryClass) -> Self {
        match value {
            QueryClass::IN => 1,
            QueryClass::Any => 255,
            QueryClass::Unknown(tag) => tag,
        }
    }
}

/// A record type together with its deserialised RDATA. `Unknown` is
/// decode-only: it is never produced by a validated constructor and
/// never stored.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RecordData {
    A { address: Ipv4Addr },
    AAAA { address: Ipv6Addr },
    CNAME { name: DomainName },
    PTR { name: DomainName },
    MX { preference: u16, exchange: DomainName },
    TXT { data: Vec<u8> },
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    },
    /// RDATA for a type this server doesn't serve, carried opaquely so
    /// the decoder can step over it.
    Unknown { rtype: u16, octets: Vec<u8> },
}

impl RecordData {
    pub fn rtype(&self) -> RecordType {
        match self {
            RecordData::A { .. } => RecordType::A,
            RecordData::AAAA { .. } => RecordType::AAAA,
            RecordData::CNAME { .. } => RecordType::CNAME,
            RecordData::PTR { .. } => RecordType::PTR,
            RecordData::MX { .. } => RecordType::MX,
            RecordData::TXT { .. } => RecordType::TXT,
            RecordData::SRV { .. } => RecordType::SRV,
            RecordData::Unknown { rtype, .. } => RecordType::Unknown(*rtype),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RecordData::Unknown { .. })
    }

    fn serialise(&self, buffer: &mut WritableBuffer) {
        match self {
            RecordData::A { address } => buffer.write_octets(&address.octets()),
            RecordData::AAAA { address } => buffer.write_octets(&address.octets()),
            RecordData::CNAME { name } | RecordData::PTR { name } => name.serialise(buffer),
            RecordData::MX {
                preference,
                exchange,
            } => {
                buffer.write_u16(*preference);
                exchange.serialise(buffer);
            }
            RecordData::TXT { data } => buffer.write_octets(data),
            RecordData::SRV {
                priority,
                weight,
                port,
                target,
            } => {
                buffer.write_u16(*priority);
                buffer.write_u16(*weight);
                buffer.write_u16(*port);
                target.serialise(buffer);
            }
            RecordData::Unknown { octets, .. } => buffer.write_octets(octets),
        }
    }

    fn deserialise(
        id: u16,
        rtype: RecordType,
        rdlength: u16,
        buffer: &mut ConsumableBuffer,
    ) -> Result<Self, DecodeError> {
        let raw = |buffer: &mut ConsumableBuffer| {
            buffer
                .take(rdlength as usize)
                .map(<[u8]>::to_vec)
                .ok_or(DecodeError::ResourceRecordTooShort(id))
        };

        Ok(match rtype {
            RecordType::A => RecordData::A {
                address: Ipv4Addr::from(
                    buffer
                        .next_u32()
                        .ok_or(DecodeError::ResourceRecordTooShort(id))?,
                ),
            },
            RecordType::AAAA => {
                let mut octets = [0u8; 16];
                for chunk in octets.chunks_mut(2) {
                    let word = buffer
                        .next_u16()
                        .ok_or(DecodeError::ResourceRecordTooShort(id))?;
                    chunk.copy_from_slice(&word.to_be_bytes());
                }
                RecordData::AAAA {
                    address: Ipv6Addr::from(octets),
                }
            }
            RecordType::CNAME => RecordData::CNAME {
                name: DomainName::deserialise(id, buffer)?,
            },
            RecordType::PTR => RecordData::PTR {
                name: DomainName::deserialise(id, buffer)?,
            },
            RecordType::MX => RecordData::MX {
                preference: buffer
                    .next_u16()
                    .ok_or(DecodeError::ResourceRecordTooShort(id))?,
                exchange: DomainName::deserialise(id, buffer)?,
            },
            RecordType::TXT => RecordData::TXT { data: raw(buffer)? },
            RecordType::SRV => RecordData::SRV {
                priority: buffer
                    .next_u16()
                    .ok_or(DecodeError::ResourceRecordTooShort(id))?,
                weight: buffer
                    .next_u16()
                    .ok_or(DecodeError::ResourceRecordTooShort(id))?,
                port: buffer
                    .next_u16()
                    .ok_or(DecodeError::ResourceRecordTooShort(id))?,
                target: DomainName::deserialise(id, buffer)?,
            },
            RecordType::Unknown(tag) => RecordData::Unknown {
                rtype: tag,
                octets: raw(buffer)?,
            },
        })
    }
}

/// A resource record: an owner name, its typed RDATA, a class, and a
/// TTL in seconds.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub data: RecordData,
    pub class: RecordClass,
    pub ttl: u32,
}

impl ResourceRecord {
    fn check_ttl(ttl: u32) -> Result<(), ValidationError> {
        if ttl < MIN_TTL_SECONDS {
            Err(ValidationError::TtlTooShort(ttl))
        } else {
            Ok(())
        }
    }

    pub fn a(name: DomainName, ttl: u32, address: Ipv4Addr) -> Result<Self, ValidationError> {
        Self::check_ttl(ttl)?;
        Ok(ResourceRecord {
            name,
            data: RecordData::A { address },
            class: RecordClass::IN,
            ttl,
        })
    }

    pub fn aaaa(name: DomainName, ttl: u32, address: Ipv6Addr) -> Result<Self, ValidationError> {
        Self::check_ttl(ttl)?;
        Ok(ResourceRecord {
            name,
            data: RecordData::AAAA { address },
            class: RecordClass::IN,
            ttl,
        })
    }

    pub fn cname(name: DomainName, ttl: u32, target: DomainName) -> Result<Self, ValidationError> {
        Self::check_ttl(ttl)?;
        Ok(ResourceRecord {
            name,
            data: RecordData::CNAME { name: target },
            class: RecordClass::IN,
            ttl,
        })
    }

    pub fn ptr(name: DomainName, ttl: u32, target: DomainName) -> Result<Self, ValidationError> {
        Self::check_ttl(ttl)?;
        Ok(ResourceRecord {
            name,
            data: RecordData::PTR { name: target },
            class: RecordClass::IN,
            ttl,
        })
    }

    pub fn mx(
        name: DomainName,
        ttl: u32,
        preference: u16,
        exchange: DomainName,
    ) -> Result<Self, ValidationError> {
        Self::check_ttl(ttl)?;
        Ok(ResourceRecord {
            name,
            data: RecordData::MX {
                preference,
                exchange,
            },
            class: RecordClass::IN,
            ttl,
        })
    }

    pub fn txt(name: DomainName, ttl: u32, data: Vec<u8>) -> Result<Self, ValidationError> {
        Self::check_ttl(ttl)?;
        if data.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        Ok(ResourceRecord {
            name,
            data: RecordData::TXT { data },
            class: RecordClass::IN,
            ttl,
        })
    }

    pub fn srv(
        name: DomainName,
        ttl: u32,
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    ) -> Result<Self, ValidationError> {
        Self::check_ttl(ttl)?;
        Ok(ResourceRecord {
            name,
            data: RecordData::SRV {
                priority,
                weight,
                port,
                target,
            },
            class: RecordClass::IN,
            ttl,
        })
    }

    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), crate::error::EncodeError> {
        self.name.serialise(buffer);
        buffer.write_u16(self.data.rtype().into());
        buffer.write_u16(self.class.into());
        buffer.write_u32(self.ttl);

        let rdlength_index = buffer.index();
        buffer.write_u16(0);

        self.data.serialise(buffer);

        // -2 to exclude the rdlength field itself from the count.
        let rdlength = crate::buffer::usize_to_u16(buffer.index() - rdlength_index - 2)?;
        let [hi, lo] = rdlength.to_be_bytes();
        buffer.octets[rdlength_index] = hi;
        buffer.octets[rdlength_index + 1] = lo;

        Ok(())
    }

    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, DecodeError> {
        let name = DomainName::deserialise(id, buffer)?;
        let rtype = RecordType::from(
            buffer
                .next_u16()
                .ok_or(DecodeError::ResourceRecordTooShort(id))?,
        );
        let class = RecordClass::from(
            buffer
                .next_u16()
                .ok_or(DecodeError::ResourceRecordTooShort(id))?,
        );
        let ttl = buffer
            .next_u32()
            .ok_or(DecodeError::ResourceRecordTooShort(id))?;
        let rdlength = buffer
            .next_u16()
            .ok_or(DecodeError::ResourceRecordTooShort(id))?;

        let rdata_start = buffer.position;
        let data = RecordData::deserialise(id, rtype, rdlength, buffer)?;
        let rdata_stop = buffer.position;

        if rdata_stop != rdata_start + rdlength as usize {
            return Err(DecodeError::ResourceRecordInvalid(id));
        }

        Ok(ResourceRecord {
            name,
            data,
            class,
            ttl,
        })
    }
}

/// Construct an `A`/`AAAA` record, rejecting an address that doesn't
/// match the record's address family. Exposed as free functions because
/// the mismatch check spans both constructors identically.
pub fn a_record_checked(
    name: DomainName,
    ttl: u32,
    address: std::net::IpAddr,
) -> Result<ResourceRecord, ValidationError> {
    match address {
        std::net::IpAddr::V4(addr) => ResourceRecord::a(name, ttl, addr),
        std::net::IpAddr::V6(_) => Err(ValidationError::AddressFamilyMismatch),
    }
}

pub fn aaaa_record_checked(
    name: DomainName,
    ttl: u32,
    address: std::net::IpAddr,
) -> Result<ResourceRecord, ValidationError> {
    match address {
        std::net::IpAddr::V6(addr) => ResourceRecord::aaaa(name, ttl, addr),
        std::net::IpAddr::V4(_) => Err(ValidationError::AddressFamilyMismatch),
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for RecordData {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let tag = u.int_in_range::<u8>(0..=6)?;
        Ok(match tag {
            0 => RecordData::A {
                address: Ipv4Addr::from(u.arbitrary::<u32>()?),
            },
            1 => RecordData::AAAA {
                address: Ipv6Addr::from(u.arbitrary::<u128>()?),
            },
            2 => RecordData::CNAME {
                name: DomainName::arbitrary(u)?,
            },
            3 => RecordData::PTR {
                name: DomainName::arbitrary(u)?,
            },
            4 => RecordData::MX {
                preference: u.arbitrary()?,
                exchange: DomainName::arbitrary(u)?,
            },
            5 => {
                let len = u.int_in_range::<usize>(1..=32)?;
                RecordData::TXT {
                    data: u.bytes(len)?.to_vec(),
                }
            }
            _ => RecordData::SRV {
                priority: u.arbitrary()?,
                weight: u.arbitrary()?,
                port: u.arbitrary()?,
                target: DomainName::arbitrary(u)?,
            },
        })
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for ResourceRecord {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(ResourceRecord {
            name: DomainName::arbitrary(u)?,
            data: RecordData::arbitrary(u)?,
            class: RecordClass::IN,
            ttl: u.int_in_range(MIN_TTL_SECONDS..=3_600_000)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_below_minimum_is_rejected() {
        let name = DomainName::from_dotted_string("zed.io").unwrap();
        assert_eq!(
            ResourceRecord::a(name, 4, Ipv4Addr::new(127, 0, 0, 1)),
            Err(ValidationError::TtlTooShort(4))
        );
    }

    #[test]
    fn address_family_mismatch_is_rejected() {
        let name = DomainName::from_dotted_string("zed.io").unwrap();
        let v6: std::net::IpAddr = "::1".parse().unwrap();
        assert_eq!(
            a_record_checked(name, 10, v6),
            Err(ValidationError::AddressFamilyMismatch)
        );
    }

    #[test]
    fn empty_txt_is_rejected() {
        let name = DomainName::from_dotted_string("zed.io").unwrap();
        assert_eq!(
            ResourceRecord::txt(name, 10, Vec::new()),
            Err(ValidationError::EmptyText)
        );
    }

    #[test]
    fn a_record_round_trips_with_exact_rdlength() {
        let name = DomainName::from_dotted_string("zed.io").unwrap();
        let rr = ResourceRecord::a(name, 10, Ipv4Addr::new(127, 0, 0, 1)).unwrap();

        let mut buf = WritableBuffer::default();
        rr.serialise(&mut buf).unwrap();

        let expected = vec![
            3, b'z', b'e', b'd', 2, b'i', b'o', 0, // name
            0, 1, // type A
            0, 1, // class IN
            0, 0, 0, 10, // ttl
            0, 4, // rdlength
            127, 0, 0, 1, // rdata
        ];
        assert_eq!(buf.octets, expected);

        let mut cbuf = ConsumableBuffer::new(&buf.octets);
        let decoded = ResourceRecord::deserialise(0, &mut cbuf).unwrap();
        assert_eq!(decoded, rr);
    }

    #[test]
    fn srv_record_matches_reference_rdata_layout() {
        let name = DomainName::from_dotted_string("_phonebook._tcp.zed.io").unwrap();
        let target = DomainName::from_dotted_string("zed.io").unwrap();
        let rr = ResourceRecord::srv(name, 10, 10, 5, 8053, target).unwrap();

        let mut buf = WritableBuffer::default();
        rr.serialise(&mut buf).unwrap();

        // priority=10, weight=5, port=8053 (0x1F75), then the target name.
        let rdata_start = buf.octets.len() - 14;
        assert_eq!(
            &buf.octets[rdata_start..],
            &[0, 10, 0, 5, 0x1f, 0x75, 3, b'z', b'e', b'd', 2, b'i', b'o', 0]
        );
    }

    #[test]
    fn unknown_type_round_trips_opaquely() {
        let name = DomainName::from_dotted_string("zed.io").unwrap();
        let mut buf = WritableBuffer::default();
        name.serialise(&mut buf);
        buf.write_u16(41); // OPT
        buf.write_u16(1);
        buf.write_u32(0);
        buf.write_u16(2);
        buf.write_octets(&[0xAB, 0xCD]);

        let mut cbuf = ConsumableBuffer::new(&buf.octets);
        let decoded = ResourceRecord::deserialise(0, &mut cbuf).unwrap();
        assert!(decoded.data.is_unknown());
        assert_eq!(decoded.data.rtype(), RecordType::Unknown(41));
    }
}
