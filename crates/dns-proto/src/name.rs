//! Domain names: length-prefixed label sequences, with compression-pointer
//! tolerant decoding and compression-free encoding.

use crate::buffer::{ConsumableBuffer, WritableBuffer};
use crate::error::{DecodeError, ValidationError};

/// A label's length octet must not exceed this.
pub const LABEL_MAX_LEN: usize = 63;
/// A fully-encoded domain name (length octets included) must not exceed
/// this many octets.
pub const DOMAIN_MAX_LEN: usize = 255;

/// The top two bits of a length octet that mark it as a compression
/// pointer rather than a literal label length.
const POINTER_PREFIX: u8 = 0b1100_0000;

/// A domain name, stored in both its wire-ready encoded form and as
/// individual labels for presentation and comparison. Case is preserved:
/// ASCII case-folding is explicitly out of scope for this server (see
/// the design notes on case sensitivity).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DomainName {
    pub octets: Vec<u8>,
    pub labels: Vec<Vec<u8>>,
}

impl DomainName {
    pub fn root() -> Self {
        DomainName {
            octets: vec![0],
            labels: vec![Vec::new()],
        }
    }

    pub fn is_root(&self) -> bool {
        self.octets == [0]
    }

    /// Parse a dotted-string presentation name (e.g. `"www.example.com"`
    /// or `"www.example.com."`) into labels, validating length limits.
    /// A single trailing dot is tolerated and skipped; an empty segment
    /// anywhere else is rejected.
    pub fn from_dotted_string(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if s == "." {
            return Ok(Self::root());
        }

        let stripped = s.strip_suffix('.').unwrap_or(s);
        let chunks: Vec<&str> = stripped.split('.').collect();
        let mut labels = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.is_empty() {
                return Err(ValidationError::EmptyName);
            }
            labels.push(chunk.as_bytes().to_vec());
        }
        Self::from_labels(labels)
    }

    /// Build a `DomainName` from an ordered list of non-empty labels.
    pub fn from_labels(labels: Vec<Vec<u8>>) -> Result<Self, ValidationError> {
        if labels.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let mut octets = Vec::with_capacity(DOMAIN_MAX_LEN);
        for label in &labels {
            let len: u8 = label
                .len()
                .try_into()
                .map_err(|_| ValidationError::LabelTooLong)?;
            if len as usize > LABEL_MAX_LEN {
                return Err(ValidationError::LabelTooLong);
            }
            octets.push(len);
            octets.extend_from_slice(label);
        }
        octets.push(0);

        if octets.len() > DOMAIN_MAX_LEN {
            return Err(ValidationError::NameTooLong);
        }

        Ok(DomainName { octets, labels })
    }

    /// Render back to dotted-string presentation form, without a
    /// trailing dot.
    pub fn to_dotted_string(&self) -> String {
        if self.is_root() {
            return ".".to_string();
        }
        self.labels
            .iter()
            .map(|label| String::from_utf8_lossy(label).into_owned())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        // Compression is never emitted: every name is written out in full.
        buffer.write_octets(&self.octets);
    }

    /// Parse a name starting at `buffer`'s current position. Follows at
    /// most one compression pointer per label run it encounters, and
    /// only ever to a strictly earlier offset in the datagram, which
    /// guarantees termination without a separate depth counter.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, DecodeError> {
        let mut octets = Vec::with_capacity(32);
        let mut labels = Vec::new();
        let start = buffer.position;

        loop {
            let size = buffer.next_u8().ok_or(DecodeError::DomainTooShort(id))?;

            if (size as usize) <= LABEL_MAX_LEN {
                octets.push(size);
                if size == 0 {
                    // Root name: no labels read yet, so this terminator
                    // *is* the name, matching `DomainName::root()`. For
                    // every other name the terminator carries no label
                    // of its own and must not be appended, or `labels`
                    // would never match what `from_labels` produces.
                    if labels.is_empty() {
                        labels.push(Vec::new());
                    }
                    break;
                }
                let label = buffer
                    .take(size as usize)
                    .ok_or(DecodeError::DomainTooShort(id))?;
                octets.extend_from_slice(label);
                labels.push(label.to_vec());

                if octets.len() > DOMAIN_MAX_LEN {
                    return Err(DecodeError::DomainTooLong(id));
                }
            } else if size & POINTER_PREFIX == POINTER_PREFIX {
                let hi = size & !POINTER_PREFIX;
                let lo = buffer.next_u8().ok_or(DecodeError::DomainTooShort(id))?;
                let ptr = usize::from(u16::from_be_bytes([hi, lo]));

                if ptr >= start {
                    return Err(DecodeError::DomainPointerInvalid(id));
                }

                let mut pointee = DomainName::deserialise(id, &mut buffer.at_offset(ptr))?;
                octets.append(&mut pointee.octets);
                // The root name's sentinel label (see above) must not
                // be spliced into the middle of a longer name: it only
                // means "terminate" there, not "append an empty label".
                if !(pointee.is_root() && !labels.is_empty()) {
                    labels.append(&mut pointee.labels);
                }
                break;
            } else {
                return Err(DecodeError::DomainLabelInvalid(id));
            }
        }

        if octets.len() > DOMAIN_MAX_LEN {
            return Err(DecodeError::DomainTooLong(id));
        }

        Ok(DomainName { octets, labels })
    }
}

impl std::fmt::Display for DomainName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_dotted_string())
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for DomainName {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_labels = u.int_in_range::<usize>(1..=6)?;
        let mut labels = Vec::with_capacity(num_labels);
        for _ in 0..num_labels {
            let label_len = u.int_in_range::<u8>(1..=20)?;
            let bytes = u.bytes(label_len.into())?;
            let cleaned: Vec<u8> = bytes
                .iter()
                .map(|b| {
                    let b = if b.is_ascii_graphic() { *b } else { b'x' };
                    if b == b'.' {
                        b'x'
                    } else {
                        b
                    }
                })
                .collect();
            labels.push(cleaned);
        }
        DomainName::from_labels(labels).map_err(|_| arbitrary::Error::IncorrectFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_simple_name() {
        let name = DomainName::from_dotted_string("www.example.com").unwrap();
        let mut buf = WritableBuffer::default();
        name.serialise(&mut buf);

        let mut cbuf = ConsumableBuffer::new(&buf.octets);
        let decoded = DomainName::deserialise(0, &mut cbuf).unwrap();
        assert_eq!(name, decoded);
        assert_eq!(decoded.to_dotted_string(), "www.example.com");
    }

    #[test]
    fn trailing_dot_is_tolerated() {
        let a = DomainName::from_dotted_string("zed.io").unwrap();
        let b = DomainName::from_dotted_string("zed.io.").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mid_string_empty_segment_is_rejected() {
        assert!(DomainName::from_dotted_string("zed..io").is_err());
    }

    #[test]
    fn label_over_63_bytes_is_rejected() {
        let label = "a".repeat(64);
        assert_eq!(
            DomainName::from_dotted_string(&label),
            Err(ValidationError::LabelTooLong)
        );
    }

    #[test]
    fn name_over_255_bytes_is_rejected() {
        let labels: Vec<Vec<u8>> = (0..30).map(|_| vec![b'a'; 8]).collect();
        assert_eq!(
            DomainName::from_labels(labels),
            Err(ValidationError::NameTooLong)
        );
    }

    #[test]
    fn forward_pointer_is_rejected() {
        // A pointer whose offset is >= where this name itself started.
        let bytes = [0xC0, 0x00];
        let mut cbuf = ConsumableBuffer::new(&bytes);
        assert_eq!(
            DomainName::deserialise(0, &mut cbuf),
            Err(DecodeError::DomainPointerInvalid(0))
        );
    }

    #[test]
    fn compression_pointer_resolves_backwards() {
        // "zed.io" at offset 0, then a pointer to it at offset 8.
        let target = DomainName::from_dotted_string("zed.io").unwrap();
        let mut buf = WritableBuffer::default();
        target.serialise(&mut buf);
        let pointer_offset = buf.index();
        buf.write_u8(0xC0);
        buf.write_u8(0x00);

        let mut cbuf = ConsumableBuffer::new(&buf.octets);
        cbuf.position = pointer_offset;
        let decoded = DomainName::deserialise(0, &mut cbuf).unwrap();
        assert_eq!(decoded, target);
    }
}
