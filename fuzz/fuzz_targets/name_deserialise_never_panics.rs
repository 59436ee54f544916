#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_proto::buffer::ConsumableBuffer;
use dns_proto::DomainName;

// Domain name decoding follows compression pointers back into the
// buffer it was handed; this exists to confirm arbitrary pointer
// chains never cause a panic or an infinite loop.
fuzz_target!(|data: &[u8]| {
    let mut buffer = ConsumableBuffer::new(data);
    let _ = DomainName::deserialise(0, &mut buffer);
});
