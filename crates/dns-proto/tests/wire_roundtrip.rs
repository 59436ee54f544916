//! End-to-end wire round-trip checks and the spec's worked examples
//! (S1-S4), exercised against the public `dns_proto` API rather than
//! its internals.

use std::net::{Ipv4Addr, Ipv6Addr};

use dns_proto::{
    DomainName, Header, Message, Opcode, QueryClass, QueryType, Question, Rcode, RecordType,
    ResourceRecord,
};

fn domain(s: &str) -> DomainName {
    DomainName::from_dotted_string(s).unwrap()
}

#[test]
fn s1_a_record_serialises_to_expected_bytes() {
    let rr = ResourceRecord::a(domain("zed.io"), 10, Ipv4Addr::new(127, 0, 0, 1)).unwrap();
    let mut buffer = dns_proto::buffer::WritableBuffer::default();
    rr.serialise(&mut buffer).unwrap();

    let expected = [
        0x03, 0x7a, 0x65, 0x64, 0x02, 0x69, 0x6f, 0x00, // zed.io.
        0x00, 0x01, // type A
        0x00, 0x01, // class IN
        0x00, 0x00, 0x00, 0x0a, // ttl 10
        0x00, 0x04, // rdlength
        0x7f, 0x00, 0x00, 0x01, // 127.0.0.1
    ];
    assert_eq!(buffer.octets, expected);
}

#[test]
fn s2_subdomain_aaaa_record() {
    let rr = ResourceRecord::aaaa(
        domain("app.production.zed.io"),
        10,
        Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1),
    )
    .unwrap();
    let mut buffer = dns_proto::buffer::WritableBuffer::default();
    rr.serialise(&mut buffer).unwrap();

    assert_eq!(buffer.octets[22], 0x00); // name terminator at byte 22 (23rd byte)
    assert_eq!(
        &buffer.octets[23..33],
        &[0x00, 0x1c, 0x00, 0x01, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x10]
    );
    let rdata = &buffer.octets[33..49];
    let mut expected_rdata = [0u8; 16];
    expected_rdata[15] = 1;
    assert_eq!(rdata, expected_rdata);
}

#[test]
fn s3_srv_record_rdata_layout() {
    let rr = ResourceRecord::srv(
        domain("_phonebook._tcp.zed.io"),
        10,
        10,
        5,
        8053,
        domain("zed.io"),
    )
    .unwrap();
    let mut buffer = dns_proto::buffer::WritableBuffer::default();
    rr.serialise(&mut buffer).unwrap();

    let rdata_start = buffer.octets.len() - 14;
    assert_eq!(
        &buffer.octets[rdata_start..],
        &[0x00, 0x0a, 0x00, 0x05, 0x1f, 0x75, 0x03, b'z', b'e', b'd', 0x02, b'i', b'o', 0x00]
    );
    assert_eq!(
        &buffer.octets[rdata_start - 2..rdata_start],
        &[0x00, 0x0e]
    );
}

#[test]
fn s4_header_round_trip() {
    let header = Header {
        id: 1234,
        is_response: true,
        opcode: Opcode::Standard,
        is_authoritative: true,
        is_truncated: false,
        recursion_desired: true,
        recursion_available: false,
        rcode: Rcode::NoError,
    };
    let message = Message {
        header,
        questions: vec![Question {
            name: domain("zed.io"),
            qtype: QueryType::Record(RecordType::A),
            qclass: QueryClass::IN,
        }],
        answers: vec![
            ResourceRecord::a(domain("zed.io"), 10, Ipv4Addr::new(1, 1, 1, 1)).unwrap(),
            ResourceRecord::a(domain("zed.io"), 10, Ipv4Addr::new(1, 1, 1, 2)).unwrap(),
            ResourceRecord::a(domain("zed.io"), 10, Ipv4Addr::new(1, 1, 1, 3)).unwrap(),
        ],
        authority: Vec::new(),
        additional: vec![
            ResourceRecord::a(domain("zed.io"), 10, Ipv4Addr::new(1, 1, 1, 4)).unwrap(),
        ],
    };

    let octets = message.to_octets().unwrap();
    assert_eq!(&octets[0..2], [0x04, 0xd2]);
    assert_eq!(octets[2], 0x85);
    assert_eq!(octets[3], 0x00);
    assert_eq!(&octets[4..12], [0x00, 0x01, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);

    let decoded = Message::from_octets(&octets).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn arbitrary_messages_round_trip() {
    use arbitrary::{Arbitrary, Unstructured};

    let seeds: &[&[u8]] = &[
        &[0u8; 64],
        &[0xffu8; 64],
        b"the quick brown fox jumps over the lazy dog, many times over",
    ];

    for seed in seeds {
        let mut u = Unstructured::new(seed);
        if let Ok(message) = Message::arbitrary(&mut u) {
            let octets = message.to_octets().unwrap();
            let decoded = Message::from_octets(&octets).unwrap();
            assert_eq!(decoded, message);
        }
    }
}

#[test]
fn decoder_never_panics_on_arbitrary_bytes() {
    for len in 0..40 {
        let bytes = vec![0x41u8; len];
        let _ = Message::from_octets(&bytes);
    }
    let _ = Message::from_octets(&[0xc0, 0xc0, 0xc0, 0xc0]);
}
