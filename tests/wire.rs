//! Known-answer tests against literal wire bytes.

use bytes::Bytes;
use snmp2c::pdu::{Pdu, PduType};
use snmp2c::{Error, ErrorStatus, Message, Oid, Value, oid};

/// .1.3.6.1.2.1.1.1.0 is the canonical 8-byte OID example: tag 06,
/// length 08, payload 2B (1*40+3) then the remaining arcs.
#[test]
fn sys_descr_oid_bytes() {
    let oid = Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
    let content = oid.to_ber();
    assert_eq!(&content[..], &[0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00]);

    // Full TLV via a varbind-style encode.
    let mut buf = snmp2c::ber::EncodeBuf::new();
    buf.push_oid(&oid);
    assert_eq!(
        &buf.finish()[..],
        &[0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00]
    );

    assert_eq!(
        Oid::from_ber(&[0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00]).unwrap(),
        oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
    );
}

/// A Get for .1.3.6.1.2.1.1.5.0, community "public", request-id 1: outer
/// SEQUENCE, version 1, community octets, then the context-tag-0 PDU.
#[test]
fn get_request_message_bytes() {
    let message = Message::new(
        "public",
        Pdu::get_request(1, &[oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)]),
    );
    let bytes = message.encode();

    // Header structure down to the PDU.
    assert_eq!(
        &bytes[..14],
        &[
            0x30, 0x26, // SEQUENCE
            0x02, 0x01, 0x01, // version = 1
            0x04, 0x06, 0x70, 0x75, 0x62, 0x6C, 0x69, 0x63, // "public"
            0xA0, // GetRequest
        ]
    );
    // PDU header: request-id 1, error-status 0, error-index 0.
    assert_eq!(
        &bytes[15..24],
        &[0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00]
    );

    let decoded = Message::decode(bytes).unwrap();
    assert_eq!(decoded.pdu.pdu_type, PduType::GetRequest);
    assert_eq!(decoded.pdu.request_id, 1);
    assert_eq!(decoded.pdu.varbinds.len(), 1);
    assert_eq!(decoded.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0));
    assert_eq!(decoded.pdu.varbinds[0].value, Value::Null);
}

/// An agent reply with error-status 2 / error-index 1 decodes to the
/// noSuchName kind with the index and offending OID preserved.
#[test]
fn error_status_reply_maps_to_no_such_name() {
    let reply = Message::new(
        "public",
        Pdu {
            pdu_type: PduType::Response,
            request_id: 7,
            error_status: 2,
            error_index: 1,
            varbinds: vec![snmp2c::VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 9, 9))],
        },
    );

    let decoded = Message::decode(reply.encode()).unwrap();
    assert!(decoded.pdu.is_error());
    assert_eq!(decoded.pdu.error_status(), ErrorStatus::NoSuchName);
    assert_eq!(decoded.pdu.error_index, 1);
}

#[test]
fn all_value_types_in_one_message_roundtrip() {
    let varbinds = vec![
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 1), Value::Integer(-42)),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 2), Value::from("text")),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 3), Value::Null),
        snmp2c::VarBind::new(
            oid!(1, 3, 6, 1, 9, 4),
            Value::ObjectIdentifier(oid!(2, 999, 1)),
        ),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 5), Value::IpAddress([10, 0, 0, 1])),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 6), Value::Counter32(u32::MAX)),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 7), Value::Gauge32(500)),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 8), Value::TimeTicks(8640000)),
        snmp2c::VarBind::new(
            oid!(1, 3, 6, 1, 9, 9),
            Value::Opaque(Bytes::from_static(&[1, 2, 3])),
        ),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 10), Value::Counter64(u64::MAX)),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 11), Value::NoSuchObject),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 12), Value::NoSuchInstance),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 13), Value::EndOfMibView),
        snmp2c::VarBind::new(oid!(1, 3, 6, 1, 9, 14), Value::Boolean(true)),
    ];
    let message = Message::new("communities can be anything", Pdu::trap(9, varbinds));
    assert_eq!(Message::decode(message.encode()).unwrap(), message);
}

/// A long varbind list pushes the outer lengths into long form.
#[test]
fn long_form_lengths_roundtrip() {
    let varbinds: Vec<_> = (0..60)
        .map(|i| snmp2c::VarBind::new(oid!(1, 3, 6, 1, 4, 1, 4242, 1, i), Value::Integer(i as i64)))
        .collect();
    let message = Message::new("public", Pdu::trap(1, varbinds));
    let bytes = message.encode();
    assert!(bytes.len() > 300);
    assert_eq!(bytes[1], 0x82, "outer length should use two octets");
    assert_eq!(Message::decode(bytes).unwrap(), message);
}

#[test]
fn unsupported_value_tag_fails_decode() {
    // A hand-built reply whose varbind value carries APPLICATION 5 (a gap
    // in the SMI table).
    let bytes: &[u8] = &[
        0x30, 0x20, //
        0x02, 0x01, 0x01, // version
        0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', // community
        0xA2, 0x13, // Response
        0x02, 0x01, 0x01, // request-id
        0x02, 0x01, 0x00, // error-status
        0x02, 0x01, 0x00, // error-index
        0x30, 0x08, // varbinds
        0x30, 0x06, // varbind
        0x06, 0x01, 0x2B, // OID 1.3
        0x45, 0x01, 0x00, // APPLICATION 5
    ];
    assert!(matches!(
        Message::decode(Bytes::copy_from_slice(bytes)).unwrap_err(),
        Error::UnsupportedValueType { tag: 0x45 }
    ));
}

#[test]
fn malformed_reports_offset() {
    // Truncate a valid message mid-OID and check the offset lands inside.
    let message = Message::new("public", Pdu::get_request(1, &[oid!(1, 3, 6, 1, 2, 1)]));
    let bytes = message.encode();
    let cut = bytes.slice(..bytes.len() - 2);
    match Message::decode(cut).unwrap_err() {
        Error::Malformed { offset, .. } => assert!(offset > 0),
        other => panic!("expected Malformed, got {other:?}"),
    }
}
