use super::*;

fn sample_pixels() -> Vec<Pixel> {
    vec![Pixel::new(1.0, 2.0, "#123456"), Pixel::new(30.5, 40.25, "red").with_radius(4.0)]
}

#[test]
fn wire_kind_numbers_are_stable() {
    assert_eq!(WireKind::Unspecified as i32, 0);
    assert_eq!(WireKind::Init as i32, 1);
    assert_eq!(WireKind::AppendPixels as i32, 2);
    assert_eq!(WireKind::NewPixels as i32, 3);
    assert_eq!(WireKind::Clear as i32, 4);
    assert_eq!(WireKind::Error as i32, 5);
}

#[test]
fn server_messages_survive_binary_transport() {
    let messages = [
        ServerMessage::Init(sample_pixels()),
        ServerMessage::NewPixels(sample_pixels()),
        ServerMessage::Clear,
        ServerMessage::Error { code: "INVALID_MESSAGE".into(), message: "nope".into() },
    ];
    for message in messages {
        let bytes = encode_server_binary(&message);
        assert_eq!(decode_server_binary(&bytes).expect("decode"), message);
    }
}

#[test]
fn client_append_survives_binary_transport() {
    let message = ClientMessage::AppendPixels(sample_pixels());
    let bytes = encode_client_binary(&message);
    assert_eq!(decode_client_binary(&bytes).expect("decode"), message);
}

#[test]
fn client_decoder_rejects_server_kinds() {
    let bytes = encode_server_binary(&ServerMessage::Init(sample_pixels()));
    let err = decode_client_binary(&bytes).expect_err("INIT is server-only");
    assert!(matches!(err, CodecError::InvalidKind(1)));
}

#[test]
fn client_decoder_rejects_empty_append() {
    let bytes = encode_client_binary(&ClientMessage::AppendPixels(vec![]));
    let err = decode_client_binary(&bytes).expect_err("empty batch");
    assert!(matches!(err, CodecError::EmptyBatch { .. }));
}

#[test]
fn malformed_bytes_are_rejected() {
    let err = decode_client_binary(&[0xff, 0x00, 0x01]).expect_err("bytes should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn unknown_kind_is_rejected() {
    let wire = WireMessage { version: PROTOCOL_VERSION, kind: 77, pixels: vec![], error_code: None, error_message: None };
    let bytes = to_bytes(&wire);
    assert!(matches!(decode_server_binary(&bytes), Err(CodecError::InvalidKind(77))));
}

#[test]
fn foreign_version_is_rejected() {
    let mut wire = wire(WireKind::Clear, &[]);
    wire.version = 9;
    let bytes = to_bytes(&wire);
    assert!(matches!(decode_client_binary(&bytes), Err(CodecError::UnsupportedVersion(9))));
}

#[test]
fn unset_version_is_accepted() {
    let mut wire = wire(WireKind::Clear, &[]);
    wire.version = 0;
    let bytes = to_bytes(&wire);
    assert_eq!(decode_client_binary(&bytes).expect("decode"), ClientMessage::Clear);
}

#[test]
fn invalid_pixels_in_snapshot_are_rejected() {
    let bytes = encode_server_binary(&ServerMessage::Init(vec![Pixel::new(-1.0, 0.0, "red")]));
    let err = decode_server_binary(&bytes).expect_err("negative x");
    assert!(matches!(err, CodecError::InvalidPixel { index: 0, .. }));
}
