use super::*;

#[test]
fn pixel_defaults_radius_when_absent() {
    let pixel = Pixel::new(1.0, 2.0, "#000000");
    assert!((pixel.radius_or_default() - DEFAULT_RADIUS).abs() < f64::EPSILON);

    let pixel = pixel.with_radius(3.5);
    assert!((pixel.radius_or_default() - 3.5).abs() < f64::EPSILON);
}

#[test]
fn pixel_validation_rejects_bad_domains() {
    assert!(Pixel::new(0.0, 0.0, "red").validate().is_ok());
    assert_eq!(Pixel::new(-1.0, 0.0, "red").validate(), Err("coordinates must be non-negative"));
    assert_eq!(Pixel::new(f64::NAN, 0.0, "red").validate(), Err("coordinates must be finite"));
    assert_eq!(Pixel::new(0.0, f64::INFINITY, "red").validate(), Err("coordinates must be finite"));
    assert_eq!(Pixel::new(0.0, 0.0, "  ").validate(), Err("color must not be empty"));
    assert_eq!(
        Pixel::new(0.0, 0.0, "red").with_radius(0.0).validate(),
        Err("radius must be a positive number")
    );
}

#[test]
fn validate_pixels_reports_first_bad_index() {
    let pixels = vec![Pixel::new(1.0, 1.0, "red"), Pixel::new(1.0, 1.0, ""), Pixel::new(-1.0, 1.0, "red")];
    let err = validate_pixels(TAG_APPEND_PIXELS, &pixels, true).expect_err("should fail");
    assert!(matches!(err, CodecError::InvalidPixel { index: 1, .. }));
}

#[test]
fn validate_pixels_empty_batch_depends_on_direction() {
    assert!(matches!(
        validate_pixels(TAG_APPEND_PIXELS, &[], true),
        Err(CodecError::EmptyBatch { tag: TAG_APPEND_PIXELS })
    ));
    assert!(validate_pixels(TAG_INIT, &[], false).is_ok());
}

#[test]
fn every_codec_error_maps_to_invalid_message() {
    let errors = [
        CodecError::NotAnObject,
        CodecError::MissingType,
        CodecError::UnknownType("NOPE".into()),
        CodecError::UnsupportedVersion(9),
        CodecError::InvalidKind(42),
    ];
    for err in &errors {
        assert_eq!(err.error_code(), CODE_INVALID_MESSAGE);
        assert!(!err.retryable());
    }
}

#[test]
fn error_from_carries_code_and_display() {
    let msg = ServerMessage::error_from(&CodecError::UnknownType("PAINT".into()));
    assert_eq!(
        msg,
        ServerMessage::Error { code: "INVALID_MESSAGE".into(), message: "unknown message type: PAINT".into() }
    );
    assert_eq!(msg.tag(), TAG_ERROR);
}

#[test]
fn tags_match_protocol_table() {
    assert_eq!(ClientMessage::AppendPixels(vec![]).tag(), "APPEND_PIXELS");
    assert_eq!(ClientMessage::Clear.tag(), "CLEAR");
    assert_eq!(ServerMessage::Init(vec![]).tag(), "INIT");
    assert_eq!(ServerMessage::NewPixels(vec![]).tag(), "NEW_PIXELS");
    assert_eq!(ServerMessage::Clear.tag(), "CLEAR");
}

#[test]
fn encoding_from_query() {
    assert_eq!(Encoding::from_query(None), Encoding::Json);
    assert_eq!(Encoding::from_query(Some("json")), Encoding::Json);
    assert_eq!(Encoding::from_query(Some("binary")), Encoding::Binary);
    assert_eq!(Encoding::from_query(Some("protobuf")), Encoding::Binary);
    assert_eq!(Encoding::from_query(Some("xml")), Encoding::Json);
}
