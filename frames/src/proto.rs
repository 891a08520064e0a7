//! Protobuf binary codec.
//!
//! Carries the same messages as the JSON codec over binary WebSocket frames.
//! A single `WireMessage` shape serves both directions; `kind` selects the
//! variant and decoders reject kinds that are not valid for their direction.

use prost::Message;

use crate::{ClientMessage, CodecError, PROTOCOL_VERSION, Pixel, ServerMessage, TAG_APPEND_PIXELS, validate_pixels};

#[derive(Clone, PartialEq, Message)]
struct WireMessage {
    #[prost(uint32, tag = "1")]
    version: u32,
    #[prost(enumeration = "WireKind", tag = "2")]
    kind: i32,
    #[prost(message, repeated, tag = "3")]
    pixels: Vec<WirePixel>,
    #[prost(string, optional, tag = "4")]
    error_code: Option<String>,
    #[prost(string, optional, tag = "5")]
    error_message: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
struct WirePixel {
    #[prost(double, tag = "1")]
    x: f64,
    #[prost(double, tag = "2")]
    y: f64,
    #[prost(string, tag = "3")]
    color: String,
    #[prost(double, optional, tag = "4")]
    radius: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireKind {
    Unspecified = 0,
    Init = 1,
    AppendPixels = 2,
    NewPixels = 3,
    Clear = 4,
    Error = 5,
}

// =============================================================================
// ENCODE
// =============================================================================

/// Encode a server message into protobuf bytes.
#[must_use]
pub fn encode_server_binary(message: &ServerMessage) -> Vec<u8> {
    let wire = match message {
        ServerMessage::Init(pixels) => wire(WireKind::Init, pixels),
        ServerMessage::NewPixels(pixels) => wire(WireKind::NewPixels, pixels),
        ServerMessage::Clear => wire(WireKind::Clear, &[]),
        ServerMessage::Error { code, message } => WireMessage {
            error_code: Some(code.clone()),
            error_message: Some(message.clone()),
            ..wire(WireKind::Error, &[])
        },
    };
    to_bytes(&wire)
}

/// Encode a client message into protobuf bytes.
#[must_use]
pub fn encode_client_binary(message: &ClientMessage) -> Vec<u8> {
    let wire = match message {
        ClientMessage::AppendPixels(pixels) => wire(WireKind::AppendPixels, pixels),
        ClientMessage::Clear => wire(WireKind::Clear, &[]),
    };
    to_bytes(&wire)
}

fn wire(kind: WireKind, pixels: &[Pixel]) -> WireMessage {
    WireMessage {
        version: PROTOCOL_VERSION,
        kind: kind as i32,
        pixels: pixels.iter().map(pixel_to_wire).collect(),
        error_code: None,
        error_message: None,
    }
}

fn to_bytes(wire: &WireMessage) -> Vec<u8> {
    let mut out = Vec::with_capacity(wire.encoded_len());
    // Encoding into a growable Vec cannot run out of buffer space.
    wire.encode(&mut out).unwrap_or_default();
    out
}

fn pixel_to_wire(pixel: &Pixel) -> WirePixel {
    WirePixel { x: pixel.x, y: pixel.y, color: pixel.color.clone(), radius: pixel.radius }
}

fn pixel_from_wire(wire: WirePixel) -> Pixel {
    Pixel { x: wire.x, y: wire.y, color: wire.color, radius: wire.radius }
}

// =============================================================================
// DECODE
// =============================================================================

/// Decode protobuf bytes sent by a client.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes,
/// [`CodecError::UnsupportedVersion`] for a foreign version,
/// [`CodecError::InvalidKind`] for server-only or unknown kinds, and pixel
/// validation errors for bad batches.
pub fn decode_client_binary(bytes: &[u8]) -> Result<ClientMessage, CodecError> {
    let (kind, pixels, _) = decode_wire(bytes)?;
    match kind {
        WireKind::AppendPixels => {
            validate_pixels(TAG_APPEND_PIXELS, &pixels, true)?;
            Ok(ClientMessage::AppendPixels(pixels))
        }
        WireKind::Clear => Ok(ClientMessage::Clear),
        other => Err(CodecError::InvalidKind(other as i32)),
    }
}

/// Decode protobuf bytes sent by the server.
///
/// # Errors
///
/// Same as [`decode_client_binary`], with the server-side kinds accepted.
pub fn decode_server_binary(bytes: &[u8]) -> Result<ServerMessage, CodecError> {
    let (kind, pixels, error) = decode_wire(bytes)?;
    match kind {
        WireKind::Init => {
            validate_pixels(crate::TAG_INIT, &pixels, false)?;
            Ok(ServerMessage::Init(pixels))
        }
        WireKind::NewPixels => {
            validate_pixels(crate::TAG_NEW_PIXELS, &pixels, false)?;
            Ok(ServerMessage::NewPixels(pixels))
        }
        WireKind::Clear => Ok(ServerMessage::Clear),
        WireKind::Error => {
            let (code, message) = error;
            Ok(ServerMessage::Error {
                code: code.unwrap_or_else(|| crate::CODE_INVALID_MESSAGE.to_owned()),
                message: message.unwrap_or_default(),
            })
        }
        other => Err(CodecError::InvalidKind(other as i32)),
    }
}

type ErrorFields = (Option<String>, Option<String>);

fn decode_wire(bytes: &[u8]) -> Result<(WireKind, Vec<Pixel>, ErrorFields), CodecError> {
    let wire = WireMessage::decode(bytes)?;
    // proto3 leaves an unset version at zero.
    if wire.version != 0 && wire.version != PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(u64::from(wire.version)));
    }
    let kind = WireKind::try_from(wire.kind).map_err(|_| CodecError::InvalidKind(wire.kind))?;
    let pixels = wire.pixels.into_iter().map(pixel_from_wire).collect();
    Ok((kind, pixels, (wire.error_code, wire.error_message)))
}

#[cfg(test)]
#[path = "proto_test.rs"]
mod tests;
