//! JSON text codec.
//!
//! Canonical frame: `{"type": TAG, "v": 1, "payload": ...}`. Inbound frames
//! are parsed into a `serde_json::Value` first so shape errors name the exact
//! field that failed, and so the legacy forms can be recognised:
//!
//! - `DRAW_PIXEL` with a single pixel payload
//! - `CREATE_PIXELS_ARRAY` with the pixels under `pixelsArray`
//! - `CLEAR_CANVAS`
//! - a payload that is itself a JSON-encoded string

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    ClientMessage, CodecError, PROTOCOL_VERSION, Pixel, ServerMessage, TAG_APPEND_PIXELS, TAG_CLEAR, TAG_ERROR,
    TAG_INIT, TAG_NEW_PIXELS, validate_pixels,
};

const LEGACY_DRAW_PIXEL: &str = "DRAW_PIXEL";
const LEGACY_CREATE_PIXELS_ARRAY: &str = "CREATE_PIXELS_ARRAY";
const LEGACY_CLEAR_CANVAS: &str = "CLEAR_CANVAS";
const LEGACY_INIT_PIXELS: &str = "INIT_PIXELS";
const LEGACY_NEW_PIXEL: &str = "NEW_PIXEL";

// =============================================================================
// ENCODE
// =============================================================================

#[derive(Serialize)]
struct Envelope<'a, P: Serialize> {
    #[serde(rename = "type")]
    kind: &'a str,
    v: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<P>,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    code: &'a str,
    message: &'a str,
}

fn to_text<P: Serialize>(kind: &str, payload: Option<P>) -> String {
    let envelope = Envelope { kind, v: PROTOCOL_VERSION, payload };
    // Plain structs with string keys always serialize.
    serde_json::to_string(&envelope).unwrap_or_default()
}

/// Encode a server message as a JSON text frame.
#[must_use]
pub fn encode_server_text(message: &ServerMessage) -> String {
    match message {
        ServerMessage::Init(pixels) | ServerMessage::NewPixels(pixels) => to_text(message.tag(), Some(pixels)),
        ServerMessage::Clear => to_text::<()>(TAG_CLEAR, None),
        ServerMessage::Error { code, message } => to_text(TAG_ERROR, Some(ErrorPayload { code, message })),
    }
}

/// Encode a client message as a JSON text frame.
#[must_use]
pub fn encode_client_text(message: &ClientMessage) -> String {
    match message {
        ClientMessage::AppendPixels(pixels) => to_text(TAG_APPEND_PIXELS, Some(pixels)),
        ClientMessage::Clear => to_text::<()>(TAG_CLEAR, None),
    }
}

// =============================================================================
// DECODE
// =============================================================================

/// Decode a client text frame.
///
/// # Errors
///
/// Returns a [`CodecError`] for non-JSON input, an unknown or missing tag, an
/// unsupported version, or a payload that fails pixel validation.
pub fn decode_client_text(text: &str) -> Result<ClientMessage, CodecError> {
    let mut map = parse_object(text)?;
    check_version(&map)?;
    let kind = take_type(&mut map)?;

    match kind.as_str() {
        TAG_APPEND_PIXELS => {
            let payload = take_payload(&mut map, TAG_APPEND_PIXELS)?;
            Ok(ClientMessage::AppendPixels(pixels_from(TAG_APPEND_PIXELS, payload, true)?))
        }
        LEGACY_CREATE_PIXELS_ARRAY => {
            let payload = match map.remove("pixelsArray") {
                Some(value) => unwrap_string(value, TAG_APPEND_PIXELS)?,
                None => take_payload(&mut map, TAG_APPEND_PIXELS)?,
            };
            // Empty on a click without a drag; the dispatcher ignores it.
            Ok(ClientMessage::AppendPixels(pixels_from(TAG_APPEND_PIXELS, payload, false)?))
        }
        LEGACY_DRAW_PIXEL => {
            let payload = take_payload(&mut map, TAG_APPEND_PIXELS)?;
            let pixel: Pixel = serde_json::from_value(payload)
                .map_err(|source| CodecError::InvalidPayload { tag: TAG_APPEND_PIXELS, source })?;
            let pixels = vec![pixel];
            validate_pixels(TAG_APPEND_PIXELS, &pixels, true)?;
            Ok(ClientMessage::AppendPixels(pixels))
        }
        TAG_CLEAR | LEGACY_CLEAR_CANVAS => Ok(ClientMessage::Clear),
        _ => Err(CodecError::UnknownType(kind)),
    }
}

/// Decode a server text frame.
///
/// Older servers answered bad input with a bare `{"error": "..."}` object,
/// and sent pixels as `INIT_PIXELS`/`NEW_PIXEL` under a `message` key; those
/// shapes are read as their canonical counterparts.
///
/// # Errors
///
/// Returns a [`CodecError`] for non-JSON input, an unknown tag, or invalid
/// pixels.
pub fn decode_server_text(text: &str) -> Result<ServerMessage, CodecError> {
    let mut map = parse_object(text)?;
    if !map.contains_key("type") {
        if let Some(Value::String(message)) = map.remove("error") {
            return Ok(ServerMessage::Error { code: crate::CODE_INVALID_MESSAGE.to_owned(), message });
        }
    }
    check_version(&map)?;
    let kind = take_type(&mut map)?;

    match kind.as_str() {
        TAG_INIT => {
            let pixels = match map.remove("payload") {
                None | Some(Value::Null) => Vec::new(),
                Some(value) => pixels_from(TAG_INIT, unwrap_string(value, TAG_INIT)?, false)?,
            };
            Ok(ServerMessage::Init(pixels))
        }
        TAG_NEW_PIXELS => {
            let payload = take_payload(&mut map, TAG_NEW_PIXELS)?;
            Ok(ServerMessage::NewPixels(pixels_from(TAG_NEW_PIXELS, payload, false)?))
        }
        LEGACY_INIT_PIXELS => {
            let pixels = match map.remove("message") {
                None | Some(Value::Null) => Vec::new(),
                Some(value) => pixels_from(TAG_INIT, unwrap_string(value, TAG_INIT)?, false)?,
            };
            Ok(ServerMessage::Init(pixels))
        }
        LEGACY_NEW_PIXEL => {
            let Some(value) = map.remove("message") else {
                return Err(CodecError::MissingPayload { tag: TAG_NEW_PIXELS });
            };
            Ok(ServerMessage::NewPixels(pixels_from(TAG_NEW_PIXELS, unwrap_string(value, TAG_NEW_PIXELS)?, false)?))
        }
        TAG_CLEAR | LEGACY_CLEAR_CANVAS => Ok(ServerMessage::Clear),
        TAG_ERROR => match map.remove("payload") {
            None | Some(Value::Null) => Err(CodecError::MissingPayload { tag: TAG_ERROR }),
            Some(payload) => Ok(error_from_payload(payload)),
        },
        _ => Err(CodecError::UnknownType(kind)),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn parse_object(text: &str) -> Result<Map<String, Value>, CodecError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(CodecError::NotAnObject),
    }
}

fn check_version(map: &Map<String, Value>) -> Result<(), CodecError> {
    match map.get("v") {
        None | Some(Value::Null) => Ok(()),
        Some(value) => match value.as_u64() {
            Some(v) if v == u64::from(PROTOCOL_VERSION) => Ok(()),
            Some(v) => Err(CodecError::UnsupportedVersion(v)),
            None => Err(CodecError::InvalidVersion(value.to_string())),
        },
    }
}

fn take_type(map: &mut Map<String, Value>) -> Result<String, CodecError> {
    match map.remove("type") {
        Some(Value::String(kind)) => Ok(kind),
        _ => Err(CodecError::MissingType),
    }
}

fn take_payload(map: &mut Map<String, Value>, tag: &'static str) -> Result<Value, CodecError> {
    match map.remove("payload") {
        None | Some(Value::Null) => Err(CodecError::MissingPayload { tag }),
        Some(value) => unwrap_string(value, tag),
    }
}

/// Older clients double-encoded the payload as a JSON string.
fn unwrap_string(value: Value, tag: &'static str) -> Result<Value, CodecError> {
    match value {
        Value::String(inner) => {
            serde_json::from_str(&inner).map_err(|source| CodecError::InvalidPayload { tag, source })
        }
        other => Ok(other),
    }
}

fn pixels_from(tag: &'static str, payload: Value, require_non_empty: bool) -> Result<Vec<Pixel>, CodecError> {
    let pixels: Vec<Pixel> =
        serde_json::from_value(payload).map_err(|source| CodecError::InvalidPayload { tag, source })?;
    validate_pixels(tag, &pixels, require_non_empty)?;
    Ok(pixels)
}

fn error_from_payload(payload: Value) -> ServerMessage {
    match payload {
        Value::String(message) => ServerMessage::Error { code: crate::CODE_INVALID_MESSAGE.to_owned(), message },
        Value::Object(mut fields) => {
            let code = match fields.remove("code") {
                Some(Value::String(code)) => code,
                _ => crate::CODE_INVALID_MESSAGE.to_owned(),
            };
            let message = match fields.remove("message") {
                Some(Value::String(message)) => message,
                _ => String::new(),
            };
            ServerMessage::Error { code, message }
        }
        other => ServerMessage::Error { code: crate::CODE_INVALID_MESSAGE.to_owned(), message: other.to_string() },
    }
}

#[cfg(test)]
#[path = "json_test.rs"]
mod tests;
