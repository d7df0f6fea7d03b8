use serde_json::{json, Value};

use crate::pattern::{LedColor, Pattern, PatternCommand};

/// Largest payload the link layer will hand us (the transport MTU).
pub const MAX_MESSAGE_SIZE: usize = 250;

/// Why an inbound payload was rejected. All cases are non-fatal: the
/// payload is dropped and the active command stays untouched.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("message type is not \"led_command\"")]
    UnsupportedType,
    #[error("missing or non-object \"data\" field")]
    MissingPayload,
    #[error("missing \"pattern\" string in \"data\"")]
    MissingPattern,
}

// Numeric wire fields are read as integers and wrapped into the target
// width; out-of-range values wrap rather than clamp. Non-numeric values
// coerce to 0.
fn coerce_int(value: &Value) -> i64 {
    if let Some(n) = value.as_i64() {
        return n;
    }
    if let Some(f) = value.as_f64() {
        return f as i64;
    }
    return 0;
}

/// Parse a raw payload into a validated command.
///
/// The payload must be a JSON object with `"type": "led_command"` and a
/// `"data"` object naming a `"pattern"`. Unknown pattern names resolve to
/// IDLE. Optional `color`/`brightness`/`speed` fields in `data` override
/// the resolved pattern's defaults; a `timestamp` field is accepted but
/// carries no meaning here. Pure function, no side effects.
pub fn decode(payload: &[u8]) -> Result<PatternCommand, DecodeError> {
    let doc: Value = serde_json::from_slice(payload)
        .map_err(|err| DecodeError::MalformedPayload(err.to_string()))?;
    let root = match doc.as_object() {
        Some(root) => root,
        None => {
            return Err(DecodeError::MalformedPayload(
                "top level is not an object".to_string(),
            ))
        }
    };

    match root.get("type").and_then(Value::as_str) {
        Some("led_command") => (),
        _ => return Err(DecodeError::UnsupportedType),
    }

    let data = root
        .get("data")
        .and_then(Value::as_object)
        .ok_or(DecodeError::MissingPayload)?;

    let pattern_name = data
        .get("pattern")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingPattern)?;

    let mut command = Pattern::from_name(pattern_name).default_command();

    if let Some(color) = data.get("color").and_then(Value::as_array) {
        // An array shorter than 3 elements is ignored as a whole and the
        // pattern default is kept. Elements past the third are unused.
        if color.len() >= 3 {
            command.color = LedColor::new(
                coerce_int(&color[0]) as u8,
                coerce_int(&color[1]) as u8,
                coerce_int(&color[2]) as u8,
            );
        }
    }
    if let Some(brightness) = data.get("brightness") {
        command.brightness = coerce_int(brightness) as u8;
    }
    if let Some(speed) = data.get("speed") {
        command.speed = coerce_int(speed) as u16;
    }

    return Ok(command);
}

/// Inverse of `decode`, used by the base side to build outgoing datagrams.
/// `timestamp_ms` is informational only; receivers ignore it.
pub fn encode_command(command: &PatternCommand, timestamp_ms: u64) -> Vec<u8> {
    let doc = json!({
        "type": "led_command",
        "data": {
            "pattern": command.pattern.name(),
            "color": [command.color.r(), command.color.g(), command.color.b()],
            "brightness": command.brightness,
            "speed": command.speed,
        },
        "timestamp": timestamp_ms,
    });
    return doc.to_string().into_bytes();
}
