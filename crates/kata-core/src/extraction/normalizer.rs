//! Turns raw model text into a structured value.

use serde_json::Value;
use tracing::debug;

use crate::client::RawModelResponse;
use crate::error::ParseError;
use crate::models::record::{ExtractionRecord, StructuredValue};

use super::mapper::to_record;
use super::patterns::{FENCE, LEADING_FENCE};

/// Remove surrounding whitespace, a byte-order mark and code-fence markers.
///
/// Handles a leading fence with or without a language tag and a bare
/// trailing fence. Anything else is left untouched.
pub fn strip_fences(text: &str) -> &str {
    let mut body = text.trim_matches(is_padding);

    if let Some(fence) = LEADING_FENCE.find(body) {
        body = &body[fence.end()..];
    }
    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest;
    }

    body.trim()
}

/// Parse model text into a JSON object without projecting it.
pub fn parse_structured(raw: &RawModelResponse) -> Result<StructuredValue, ParseError> {
    let body = strip_fences(raw.as_str());
    if body.is_empty() {
        return Err(ParseError::Empty);
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ParseError::Malformed {
            text: raw.as_str().to_string(),
            reason: format!("expected a JSON object, found {}", kind(&other)),
        }),
        Err(e) => {
            debug!("Model response is not JSON: {}", e);
            Err(ParseError::Malformed {
                text: raw.as_str().to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Parse model text into a nameplate record.
pub fn normalize(raw: &RawModelResponse) -> Result<ExtractionRecord, ParseError> {
    parse_structured(raw).map(|parsed| to_record(&parsed))
}

fn is_padding(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
