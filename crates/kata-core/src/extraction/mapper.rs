//! Projection of a parsed response onto the fixed record columns.

use serde_json::Value;
use tracing::debug;

use crate::models::record::{ExtractionRecord, StructuredValue};

// Accepted keys per field. The first key holding a usable value wins.
const MODEL_NUMBER_KEYS: &[&str] = &["型番", "model_number"];
const MANUFACTURE_YEAR_KEYS: &[&str] = &["製造年", "manufacture_year"];
const COOLING_CAPACITY_KEYS: &[&str] = &["定格冷房能力", "cooling_capacity"];
const HEATING_CAPACITY_KEYS: &[&str] = &["定格暖房能力", "heating_capacity"];
const HEATING_STANDARD_KEYS: &[&str] = &["heating_capacity_standard"];
const HEATING_LOW_TEMP_KEYS: &[&str] = &["heating_capacity_low_temp"];
const COOLING_POWER_KEYS: &[&str] = &["定格冷房消費電力", "cooling_power"];
const HEATING_POWER_KEYS: &[&str] = &["定格暖房消費電力", "heating_power"];

// Sub-keys of a nested heating capacity.
const STANDARD_SUB_KEYS: &[&str] = &["標準", "standard"];
const LOW_TEMP_SUB_KEYS: &[&str] = &["低温", "low_temp", "low_temperature"];

/// Build a record from a parsed response. Missing keys become `None`.
pub fn to_record(parsed: &StructuredValue) -> ExtractionRecord {
    let (heating_capacity_standard, heating_capacity_low_temp) = heating_capacity(parsed);

    let record = ExtractionRecord {
        model_number: lookup(parsed, MODEL_NUMBER_KEYS),
        manufacture_year: lookup(parsed, MANUFACTURE_YEAR_KEYS),
        cooling_capacity: lookup(parsed, COOLING_CAPACITY_KEYS),
        heating_capacity_standard,
        heating_capacity_low_temp,
        cooling_power: lookup(parsed, COOLING_POWER_KEYS),
        heating_power: lookup(parsed, HEATING_POWER_KEYS),
    };

    let unknown: Vec<&str> = parsed
        .keys()
        .map(String::as_str)
        .filter(|key| !is_known_key(key))
        .collect();
    if !unknown.is_empty() {
        debug!("Ignoring unrecognized keys: {:?}", unknown);
    }

    record
}

/// Heating capacity as (standard, low temperature).
///
/// Accepts a nested object with mode sub-keys, a flat string (taken as the
/// standard rating), or the record's own split keys.
fn heating_capacity(parsed: &StructuredValue) -> (Option<String>, Option<String>) {
    let mut standard = None;
    let mut low_temp = None;

    for value in HEATING_CAPACITY_KEYS.iter().filter_map(|key| parsed.get(*key)) {
        match value {
            Value::Object(modes) => {
                standard = standard.or_else(|| lookup(modes, STANDARD_SUB_KEYS));
                low_temp = low_temp.or_else(|| lookup(modes, LOW_TEMP_SUB_KEYS));
            }
            other => standard = standard.or_else(|| leaf_text(other)),
        }
    }

    (
        standard.or_else(|| lookup(parsed, HEATING_STANDARD_KEYS)),
        low_temp.or_else(|| lookup(parsed, HEATING_LOW_TEMP_KEYS)),
    )
}

fn lookup(map: &StructuredValue, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(leaf_text)
}

/// Text of a scalar leaf. Blank strings, null and containers yield `None`.
fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_known_key(key: &str) -> bool {
    [
        MODEL_NUMBER_KEYS,
        MANUFACTURE_YEAR_KEYS,
        COOLING_CAPACITY_KEYS,
        HEATING_CAPACITY_KEYS,
        HEATING_STANDARD_KEYS,
        HEATING_LOW_TEMP_KEYS,
        COOLING_POWER_KEYS,
        HEATING_POWER_KEYS,
    ]
    .iter()
    .any(|keys| keys.contains(&key))
}
