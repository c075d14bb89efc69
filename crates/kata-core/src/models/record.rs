//! Nameplate record model.

use serde::{Deserialize, Serialize};

/// A parsed, not yet projected, model response.
pub type StructuredValue = serde_json::Map<String, serde_json::Value>;

/// Fields read from an air-conditioner nameplate.
///
/// Every value is the text printed on the plate, units included.
/// `None` means the model did not report the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Model number (型番).
    pub model_number: Option<String>,

    /// Year of manufacture (製造年).
    pub manufacture_year: Option<String>,

    /// Rated cooling capacity, e.g. "2.2kW".
    pub cooling_capacity: Option<String>,

    /// Rated heating capacity in standard conditions.
    pub heating_capacity_standard: Option<String>,

    /// Rated heating capacity at low outdoor temperature.
    pub heating_capacity_low_temp: Option<String>,

    /// Rated cooling power consumption, e.g. "580W".
    pub cooling_power: Option<String>,

    /// Rated heating power consumption.
    pub heating_power: Option<String>,
}

impl ExtractionRecord {
    /// Serialized field names, in display order.
    pub const FIELD_NAMES: [&'static str; 7] = [
        "model_number",
        "manufacture_year",
        "cooling_capacity",
        "heating_capacity_standard",
        "heating_capacity_low_temp",
        "cooling_power",
        "heating_power",
    ];

    /// Table headings matching [`Self::FIELD_NAMES`].
    pub const LABELS: [&'static str; 7] = [
        "型番",
        "製造年",
        "定格冷房能力",
        "定格暖房能力(標準)",
        "定格暖房能力(低温)",
        "定格冷房消費電力",
        "定格暖房消費電力",
    ];

    /// Field values in display order.
    pub fn values(&self) -> [Option<&str>; 7] {
        [
            self.model_number.as_deref(),
            self.manufacture_year.as_deref(),
            self.cooling_capacity.as_deref(),
            self.heating_capacity_standard.as_deref(),
            self.heating_capacity_low_temp.as_deref(),
            self.cooling_power.as_deref(),
            self.heating_power.as_deref(),
        ]
    }

    /// (label, value) pairs for table rendering.
    pub fn columns(&self) -> Vec<(&'static str, Option<&str>)> {
        Self::LABELS.into_iter().zip(self.values()).collect()
    }

    /// Names of fields the model did not report.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        Self::FIELD_NAMES
            .into_iter()
            .zip(self.values())
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect()
    }

    /// Whether no field was reported at all.
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ExtractionRecord {
        ExtractionRecord {
            model_number: Some("AY-L22DH".into()),
            manufacture_year: Some("2019".into()),
            cooling_capacity: Some("2.2kW".into()),
            heating_capacity_standard: Some("2.5kW".into()),
            heating_capacity_low_temp: None,
            cooling_power: Some("580W".into()),
            heating_power: Some("490W".into()),
        }
    }

    #[test]
    fn test_columns_follow_label_order() {
        let record = sample();
        let columns = record.columns();
        assert_eq!(columns.len(), 7);
        assert_eq!(columns[0], ("型番", Some("AY-L22DH")));
        assert_eq!(columns[4], ("定格暖房能力(低温)", None));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(sample().missing_fields(), vec!["heating_capacity_low_temp"]);
        assert_eq!(ExtractionRecord::default().missing_fields().len(), 7);
        assert!(ExtractionRecord::default().is_empty());
    }

    #[test]
    fn test_serializes_all_keys() {
        let json = serde_json::to_value(ExtractionRecord::default()).unwrap();
        let object = json.as_object().unwrap();
        for name in ExtractionRecord::FIELD_NAMES {
            assert_eq!(object.get(name), Some(&serde_json::Value::Null));
        }
        assert_eq!(object.len(), 7);
    }
}
