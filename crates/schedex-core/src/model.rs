use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifying ratings printed at the top of a panel schedule.
///
/// Every field defaults to an empty string when the drawing (or the model's
/// reply) does not carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelHeader {
    #[serde(deserialize_with = "lenient_string")]
    pub panel_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub main_rating: String,
    #[serde(deserialize_with = "lenient_string")]
    pub voltage: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phase: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wire: String,
    #[serde(deserialize_with = "lenient_string")]
    pub poles: String,
    /// Short-circuit interrupting rating (e.g., "22,000").
    #[serde(deserialize_with = "lenient_string")]
    pub kaic: String,
    #[serde(deserialize_with = "lenient_string")]
    pub enclosure: String,
}

impl PanelHeader {
    /// One-line description used as the panel title in the workbook.
    ///
    /// Empty fields are skipped; the rest are joined with ", ".
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.panel_name.is_empty() {
            parts.push(format!("Panel {}", self.panel_name));
        }
        for field in [&self.main_rating, &self.voltage, &self.phase, &self.wire] {
            if !field.is_empty() {
                parts.push(field.clone());
            }
        }
        if !self.poles.is_empty() {
            parts.push(format!("{} poles", self.poles));
        }
        for field in [&self.kaic, &self.enclosure] {
            if !field.is_empty() {
                parts.push(field.clone());
            }
        }
        parts.join(", ")
    }
}

/// One circuit row of a panel schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Circuit {
    #[serde(deserialize_with = "lenient_string")]
    pub load_description: String,
    /// Overcurrent protection: breaker trip or fuse size.
    #[serde(deserialize_with = "lenient_string")]
    pub ocp_size: String,
    #[serde(deserialize_with = "lenient_string")]
    pub poles: String,
    #[serde(deserialize_with = "lenient_string")]
    pub feeder: String,
    #[serde(deserialize_with = "lenient_string")]
    pub circuit_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub panel_header: PanelHeader,
    #[serde(deserialize_with = "null_as_default")]
    pub circuits: Vec<Circuit>,
}

impl PanelRecord {
    /// Panel name for display, or "Unknown" when the header has none.
    pub fn display_name(&self) -> &str {
        if self.panel_header.panel_name.is_empty() {
            "Unknown"
        } else {
            &self.panel_header.panel_name
        }
    }
}

/// Result of parsing one model reply.
///
/// Distinguishes "the model found nothing" from "the reply was unusable".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// At least one panel was decoded.
    Extracted(Vec<PanelRecord>),
    /// The reply decoded but listed no panels.
    Empty,
    /// The reply could not be decoded.
    ParseFailure(String),
}

impl ExtractionOutcome {
    pub fn panels(&self) -> &[PanelRecord] {
        match self {
            ExtractionOutcome::Extracted(panels) => panels,
            _ => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExtractionOutcome::ParseFailure(_))
    }
}

impl fmt::Display for ExtractionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionOutcome::Extracted(panels) => write!(f, "{} panel(s)", panels.len()),
            ExtractionOutcome::Empty => write!(f, "no panels"),
            ExtractionOutcome::ParseFailure(reason) => write!(f, "parse failure: {reason}"),
        }
    }
}

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept strings, numbers, booleans and null for a text field.
///
/// Models regularly emit `"poles": 3` or `"feeder": null`; both land as
/// strings so downstream writers never see a missing value.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_numeric_fields_become_strings() {
        let circuit: Circuit = serde_json::from_str(
            r#"{"load_description":"Lighting","ocp_size":"20A","poles":1,"feeder":null}"#,
        )
        .unwrap();
        assert_eq!(circuit.poles, "1");
        assert_eq!(circuit.feeder, "");
        assert_eq!(circuit.circuit_number, "");
    }

    #[test]
    fn describe_skips_empty_parts() {
        let header = PanelHeader {
            panel_name: "PC-LP-01-01".into(),
            main_rating: "400A MCB".into(),
            voltage: "208Y/120".into(),
            poles: "42".into(),
            enclosure: "Type 1".into(),
            ..Default::default()
        };
        assert_eq!(
            header.describe(),
            "Panel PC-LP-01-01, 400A MCB, 208Y/120, 42 poles, Type 1"
        );
        assert_eq!(PanelHeader::default().describe(), "");
    }

    #[test]
    fn display_name_falls_back_to_unknown() {
        assert_eq!(PanelRecord::default().display_name(), "Unknown");
    }
}
