//! Raw diagnostic payload as produced by the station-side report script.

use serde::Deserialize;
use serde_json::Value;

/// Output of a station health check, before normalization.
///
/// Inner shapes are not checked; everything except downtimes is carried
/// through to the report untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDiagnosticPayload {
    #[serde(default)]
    pub storage: RawStorage,
    #[serde(default, alias = "hdhomerunDevices")]
    pub hdhomerun_devices: Vec<Value>,
    #[serde(default)]
    pub security: Value,
    #[serde(default)]
    pub errors: Option<Value>,
    #[serde(default)]
    pub downtimes: Option<Vec<RawDowntime>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawStorage {
    #[serde(default)]
    pub disks: Vec<Value>,
    #[serde(default)]
    pub cards: Vec<Value>,
}

/// A downtime interval in epoch seconds, exactly as the station wrote it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDowntime {
    #[serde(default)]
    pub start: EpochValue,
    #[serde(default)]
    pub end: EpochValue,
}

/// Epoch seconds as a JSON number or string. Anything else lands in `Other`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EpochValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl Default for EpochValue {
    fn default() -> Self {
        EpochValue::Other(Value::Null)
    }
}

impl From<&str> for EpochValue {
    fn from(s: &str) -> Self {
        EpochValue::Text(s.to_string())
    }
}

impl From<i64> for EpochValue {
    fn from(n: i64) -> Self {
        EpochValue::Integer(n)
    }
}
