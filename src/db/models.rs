//! Database model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A registered capture station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    /// When reachability was last probed, whatever the outcome.
    pub last_checked: Option<DateTime<Utc>>,
    /// Start of the current online period; `None` while offline.
    pub online_since: Option<DateTime<Utc>>,
}

impl Default for Station {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            location: String::new(),
            host: String::new(),
            port: 22,
            username: String::new(),
            last_checked: None,
            online_since: None,
        }
    }
}

impl Station {
    /// Overwrite the user-editable fields, leaving liveness untouched.
    pub fn apply(&mut self, fields: &StationFields) {
        self.name = fields.name.clone();
        self.location = fields.location.clone();
        self.host = fields.host.clone();
        self.port = fields.port;
        self.username = fields.username.clone();
    }
}

/// The user-editable subset of a station, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct StationFields {
    pub name: String,
    pub location: String,
    pub host: String,
    pub port: u16,
    pub username: String,
}

/// A start/end pair of a period the station was observed offline.
///
/// Either end is `None` when the probe reported a value that is not a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Downtime {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// A diagnostic report that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub station_id: i64,
    pub disks: Vec<Value>,
    pub cards: Vec<Value>,
    pub hdhomerun_devices: Vec<Value>,
    pub security: Value,
    pub errors: Option<Value>,
    pub downtimes: Vec<Downtime>,
}

/// A stored diagnostic report. The id doubles as insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub station_id: i64,
    pub disks: Vec<Value>,
    pub cards: Vec<Value>,
    pub hdhomerun_devices: Vec<Value>,
    pub security: Value,
    pub errors: Option<Value>,
    pub downtimes: Vec<Downtime>,
}

impl Report {
    pub fn from_new(id: i64, report: NewReport) -> Self {
        Self {
            id,
            station_id: report.station_id,
            disks: report.disks,
            cards: report.cards,
            hdhomerun_devices: report.hdhomerun_devices,
            security: report.security,
            errors: report.errors,
            downtimes: report.downtimes,
        }
    }
}
