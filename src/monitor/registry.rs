//! Station registry: list, add, edit, delete.

use serde::Deserialize;

use super::{Monitor, MonitorError};
use crate::db::{Station, StationFields};

/// Station fields as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

impl StationRequest {
    /// Check required fields. Name, host, port and username must be present;
    /// location defaults to empty.
    pub fn validate(&self) -> Result<StationFields, MonitorError> {
        fn required(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        let name = required(&self.name);
        let host = required(&self.host);
        let username = required(&self.username);

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if host.is_none() {
            missing.push("host");
        }
        if self.port.is_none() {
            missing.push("port");
        }
        if username.is_none() {
            missing.push("username");
        }
        if !missing.is_empty() {
            return Err(MonitorError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        for (field, value) in [("host", &host), ("username", &username)] {
            if value.as_deref().is_some_and(|v| !is_ssh_word(v)) {
                return Err(MonitorError::Validation(format!(
                    "{} must not start with '-' or contain whitespace or control characters",
                    field
                )));
            }
        }

        let port = self
            .port
            .and_then(|p| u16::try_from(p).ok())
            .filter(|p| *p > 0)
            .ok_or_else(|| MonitorError::Validation("port must be between 1 and 65535".to_string()))?;

        Ok(StationFields {
            name: name.unwrap_or_default(),
            location: self.location.as_deref().map(str::trim).unwrap_or_default().to_string(),
            host: host.unwrap_or_default(),
            port,
            username: username.unwrap_or_default(),
        })
    }
}

/// Whether `value` can be handed to ssh as a user or host name.
fn is_ssh_word(value: &str) -> bool {
    !value.starts_with('-') && !value.chars().any(|c| c.is_whitespace() || c.is_control())
}

impl Monitor {
    pub fn list_stations(&self) -> Result<Vec<Station>, MonitorError> {
        Ok(self.stations.list_stations()?)
    }

    pub fn add_station(&self, request: &StationRequest) -> Result<Station, MonitorError> {
        let fields = request.validate()?;
        let station = self.stations.create_station(&fields)?;
        tracing::info!("Registry: Added station {} ({})", station.name, station.id);
        Ok(station)
    }

    /// Replace a station's editable fields. Liveness fields are kept.
    pub fn edit_station(&self, id: i64, request: &StationRequest) -> Result<Station, MonitorError> {
        if self.stations.find_station(id)?.is_none() {
            return Err(MonitorError::NotFound(id));
        }

        let fields = request.validate()?;
        let station = self
            .stations
            .update_station(id, &fields)
            .map_err(|e| MonitorError::from_db(id, e))?;

        tracing::info!("Registry: Updated station {} ({})", station.name, id);
        Ok(station)
    }

    /// Remove a station and return it. Its reports stay in the report store.
    pub fn delete_station(&self, id: i64) -> Result<Station, MonitorError> {
        let station = self
            .stations
            .delete_station(id)?
            .ok_or(MonitorError::NotFound(id))?;

        tracing::info!("Registry: Removed station {} ({})", station.name, id);
        Ok(station)
    }
}
