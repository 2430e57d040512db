//! Telemetry probe for capture stations.
//!
//! The monitor talks to stations only through [`TelemetryProbe`]; the shipped
//! implementation reaches them over SSH.

mod payload;
#[cfg(test)]
mod scripted;
mod ssh;

pub use payload::*;
#[cfg(test)]
pub use scripted::*;
pub use ssh::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::Station;

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("command failed: {0}")]
    Command(String),
    #[error("station unreachable: {0}")]
    Unreachable(String),
    #[error("malformed diagnostic payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Connection details of the station being probed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl From<&Station> for ProbeTarget {
    fn from(station: &Station) -> Self {
        Self {
            host: station.host.clone(),
            port: station.port,
            username: station.username.clone(),
        }
    }
}

#[async_trait]
pub trait TelemetryProbe: Send + Sync {
    /// When the station came online, or `None` if it cannot be reached.
    ///
    /// Unreachability is an answer, not an error.
    async fn status_check(&self, target: &ProbeTarget) -> Option<DateTime<Utc>>;

    /// Run the station-side health script and return its raw output.
    async fn health_check(&self, target: &ProbeTarget) -> Result<RawDiagnosticPayload, ProbeError>;
}
