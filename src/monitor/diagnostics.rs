//! Diagnostic report retrieval.

use serde::Serialize;

use super::{normalize, Monitor, MonitorError};
use crate::db::Report;
use crate::probe::ProbeTarget;

/// Result of a diagnostics request.
///
/// A fresh run yields the new report itself; asking for the stored one yields a
/// list holding at most the latest report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Diagnostics {
    Fresh(Report),
    Latest(Vec<Report>),
}

impl Monitor {
    /// Run a fresh health check, or return the most recently stored report.
    pub async fn get_diagnostics(
        &self,
        station_id: i64,
        request_fresh: bool,
    ) -> Result<Diagnostics, MonitorError> {
        if request_fresh {
            self.run_health_check(station_id).await.map(Diagnostics::Fresh)
        } else {
            Ok(Diagnostics::Latest(self.reports.latest_reports(station_id, 1)?))
        }
    }

    async fn run_health_check(&self, station_id: i64) -> Result<Report, MonitorError> {
        let station = self
            .stations
            .find_station(station_id)?
            .ok_or(MonitorError::NotFound(station_id))?;

        let target = ProbeTarget::from(&station);
        let deadline = self.timeouts.diagnostics;
        let raw = match tokio::time::timeout(deadline, self.probe.health_check(&target)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!("Health check for {} failed: {}", station.name, e);
                return Err(MonitorError::ProbeFailure(e));
            }
            Err(_) => {
                tracing::warn!("Health check for {} timed out after {:?}", station.name, deadline);
                return Err(MonitorError::ProbeTimeout(deadline));
            }
        };

        let report = self.reports.create_report(normalize(raw, station_id))?;
        tracing::info!(
            "Stored report {} for station {} ({} downtimes)",
            report.id,
            station.name,
            report.downtimes.len()
        );

        Ok(report)
    }
}
