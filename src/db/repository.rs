//! Storage contracts consumed by the monitor.

use chrono::{DateTime, Utc};

use super::models::{NewReport, Report, Station, StationFields};
use super::store::DbError;

/// Registry of capture stations.
pub trait StationRepository: Send + Sync {
    fn find_station(&self, id: i64) -> Result<Option<Station>, DbError>;

    /// All stations in insertion order.
    fn list_stations(&self) -> Result<Vec<Station>, DbError>;

    fn create_station(&self, fields: &StationFields) -> Result<Station, DbError>;

    /// Overwrite the user-editable columns and return the stored row.
    ///
    /// Liveness columns are not written. Fails with [`DbError::NotFound`]
    /// when no row has the id.
    fn update_station(&self, id: i64, fields: &StationFields) -> Result<Station, DbError>;

    /// Record the outcome of a reachability check and return the stored row.
    /// Only `last_checked` and `online_since` are written.
    fn record_check(
        &self,
        id: i64,
        last_checked: DateTime<Utc>,
        online_since: Option<DateTime<Utc>>,
    ) -> Result<Station, DbError>;

    /// Remove a station and hand back the deleted row, if there was one.
    fn delete_station(&self, id: i64) -> Result<Option<Station>, DbError>;
}

/// Append-only store of diagnostic reports.
pub trait ReportRepository: Send + Sync {
    fn create_report(&self, report: NewReport) -> Result<Report, DbError>;

    /// Up to `limit` reports for a station, most recently inserted first.
    fn latest_reports(&self, station_id: i64, limit: usize) -> Result<Vec<Report>, DbError>;
}
