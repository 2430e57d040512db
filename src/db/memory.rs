//! In-memory store used by tests.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::models::*;
use super::repository::{ReportRepository, StationRepository};
use super::store::DbError;

#[derive(Default)]
struct Tables {
    stations: Vec<Station>,
    reports: Vec<Report>,
    next_station_id: i64,
    next_report_id: i64,
    writes: usize,
}

/// A store that keeps everything in vectors and counts mutations.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful create/update/delete calls so far.
    pub fn writes(&self) -> usize {
        self.lock().map(|t| t.writes).unwrap_or(0)
    }

    pub fn report_count(&self) -> usize {
        self.lock().map(|t| t.reports.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, DbError> {
        self.tables.lock().map_err(|_| DbError::Poisoned)
    }
}

impl StationRepository for MemoryStore {
    fn find_station(&self, id: i64) -> Result<Option<Station>, DbError> {
        let tables = self.lock()?;
        Ok(tables.stations.iter().find(|s| s.id == id).cloned())
    }

    fn list_stations(&self) -> Result<Vec<Station>, DbError> {
        Ok(self.lock()?.stations.clone())
    }

    fn create_station(&self, fields: &StationFields) -> Result<Station, DbError> {
        let mut tables = self.lock()?;
        tables.next_station_id += 1;

        let mut station = Station {
            id: tables.next_station_id,
            ..Default::default()
        };
        station.apply(fields);

        tables.stations.push(station.clone());
        tables.writes += 1;
        Ok(station)
    }

    fn update_station(&self, id: i64, fields: &StationFields) -> Result<Station, DbError> {
        let mut tables = self.lock()?;
        let slot = tables
            .stations
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(DbError::NotFound)?;
        slot.apply(fields);
        let station = slot.clone();
        tables.writes += 1;
        Ok(station)
    }

    fn record_check(
        &self,
        id: i64,
        last_checked: DateTime<Utc>,
        online_since: Option<DateTime<Utc>>,
    ) -> Result<Station, DbError> {
        let mut tables = self.lock()?;
        let slot = tables
            .stations
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(DbError::NotFound)?;
        slot.last_checked = Some(last_checked);
        slot.online_since = online_since;
        let station = slot.clone();
        tables.writes += 1;
        Ok(station)
    }

    fn delete_station(&self, id: i64) -> Result<Option<Station>, DbError> {
        let mut tables = self.lock()?;
        let Some(pos) = tables.stations.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        tables.writes += 1;
        Ok(Some(tables.stations.remove(pos)))
    }
}

impl ReportRepository for MemoryStore {
    fn create_report(&self, report: NewReport) -> Result<Report, DbError> {
        let mut tables = self.lock()?;
        tables.next_report_id += 1;

        let report = Report::from_new(tables.next_report_id, report);
        tables.reports.push(report.clone());
        tables.writes += 1;
        Ok(report)
    }

    fn latest_reports(&self, station_id: i64, limit: usize) -> Result<Vec<Report>, DbError> {
        let tables = self.lock()?;
        Ok(tables
            .reports
            .iter()
            .rev()
            .filter(|r| r.station_id == station_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
