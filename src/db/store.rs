//! SQLite database store implementation.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::models::*;
use super::repository::{ReportRepository, StationRepository};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

const STATION_COLUMNS: &str =
    "id, name, location, host, port, username, last_checked, online_since";

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("malformed JSON column: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database connection lock poisoned")]
    Poisoned,
    #[error("Not found")]
    NotFound,
}

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Bring the schema up to date.
    fn init(&self) -> Result<(), DbError> {
        let mut conn = self.conn()?;
        let report = embedded::migrations::runner()
            .run(&mut *conn)
            .map_err(|e| DbError::Migration(e.to_string()))?;

        for migration in report.applied_migrations() {
            tracing::info!("Applied migration {}", migration);
        }
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }
}

// --- Stations ---

impl StationRepository for Store {
    fn find_station(&self, id: i64) -> Result<Option<Station>, DbError> {
        let conn = self.conn()?;
        let station = conn
            .query_row(
                &format!("SELECT {STATION_COLUMNS} FROM stations WHERE id = ?1"),
                params![id],
                station_from_row,
            )
            .optional()?;
        Ok(station)
    }

    fn list_stations(&self) -> Result<Vec<Station>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {STATION_COLUMNS} FROM stations ORDER BY id ASC"))?;

        let stations = stmt
            .query_map([], station_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(stations)
    }

    fn create_station(&self, fields: &StationFields) -> Result<Station, DbError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO stations (name, location, host, port, username) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fields.name,
                fields.location,
                fields.host,
                fields.port,
                fields.username,
            ],
        )?;

        let mut station = Station {
            id: conn.last_insert_rowid(),
            ..Default::default()
        };
        station.apply(fields);
        Ok(station)
    }

    fn update_station(&self, id: i64, fields: &StationFields) -> Result<Station, DbError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE stations SET name=?1, location=?2, host=?3, port=?4, username=?5 WHERE id=?6",
            params![
                fields.name,
                fields.location,
                fields.host,
                fields.port,
                fields.username,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(DbError::NotFound);
        }
        reload_station(&conn, id)
    }

    fn record_check(
        &self,
        id: i64,
        last_checked: DateTime<Utc>,
        online_since: Option<DateTime<Utc>>,
    ) -> Result<Station, DbError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE stations SET last_checked=?1, online_since=?2 WHERE id=?3",
            params![
                format_db_time(last_checked),
                online_since.map(format_db_time),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(DbError::NotFound);
        }
        reload_station(&conn, id)
    }

    fn delete_station(&self, id: i64) -> Result<Option<Station>, DbError> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let station = tx
            .query_row(
                &format!("SELECT {STATION_COLUMNS} FROM stations WHERE id = ?1"),
                params![id],
                station_from_row,
            )
            .optional()?;

        // Reports are left in place.
        if station.is_some() {
            tx.execute("DELETE FROM stations WHERE id = ?1", params![id])?;
        }

        tx.commit()?;
        Ok(station)
    }
}

// --- Reports ---

impl ReportRepository for Store {
    fn create_report(&self, report: NewReport) -> Result<Report, DbError> {
        let disks = serde_json::to_string(&report.disks)?;
        let cards = serde_json::to_string(&report.cards)?;
        let devices = serde_json::to_string(&report.hdhomerun_devices)?;
        let security = serde_json::to_string(&report.security)?;
        let errors = report.errors.as_ref().map(serde_json::to_string).transpose()?;
        let downtimes = serde_json::to_string(&report.downtimes)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO reports (station_id, disks, cards, hdhomerun_devices, security, errors, downtimes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![report.station_id, disks, cards, devices, security, errors, downtimes],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Report::from_new(id, report))
    }

    fn latest_reports(&self, station_id: i64, limit: usize) -> Result<Vec<Report>, DbError> {
        let rows = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(
                "SELECT id, station_id, disks, cards, hdhomerun_devices, security, errors, downtimes
                 FROM reports WHERE station_id = ?1 ORDER BY id DESC LIMIT ?2",
            )?;

            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let rows = stmt
                .query_map(params![station_id, limit], |row| {
                    Ok(ReportRow {
                        id: row.get(0)?,
                        station_id: row.get(1)?,
                        disks: row.get(2)?,
                        cards: row.get(3)?,
                        hdhomerun_devices: row.get(4)?,
                        security: row.get(5)?,
                        errors: row.get(6)?,
                        downtimes: row.get(7)?,
                    })
                })?
                .collect::<SqlResult<Vec<_>>>()?;
            rows
        };

        rows.into_iter().map(ReportRow::decode).collect()
    }
}

/// A report row with its JSON columns still encoded.
struct ReportRow {
    id: i64,
    station_id: i64,
    disks: String,
    cards: String,
    hdhomerun_devices: String,
    security: String,
    errors: Option<String>,
    downtimes: String,
}

impl ReportRow {
    fn decode(self) -> Result<Report, DbError> {
        Ok(Report {
            id: self.id,
            station_id: self.station_id,
            disks: serde_json::from_str(&self.disks)?,
            cards: serde_json::from_str(&self.cards)?,
            hdhomerun_devices: serde_json::from_str(&self.hdhomerun_devices)?,
            security: serde_json::from_str(&self.security)?,
            errors: self
                .errors
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()?,
            downtimes: serde_json::from_str(&self.downtimes)?,
        })
    }
}

fn reload_station(conn: &Connection, id: i64) -> Result<Station, DbError> {
    conn.query_row(
        &format!("SELECT {STATION_COLUMNS} FROM stations WHERE id = ?1"),
        params![id],
        station_from_row,
    )
    .optional()?
    .ok_or(DbError::NotFound)
}

fn station_from_row(row: &Row<'_>) -> SqlResult<Station> {
    let last_checked: Option<String> = row.get(6)?;
    let online_since: Option<String> = row.get(7)?;
    Ok(Station {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        host: row.get(3)?,
        port: row.get(4)?,
        username: row.get(5)?,
        last_checked: last_checked.as_deref().and_then(parse_db_time),
        online_since: online_since.as_deref().and_then(parse_db_time),
    })
}

fn format_db_time(t: DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// Parse a datetime string from the database.
fn parse_db_time(s: &str) -> Option<DateTime<Utc>> {
    let formats = [TIME_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

    for fmt in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
