//! Station monitor: liveness refresh, diagnostics and the station registry.
//!
//! Every operation is stateless between calls; all state lives in the
//! injected stores. Concurrent calls for the same station are not serialized.

mod diagnostics;
mod health;
mod normalizer;
mod registry;

pub use diagnostics::*;
pub use health::*;
pub use normalizer::*;
pub use registry::*;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::db::{DbError, ReportRepository, StationRepository};
use crate::probe::{ProbeError, TelemetryProbe};

/// Monitor error types.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Station not found")]
    NotFound(i64),
    #[error("{0}")]
    Validation(String),
    #[error("probe timed out after {0:?}")]
    ProbeTimeout(Duration),
    #[error("probe failed: {0}")]
    ProbeFailure(#[from] ProbeError),
    #[error("storage error: {0}")]
    Storage(DbError),
}

impl MonitorError {
    /// Treat a row that vanished mid-operation as a missing station.
    fn from_db(id: i64, err: DbError) -> Self {
        match err {
            DbError::NotFound => MonitorError::NotFound(id),
            other => MonitorError::Storage(other),
        }
    }
}

impl From<DbError> for MonitorError {
    fn from(err: DbError) -> Self {
        MonitorError::Storage(err)
    }
}

/// Upper bounds on how long the monitor waits for the probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeTimeouts {
    pub status: Duration,
    pub diagnostics: Duration,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            status: Duration::from_secs(10),
            diagnostics: Duration::from_secs(120),
        }
    }
}

/// Entry point for every station operation.
pub struct Monitor {
    stations: Arc<dyn StationRepository>,
    reports: Arc<dyn ReportRepository>,
    probe: Arc<dyn TelemetryProbe>,
    timeouts: ProbeTimeouts,
}

impl Monitor {
    pub fn new(
        stations: Arc<dyn StationRepository>,
        reports: Arc<dyn ReportRepository>,
        probe: Arc<dyn TelemetryProbe>,
        timeouts: ProbeTimeouts,
    ) -> Self {
        Self {
            stations,
            reports,
            probe,
            timeouts,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::db::{MemoryStore, StationFields};
    use crate::probe::ScriptedProbe;

    pub struct Harness {
        pub monitor: Monitor,
        pub store: Arc<MemoryStore>,
        pub probe: Arc<ScriptedProbe>,
    }

    pub fn harness() -> Harness {
        harness_with(ProbeTimeouts::default())
    }

    pub fn harness_with(timeouts: ProbeTimeouts) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let probe = Arc::new(ScriptedProbe::new());
        let monitor = Monitor::new(store.clone(), store.clone(), probe.clone(), timeouts);
        Harness {
            monitor,
            store,
            probe,
        }
    }

    pub fn hen_fields() -> StationFields {
        StationFields {
            name: "Hen-1".to_string(),
            location: "Lab".to_string(),
            host: "10.0.0.5".to_string(),
            port: 22,
            username: "ops".to_string(),
        }
    }
}
