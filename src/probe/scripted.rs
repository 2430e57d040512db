//! A probe with canned answers, for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ProbeError, ProbeTarget, RawDiagnosticPayload, TelemetryProbe};

/// Answers every call with whatever was last scripted, optionally after a delay.
#[derive(Default)]
pub struct ScriptedProbe {
    online_since: Mutex<Option<DateTime<Utc>>>,
    health: Mutex<Option<RawDiagnosticPayload>>,
    delay: Mutex<Option<Duration>>,
    status_calls: AtomicUsize,
    health_calls: AtomicUsize,
    last_target: Mutex<Option<ProbeTarget>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online_since(&self, since: Option<DateTime<Utc>>) {
        *self.online_since.lock().unwrap() = since;
    }

    /// `None` makes the health check fail as if the station refused the connection.
    pub fn set_health(&self, payload: Option<RawDiagnosticPayload>) {
        *self.health.lock().unwrap() = payload;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn last_target(&self) -> Option<ProbeTarget> {
        self.last_target.lock().unwrap().clone()
    }

    async fn pause(&self, target: &ProbeTarget) {
        *self.last_target.lock().unwrap() = Some(target.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TelemetryProbe for ScriptedProbe {
    async fn status_check(&self, target: &ProbeTarget) -> Option<DateTime<Utc>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(target).await;
        *self.online_since.lock().unwrap()
    }

    async fn health_check(&self, target: &ProbeTarget) -> Result<RawDiagnosticPayload, ProbeError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(target).await;
        self.health
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ProbeError::Unreachable("connection refused".to_string()))
    }
}
