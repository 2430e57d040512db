//! Configuration module for Cockpit.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

use crate::monitor::ProbeTimeouts;
use crate::probe::SshSettings;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "cockpit.db")
    pub db_path: String,
    pub ssh: SshSettings,
    pub timeouts: ProbeTimeouts,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "cockpit.db".to_string(),
            ssh: SshSettings::default(),
            timeouts: ProbeTimeouts::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `COCKPIT_HTTP_PORT`: HTTP port (default: 8080)
    /// - `COCKPIT_DB_PATH`: Database file path (default: "cockpit.db")
    /// - `COCKPIT_SSH_BIN`: ssh client binary (default: "ssh")
    /// - `COCKPIT_SSH_IDENTITY`: private key for station logins (default: unset)
    /// - `COCKPIT_REPORT_DIR`: station directory holding report.py (default: "cockpit")
    /// - `COCKPIT_CONNECT_TIMEOUT`: SSH connect timeout in seconds (default: 5)
    /// - `COCKPIT_STATUS_TIMEOUT`: status check deadline in seconds (default: 10)
    /// - `COCKPIT_DIAGNOSTICS_TIMEOUT`: health check deadline in seconds (default: 120)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup. Unparseable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = lookup("COCKPIT_HTTP_PORT").and_then(|s| s.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(db_path) = lookup("COCKPIT_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Some(binary) = lookup("COCKPIT_SSH_BIN") {
            cfg.ssh.binary = binary;
        }

        cfg.ssh.identity = lookup("COCKPIT_SSH_IDENTITY").filter(|s| !s.is_empty());

        if let Some(dir) = lookup("COCKPIT_REPORT_DIR") {
            cfg.ssh.report_dir = dir;
        }

        if let Some(d) = seconds(&lookup, "COCKPIT_CONNECT_TIMEOUT") {
            cfg.ssh.connect_timeout = d;
        }

        if let Some(d) = seconds(&lookup, "COCKPIT_STATUS_TIMEOUT") {
            cfg.timeouts.status = d;
        }

        if let Some(d) = seconds(&lookup, "COCKPIT_DIAGNOSTICS_TIMEOUT") {
            cfg.timeouts.diagnostics = d;
        }

        cfg
    }
}

/// A positive number of seconds.
fn seconds<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}
