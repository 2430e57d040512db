//! SSH probe implementation using the system `ssh` client.
//!
//! Stations are expected to accept key-based logins and to carry the report
//! script (`report.py`) in the configured report directory.

use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use tokio::process::Command;

use super::{ProbeError, ProbeTarget, RawDiagnosticPayload, TelemetryProbe};

/// Kernel boot time in epoch seconds; marks the start of the online period.
const STATUS_COMMAND: &str = "grep btime /proc/stat";

/// How to reach stations over SSH.
#[derive(Debug, Clone)]
pub struct SshSettings {
    /// Path or name of the ssh client binary.
    pub binary: String,
    /// Private key passed with `-i`; the client's defaults apply when unset.
    pub identity: Option<String>,
    pub connect_timeout: Duration,
    /// Directory on the station holding `report.py`, relative to the login home.
    pub report_dir: String,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            binary: "ssh".to_string(),
            identity: None,
            connect_timeout: Duration::from_secs(5),
            report_dir: "cockpit".to_string(),
        }
    }
}

pub struct SshProbe {
    settings: SshSettings,
}

impl SshProbe {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }

    /// Arguments for running `remote` on the target without any prompting.
    fn command_args(&self, target: &ProbeTarget, remote: &str) -> Vec<String> {
        let connect_secs = self.settings.connect_timeout.as_secs().max(1);

        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", connect_secs),
            "-p".to_string(),
            target.port.to_string(),
        ];
        if let Some(identity) = &self.settings.identity {
            args.push("-i".to_string());
            args.push(identity.clone());
        }
        args.push("--".to_string());
        args.push(format!("{}@{}", target.username, target.host));
        args.push(remote.to_string());
        args
    }

    fn report_command(&self) -> String {
        format!(
            "cd {} && python3 report.py >/dev/null && cat report.json",
            shell_quote(&self.settings.report_dir)
        )
    }

    /// Run a remote command and return its stdout.
    async fn run(&self, target: &ProbeTarget, remote: &str) -> Result<String, ProbeError> {
        let output = Command::new(&self.settings.binary)
            .args(self.command_args(target, remote))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProbeError::Command(format!("failed to execute {}: {}", self.settings.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Unreachable(format!(
                "{}@{}:{} exited with {}: {}",
                target.username,
                target.host,
                target.port,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TelemetryProbe for SshProbe {
    async fn status_check(&self, target: &ProbeTarget) -> Option<DateTime<Utc>> {
        match self.run(target, STATUS_COMMAND).await {
            Ok(output) => {
                let since = parse_boot_time(&output);
                if since.is_none() {
                    tracing::debug!("Unrecognised status output from {}: {:?}", target.host, output);
                }
                since
            }
            Err(e) => {
                tracing::debug!("Status check for {} failed: {}", target.host, e);
                None
            }
        }
    }

    async fn health_check(&self, target: &ProbeTarget) -> Result<RawDiagnosticPayload, ProbeError> {
        let output = self.run(target, &self.report_command()).await?;
        Ok(serde_json::from_str(&output)?)
    }
}

/// Pull the `btime` line out of `/proc/stat` output.
fn parse_boot_time(output: &str) -> Option<DateTime<Utc>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?m)^btime\s+(?P<secs>\d+)\s*$").unwrap());

    let secs: i64 = re.captures(output)?.name("secs")?.as_str().parse().ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Single-quote a word for the remote POSIX shell.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}
