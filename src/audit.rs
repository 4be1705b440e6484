//! Audit trail of publishes and fetches
//!
//! Appends JSON lines to `{state_dir}/bunch/audit.log`. Enabled by default,
//! switched off with `general.audit_log = false`.

use crate::config::{schema::Config, ConfigManager};
use crate::orchestrator::OperationReport;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Event name for a completed publish
pub const ARTIFACT_PUBLISHED: &str = "artifact.published";
/// Event name for a completed fetch
pub const ARTIFACT_FETCHED: &str = "artifact.fetched";

/// File-based audit logger that appends JSON lines
pub struct AuditLog {
    enabled: bool,
    path: PathBuf,
}

impl AuditLog {
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.audit_log,
            path: ConfigManager::audit_log_path(),
        }
    }

    /// Record a finished operation
    pub async fn record(&self, event: &str, report: &OperationReport) {
        let data = serde_json::json!({
            "key": report.location.key.to_string(),
            "url": report.location.remote_url,
            "bytes": report.bytes,
        });
        self.log(event, &data).await;
    }

    /// Log an audit event as a JSON line
    ///
    /// Write failures are logged and dropped.
    pub async fn log(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize audit event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
