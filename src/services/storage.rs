use crate::config::config_dir;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Operations that touch release infrastructure and get an audit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Release,
    Run,
    Deploy,
    SetupNodes,
    Smoke,
}

#[derive(Debug, Serialize)]
struct AuditEvent<'a> {
    ts: u64,
    action: AuditAction,
    user: &'a str,
    data: serde_json::Value,
}

fn audit_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("audit.jsonl"))
}

/// Appends one `{ts, action, user, data}` line to `audit.jsonl`. Best effort:
/// a missing HOME or unwritable file only logs at debug level.
pub fn audit(action: AuditAction, data: serde_json::Value) {
    let Some(path) = audit_path() else {
        return;
    };
    let user = std::env::var("USER").unwrap_or_default();
    let event = AuditEvent {
        ts: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
        action,
        user: &user,
        data,
    };
    let written = serde_json::to_string(&event)
        .map_err(std::io::Error::other)
        .and_then(|line| append_line(&path, &line));
    if let Err(e) = written {
        tracing::debug!(path = %path.display(), error = %e, "audit log not written");
    }
}

fn append_line(path: &PathBuf, line: &str) -> std::io::Result<()> {
    use std::io::Write;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{}", line)
}
