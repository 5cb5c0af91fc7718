use chrono::Utc;
use folioterm_core::{EventEnvelope, EventKind, Result, runtime_dir};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Append-only session event log under the workspace runtime dir, with an
/// optional verbose mirror to stderr.
pub struct Observer {
    log_path: PathBuf,
    session_id: Uuid,
    seq: AtomicU64,
    verbose: bool,
}

impl Observer {
    pub fn new(workspace: &Path) -> Result<Self> {
        let dir = runtime_dir(workspace);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            log_path: dir.join("observe.log"),
            session_id: Uuid::now_v7(),
            seq: AtomicU64::new(1),
            verbose: false,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Record one event. Logging failures never interrupt the session —
    /// callers use `record` for best-effort bookkeeping.
    pub fn record(&self, kind: EventKind) {
        let envelope = EventEnvelope {
            seq_no: self.seq.fetch_add(1, Ordering::Relaxed),
            at: Utc::now(),
            session_id: self.session_id,
            kind,
        };
        let line = match serde_json::to_string(&envelope) {
            Ok(json) => format!("{} EVENT {json}", envelope.at.to_rfc3339()),
            Err(err) => format!("{} EVENT_ENCODE_ERROR {err}", Utc::now().to_rfc3339()),
        };
        if self.verbose {
            eprintln!("[folioterm] {line}");
        }
        let _ = self.append_log_line(&line);
    }

    /// Log a warning — always written to the log file and to stderr.
    pub fn warn_log(&self, msg: &str) {
        eprintln!("[folioterm WARN] {msg}");
        let _ = self.append_log_line(&format!("{} WARN {msg}", Utc::now().to_rfc3339()));
    }

    fn append_log_line(&self, line: &str) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn events_append_to_the_runtime_log() {
        let workspace = TempDir::new().expect("workspace");
        let observer = Observer::new(workspace.path()).expect("observer");
        observer.record(EventKind::SessionStartedV1 {
            workspace: workspace.path().display().to_string(),
        });
        observer.record(EventKind::BootCompletedV1);

        let log = fs::read_to_string(runtime_dir(workspace.path()).join("observe.log"))
            .expect("log file");
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("SessionStartedV1"));
        assert!(lines[1].contains("BootCompletedV1"));
    }

    #[test]
    fn seq_numbers_increase_per_event() {
        let workspace = TempDir::new().expect("workspace");
        let observer = Observer::new(workspace.path()).expect("observer");
        for _ in 0..3 {
            observer.record(EventKind::BootCompletedV1);
        }
        let log = fs::read_to_string(runtime_dir(workspace.path()).join("observe.log"))
            .expect("log file");
        let seqs: Vec<u64> = log
            .lines()
            .filter_map(|line| {
                let json = line.splitn(3, ' ').nth(2)?;
                let envelope: EventEnvelope = serde_json::from_str(json).ok()?;
                Some(envelope.seq_no)
            })
            .collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }
}
