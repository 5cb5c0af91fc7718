use crate::processor::CommandProcessor;
use anyhow::bail;
use chrono::Utc;
use folioterm_core::{CommandResult, HistoryEntry, OutputRecord, RecordKind, Result, SessionPhase};

/// Consumer of completed output records. The TUI hands records to the
/// typewriter; print mode and tests collect them directly.
pub trait RenderSink {
    fn render(&mut self, record: &OutputRecord);
}

/// A submission in flight: the echoed command record plus the history
/// snapshot the dispatcher should see (everything before this input).
#[derive(Debug, Clone)]
pub struct PendingSubmit {
    pub echo: OutputRecord,
    pub history_snapshot: Vec<HistoryEntry>,
}

/// In-memory state of one interactive run: the append-only input log, the
/// ordered transcript, and the boot flag. Lives for the process lifetime;
/// nothing is persisted.
#[derive(Debug)]
pub struct Session {
    phase: SessionPhase,
    history: Vec<HistoryEntry>,
    records: Vec<OutputRecord>,
    next_record_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Booting,
            history: Vec::new(),
            records: Vec::new(),
            next_record_id: 1,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    /// Transition `Booting` → `Ready`. Returns whether this call performed
    /// the transition — the boot collaborator calls it exactly once.
    pub fn mark_ready(&mut self) -> bool {
        if self.phase == SessionPhase::Ready {
            return false;
        }
        self.phase = SessionPhase::Ready;
        true
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    /// Append a transcript record outside the submit flow (welcome banner).
    pub fn push_output(&mut self, content: impl Into<String>, streaming: bool) -> OutputRecord {
        self.append(RecordKind::Output, content.into(), streaming)
    }

    /// First half of a submission: log the input verbatim and echo it into
    /// the transcript. The returned snapshot excludes the input itself, so
    /// `/history` and the assistant context never see the in-flight line.
    pub fn begin(&mut self, raw: &str) -> Result<PendingSubmit> {
        if !self.is_ready() {
            bail!("session is still booting");
        }
        if raw.trim().is_empty() {
            bail!("empty input");
        }
        let history_snapshot = self.history.clone();
        self.history.push(HistoryEntry::now(raw));
        let echo = self.append(RecordKind::Command, raw.to_string(), false);
        Ok(PendingSubmit {
            echo,
            history_snapshot,
        })
    }

    /// Second half: fold the dispatcher's result into the transcript.
    /// `Clear` empties the transcript and produces no record.
    pub fn finish(&mut self, result: CommandResult) -> Option<OutputRecord> {
        match result {
            CommandResult::Clear => {
                self.records.clear();
                None
            }
            CommandResult::Output { text, .. } => {
                Some(self.append(RecordKind::Output, text, true))
            }
            CommandResult::Warning { text } => Some(self.append(RecordKind::Warning, text, false)),
            CommandResult::Error { text } => Some(self.append(RecordKind::Error, text, false)),
        }
    }

    /// Fully synchronous submission: dispatch and render in one call.
    /// The interactive shell runs `begin`/`finish` around a worker thread
    /// instead, gated by its own in-flight flag.
    pub fn submit(
        &mut self,
        raw: &str,
        processor: &CommandProcessor,
        sink: &mut dyn RenderSink,
    ) -> Result<()> {
        let pending = self.begin(raw)?;
        sink.render(&pending.echo);
        let result = processor.process(raw, &pending.history_snapshot);
        if let Some(record) = self.finish(result) {
            sink.render(&record);
        }
        Ok(())
    }

    /// Mark a record's reveal as finished (or cancelled-and-fully-shown).
    pub fn mark_record_done(&mut self, id: u64) {
        if let Some(record) = self.records.iter_mut().find(|r| r.id == id) {
            record.streaming = false;
        }
    }

    fn append(&mut self, kind: RecordKind, content: String, streaming: bool) -> OutputRecord {
        let record = OutputRecord {
            id: self.next_record_id,
            kind,
            content,
            streaming,
            timestamp: Utc::now(),
        };
        self.next_record_id += 1;
        self.records.push(record.clone());
        record
    }
}
