use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub type Result<T> = anyhow::Result<T>;

/// Names must start with this prefix to be considered for builtin lookup.
pub const COMMAND_PREFIX: char = '/';

/// How many trailing history entries accompany an assistant request.
pub const RECENT_HISTORY_WINDOW: usize = 3;

pub fn runtime_dir(workspace: &Path) -> PathBuf {
    workspace.join(".folioterm")
}

/// A raw input line split into a command name and its arguments.
///
/// The whole line is lower-cased before splitting, so argument case is not
/// preserved. `name` keeps its leading `/` — `"/help"` and `"help"` are
/// distinct tokens and only the former can resolve to a builtin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

pub fn tokenize(raw: &str) -> ParsedCommand {
    let lowered = raw.to_lowercase();
    let mut parts = lowered.split_whitespace();
    let name = parts.next().unwrap_or_default().to_string();
    let args = parts.map(ToString::to_string).collect();
    ParsedCommand { name, args }
}

/// Outcome of dispatching one submitted input. Exactly one per submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    Output { text: String, rich_text: bool },
    Clear,
    Warning { text: String },
    Error { text: String },
}

impl CommandResult {
    pub fn output(text: impl Into<String>) -> Self {
        Self::Output {
            text: text.into(),
            rich_text: false,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::Warning { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Error { text: text.into() }
    }

    /// Short label used in event logs and tests.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Output { .. } => "output",
            Self::Clear => "clear",
            Self::Warning { .. } => "warning",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Echo of the submitted input, prompt-prefixed in the display.
    Command,
    Output,
    Warning,
    Error,
}

/// One entry of the visible transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub id: u64,
    pub kind: RecordKind,
    pub content: String,
    /// Whether the renderer should reveal this record incrementally.
    /// Flipped to `false` once the reveal completes (or is cancelled).
    pub streaming: bool,
    pub timestamp: DateTime<Utc>,
}

/// One executed input. Append-only; never mutated or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub input: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn now(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Session lifecycle: the boot collaborator flips `Booting` to `Ready`
/// exactly once; no input is accepted before that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Booting,
    Ready,
}

/// Assistant transport failures, matched by kind — never by message text.
///
/// The order of variants mirrors the classification order: connection
/// problems first, then credentials, then throttling, then content policy,
/// then timeouts, then everything else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("assistant service unreachable: {detail}")]
    Unreachable { detail: String },
    #[error("assistant rejected the configured credentials (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("assistant is rate limited, retry shortly")]
    RateLimited,
    #[error("prompt rejected by the assistant content filter")]
    ContentFiltered,
    #[error("assistant did not respond within {seconds}s")]
    TimedOut { seconds: u64 },
    #[error("assistant request failed: {detail}")]
    Other { detail: String },
}

impl ChatError {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "unreachable",
            Self::Unauthorized { .. } => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::ContentFiltered => "content_filtered",
            Self::TimedOut { .. } => "timed_out",
            Self::Other { .. } => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub seq_no: u64,
    pub at: DateTime<Utc>,
    pub session_id: Uuid,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventKind {
    SessionStartedV1 {
        workspace: String,
    },
    BootCompletedV1,
    InputSubmittedV1 {
        input: String,
    },
    CommandDispatchedV1 {
        name: String,
        outcome: String,
    },
    TranscriptClearedV1 {
        records_dropped: usize,
    },
    RenderCancelledV1 {
        record_id: u64,
    },
    RenderCompletedV1 {
        record_id: u64,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assistant: AssistantConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5001/api/ai/chat".to_string(),
            api_key: None,
            api_key_env: "FOLIOTERM_API_KEY".to_string(),
            model: "gemini-1.5-flash".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Delay between typewriter increments.
    pub typing_interval_ms: u64,
    /// Characters revealed per increment.
    pub typing_chunk_chars: usize,
    /// Reveal everything instantly instead of typing it out.
    pub reduced_motion: bool,
    pub prompt_label: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            typing_interval_ms: 12,
            typing_chunk_chars: 3,
            reduced_motion: false,
            prompt_label: "guest@folioterm:~$".to_string(),
        }
    }
}

impl AppConfig {
    pub fn user_settings_path() -> Option<PathBuf> {
        let home = std::env::var("HOME")
            .ok()
            .or_else(|| std::env::var("USERPROFILE").ok())?;
        Some(Path::new(&home).join(".folioterm/settings.json"))
    }

    pub fn project_settings_path(workspace: &Path) -> PathBuf {
        runtime_dir(workspace).join("settings.json")
    }

    pub fn project_local_settings_path(workspace: &Path) -> PathBuf {
        runtime_dir(workspace).join("settings.local.json")
    }

    /// Layered load: defaults, then user settings, then project settings,
    /// then project-local overrides — later layers win key-by-key.
    pub fn load(workspace: &Path) -> Result<Self> {
        let mut merged = serde_json::to_value(Self::default())?;

        let mut paths = Vec::new();
        if let Some(user) = Self::user_settings_path() {
            paths.push(user);
        }
        paths.push(Self::project_settings_path(workspace));
        paths.push(Self::project_local_settings_path(workspace));

        for path in paths {
            if !path.exists() {
                continue;
            }
            let raw = fs::read_to_string(path)?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            merge_json_value(&mut merged, &value);
        }

        Ok(serde_json::from_value(merged)?)
    }

    pub fn save(&self, workspace: &Path) -> Result<()> {
        let path = Self::project_settings_path(workspace);
        fs::create_dir_all(
            path.parent()
                .ok_or_else(|| anyhow::anyhow!("invalid config path"))?,
        )?;
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

fn merge_json_value(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_obj), serde_json::Value::Object(overlay_obj)) => {
            for (key, overlay_value) in overlay_obj {
                if let Some(base_value) = base_obj.get_mut(key) {
                    merge_json_value(base_value, overlay_value);
                } else {
                    base_obj.insert(key.clone(), overlay_value.clone());
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn tokenize_lowercases_and_splits_on_whitespace_runs() {
        let parsed = tokenize("/Project   AI_Chat_Bot");
        assert_eq!(parsed.name, "/project");
        assert_eq!(parsed.args, vec!["ai_chat_bot".to_string()]);
    }

    #[test]
    fn tokenize_keeps_the_prefix_in_the_name() {
        assert_eq!(tokenize("/help").name, "/help");
        assert_eq!(tokenize("help").name, "help");
    }

    #[test]
    fn tokenize_of_blank_input_has_empty_name() {
        assert_eq!(tokenize("   ").name, "");
        assert!(tokenize("").args.is_empty());
    }

    #[test]
    fn command_result_kind_labels_are_stable() {
        assert_eq!(CommandResult::output("x").kind_label(), "output");
        assert_eq!(CommandResult::Clear.kind_label(), "clear");
        assert_eq!(CommandResult::warning("x").kind_label(), "warning");
        assert_eq!(CommandResult::error("x").kind_label(), "error");
    }

    #[test]
    fn event_kinds_round_trip_via_serde() {
        let events = vec![
            EventKind::SessionStartedV1 {
                workspace: "/tmp/ws".to_string(),
            },
            EventKind::CommandDispatchedV1 {
                name: "/help".to_string(),
                outcome: "output".to_string(),
            },
            EventKind::RenderCancelledV1 { record_id: 7 },
        ];
        for event in events {
            let serialized = serde_json::to_string(&event).expect("serialize");
            let deserialized: EventKind = serde_json::from_str(&serialized).expect("deserialize");
            assert_eq!(deserialized, event);
        }
    }

    #[test]
    fn config_defaults_have_a_bounded_assistant_timeout() {
        let cfg = AppConfig::default();
        assert!(cfg.assistant.timeout_seconds > 0);
        assert!(cfg.ui.typing_chunk_chars > 0);
    }

    proptest! {
        #[test]
        fn tokenize_never_produces_empty_tokens(raw in ".{0,120}") {
            let parsed = tokenize(&raw);
            prop_assert!(parsed.args.iter().all(|a| !a.is_empty()));
            prop_assert!(!parsed.name.contains(char::is_whitespace));
        }

        #[test]
        fn merge_json_value_is_idempotent_for_flat_objects(
            base in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..12),
            overlay in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..12),
        ) {
            let mut base_value = json!(base);
            let overlay_value = json!(overlay);
            merge_json_value(&mut base_value, &overlay_value);
            let once = base_value.clone();
            merge_json_value(&mut base_value, &overlay_value);
            prop_assert_eq!(base_value, once);
        }
    }
}
