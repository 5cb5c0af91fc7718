use crate::command::Builtin;
use folioterm_catalog::ProjectCatalog;
use folioterm_core::{COMMAND_PREFIX, ChatError, CommandResult, HistoryEntry, tokenize};
use folioterm_llm::{ChatService, context_window};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Stable message for failures the dispatcher itself cannot explain.
const INTERNAL_ERROR_TEXT: &str =
    "An error occurred while processing your command. Please try again.";

/// Dispatches one submitted input to a builtin handler or the assistant.
///
/// `process` is total: every failure path — unknown command, assistant
/// transport failure, even a handler panic — comes back as a
/// `CommandResult`, never as an `Err` or an unwind. The processor holds no
/// cross-call state; serialization of submissions is the caller's job.
pub struct CommandProcessor {
    catalog: ProjectCatalog,
    chat: Box<dyn ChatService>,
}

impl CommandProcessor {
    pub fn new(catalog: ProjectCatalog, chat: Box<dyn ChatService>) -> Self {
        Self { catalog, chat }
    }

    pub fn catalog(&self) -> &ProjectCatalog {
        &self.catalog
    }

    pub fn process(&self, raw: &str, history: &[HistoryEntry]) -> CommandResult {
        catch_unwind(AssertUnwindSafe(|| self.dispatch(raw, history)))
            .unwrap_or_else(|_| CommandResult::error(INTERNAL_ERROR_TEXT))
    }

    fn dispatch(&self, raw: &str, history: &[HistoryEntry]) -> CommandResult {
        let parsed = tokenize(raw);

        if let Some(builtin) = Builtin::parse(&parsed.name) {
            return builtin.run(&parsed.args, history, &self.catalog);
        }

        // Unknown slash commands never fall through to the assistant.
        if !parsed.name.is_empty() && parsed.name.starts_with(COMMAND_PREFIX) {
            return CommandResult::error(format!(
                "Command \"{}\" not found. Type '/help' to see available commands.",
                parsed.name
            ));
        }

        if parsed.name.is_empty() {
            return CommandResult::error("Type '/help' to see available commands.");
        }

        // Free text: the assistant gets the raw input verbatim (not the
        // lowercased tokens) plus a bounded trailing history window.
        let inputs: Vec<String> = history.iter().map(|h| h.input.clone()).collect();
        let recent = context_window(&inputs).to_vec();
        match self.chat.complete(raw, &recent) {
            Ok(text) => CommandResult::Output {
                text,
                rich_text: false,
            },
            Err(err) => CommandResult::error(assistant_error_message(&err)),
        }
    }
}

/// User-facing phrasing for assistant failures, matched by kind.
pub fn assistant_error_message(err: &ChatError) -> String {
    match err {
        ChatError::Unreachable { .. } => {
            "Assistant service is offline. Bring the backend up and try again in a moment."
                .to_string()
        }
        ChatError::Unauthorized { .. } => {
            "Assistant credentials are misconfigured. Check the API key settings.".to_string()
        }
        ChatError::RateLimited => {
            "Too many requests right now. Give it a few seconds and try again.".to_string()
        }
        ChatError::ContentFiltered => {
            "That prompt was rejected by the content filter. Try rephrasing it.".to_string()
        }
        ChatError::TimedOut { seconds } => {
            format!("Assistant did not respond within {seconds}s. Try again shortly.")
        }
        ChatError::Other { detail } => {
            format!("Assistant systems are temporarily offline ({detail}). Try '/help' for available commands.")
        }
    }
}
