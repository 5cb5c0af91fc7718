use anyhow::Result;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use folioterm_core::{AppConfig, CommandResult, EventKind, RecordKind, UiConfig, tokenize};
use folioterm_observe::Observer;
use folioterm_shell::{CommandProcessor, Session};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget, Wrap};
use ratatui::{Terminal, TerminalOptions, Viewport};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use crate::typewriter::{RenderEvent, Typewriter};

/// First transcript entry once the boot sequence hands the session over.
pub const WELCOME_TEXT: &str = "Welcome to my AI-powered portfolio terminal!

I'm an AI version of the developer behind this portfolio.
Type '/help' to see what we can explore together.
Try asking me anything - I'm here to help!";

const BOOT_LINES: &[&str] = &[
    "Initializing folioterm kernel...",
    "Loading project catalog............ OK",
    "Linking AI assistant bridge........ OK",
    "Mounting /portfolio................ OK",
    "Boot complete.",
];

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Bottom rows managed by ratatui: streaming partial output, separator,
/// input line, status bar. Everything above lives in native scrollback.
const INLINE_VIEWPORT_HEIGHT: u16 = 10;

/// Progress of the record currently being revealed: what the typewriter
/// has shown so far and how much of it already went to scrollback.
struct RevealState {
    active: Option<(u64, RecordKind)>,
    revealed: String,
    flushed_bytes: usize,
}

impl RevealState {
    fn idle() -> Self {
        Self {
            active: None,
            revealed: String::new(),
            flushed_bytes: 0,
        }
    }

    /// The partial line shown in the inline viewport.
    fn tail(&self) -> &str {
        &self.revealed[self.flushed_bytes.min(self.revealed.len())..]
    }
}

fn apply_render_event(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    observer: &Observer,
    reveal: &mut RevealState,
    event: RenderEvent,
) -> Result<()> {
    match event {
        RenderEvent::Increment {
            record_id,
            revealed,
        } => {
            if let Some((id, kind)) = reveal.active
                && id == record_id
            {
                reveal.revealed = revealed;
                flush_revealed_lines(
                    terminal,
                    &reveal.revealed,
                    &mut reveal.flushed_bytes,
                    kind,
                    false,
                )?;
            }
        }
        RenderEvent::Completed {
            record_id,
            cancelled,
        } => {
            session.mark_record_done(record_id);
            observer.record(if cancelled {
                EventKind::RenderCancelledV1 { record_id }
            } else {
                EventKind::RenderCompletedV1 { record_id }
            });
            if let Some((id, kind)) = reveal.active
                && id == record_id
            {
                flush_revealed_lines(
                    terminal,
                    &reveal.revealed,
                    &mut reveal.flushed_bytes,
                    kind,
                    true,
                )?;
                *reveal = RevealState::idle();
            }
        }
    }
    Ok(())
}

/// RAII guard that restores the terminal on drop (including panics).
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), crossterm::cursor::Show);
    }
}

pub fn run_shell(
    cfg: &AppConfig,
    processor: CommandProcessor,
    observer: &Observer,
    skip_boot: bool,
) -> Result<()> {
    let sigint_flag = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    {
        let flag = Arc::clone(&sigint_flag);
        signal_hook::flag::register(signal_hook::consts::SIGINT, flag)?;
    }

    // Restore the terminal before printing any panic message.
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), crossterm::cursor::Show);
        prev_hook(info);
    }));

    if !skip_boot {
        run_boot_sequence(&cfg.ui);
    }

    let mut session = Session::new();
    session.mark_ready();
    observer.record(EventKind::BootCompletedV1);

    enable_raw_mode()?;
    let _guard = TerminalGuard;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(INLINE_VIEWPORT_HEIGHT),
        },
    )?;

    let (render_tx, render_rx) = mpsc::channel();
    let mut typewriter = Typewriter::new(
        cfg.ui.typing_interval_ms,
        cfg.ui.typing_chunk_chars,
        cfg.ui.reduced_motion,
        render_tx,
    );
    let (result_tx, result_rx) = mpsc::channel::<CommandResult>();
    let processor = Arc::new(processor);
    let prompt_label = cfg.ui.prompt_label.clone();

    // The welcome banner streams like any other output record.
    let welcome = session.push_output(WELCOME_TEXT, true);
    let mut reveal = RevealState {
        active: Some((welcome.id, welcome.kind)),
        revealed: String::new(),
        flushed_bytes: 0,
    };
    typewriter.render(&welcome);

    let mut input = String::new();
    let mut cursor: usize = 0;
    let mut history_cursor: Option<usize> = None;
    let mut saved_input = String::new();
    let mut is_processing = false;
    let mut info_line = String::from(" /help for commands | ↑/↓ history | Ctrl+C exit");
    let mut tick: usize = 0;

    loop {
        if sigint_flag.load(Ordering::SeqCst) {
            break;
        }
        tick = tick.wrapping_add(1);

        // Fold in finished dispatches.
        while let Ok(result) = result_rx.try_recv() {
            is_processing = false;
            let name = session
                .history()
                .last()
                .map(|entry| tokenize(&entry.input).name)
                .unwrap_or_default();
            observer.record(EventKind::CommandDispatchedV1 {
                name,
                outcome: result.kind_label().to_string(),
            });
            let dropped = session.records().len();
            match session.finish(result) {
                None => {
                    // Drop the stream before wiping the screen so no stale
                    // increments land after the clear.
                    typewriter.cancel_active();
                    while let Ok(event) = render_rx.try_recv() {
                        drop(event);
                    }
                    observer.record(EventKind::TranscriptClearedV1 {
                        records_dropped: dropped,
                    });
                    reveal = RevealState::idle();
                    crossterm::execute!(
                        io::stdout(),
                        crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
                        crossterm::cursor::MoveTo(0, 0)
                    )?;
                    terminal.clear()?;
                }
                Some(record) => {
                    reveal = RevealState {
                        active: Some((record.id, record.kind)),
                        revealed: String::new(),
                        flushed_bytes: 0,
                    };
                    typewriter.render(&record);
                }
            }
        }

        // Fold in typewriter progress.
        while let Ok(event) = render_rx.try_recv() {
            apply_render_event(&mut terminal, &mut session, observer, &mut reveal, event)?;
        }

        let tail = reveal.tail().to_string();
        let tail_kind = reveal.active.map(|(_, kind)| kind);
        let cursor_visible = tick % 16 < 8;
        let spinner = SPINNER_FRAMES[tick % SPINNER_FRAMES.len()];

        terminal.draw(|frame| {
            let area = frame.area();
            if area.width == 0 || area.height < 4 {
                return;
            }
            let stream_height = area.height.saturating_sub(3);
            let stream_area = Rect::new(area.x, area.y, area.width, stream_height);
            let sep_area = Rect::new(area.x, area.y + stream_height, area.width, 1);
            let input_area = Rect::new(area.x, sep_area.y + 1, area.width, 1);
            let status_area = Rect::new(area.x, sep_area.y + 2, area.width, 1);

            if !tail.is_empty() {
                let kind = tail_kind.unwrap_or(RecordKind::Output);
                frame.render_widget(
                    Paragraph::new(record_line(kind, &tail, &prompt_label))
                        .wrap(Wrap { trim: false }),
                    stream_area,
                );
            } else if is_processing {
                frame.render_widget(
                    Paragraph::new(Line::from(Span::styled(
                        format!("{spinner} thinking..."),
                        Style::default().fg(Color::DarkGray),
                    ))),
                    stream_area,
                );
            }

            frame.render_widget(
                Paragraph::new(Span::styled(
                    "─".repeat(area.width as usize),
                    Style::default().fg(Color::DarkGray),
                )),
                sep_area,
            );

            let shown_input = with_cursor(&input, cursor, cursor_visible && !is_processing);
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(
                        format!("{prompt_label} "),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(shown_input),
                ])),
                input_area,
            );

            let clock = Local::now().format("%H:%M:%S").to_string();
            let gap = (area.width as usize)
                .saturating_sub(info_line.chars().count() + clock.chars().count() + 1);
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(info_line.clone(), Style::default().fg(Color::DarkGray)),
                    Span::raw(" ".repeat(gap)),
                    Span::styled(clock, Style::default().fg(Color::Cyan)),
                ])),
                status_area,
            );
        })?;

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            break;
        }
        match key.code {
            KeyCode::Enter => {
                if is_processing {
                    info_line = " still processing, hang on...".to_string();
                    continue;
                }
                let prompt = input.trim().to_string();
                if prompt.is_empty() {
                    continue;
                }
                let pending = match session.begin(&prompt) {
                    Ok(pending) => pending,
                    Err(err) => {
                        info_line = format!(" {err}");
                        continue;
                    }
                };
                observer.record(EventKind::InputSubmittedV1 {
                    input: prompt.clone(),
                });
                // A record still typing gets cancelled (fully revealed)
                // and flushed before the new echo, keeping scrollback in
                // transcript order.
                if reveal.active.is_some() {
                    typewriter.cancel_active();
                    while let Ok(event) = render_rx.try_recv() {
                        apply_render_event(
                            &mut terminal,
                            &mut session,
                            observer,
                            &mut reveal,
                            event,
                        )?;
                    }
                }
                insert_lines_above(
                    &mut terminal,
                    &[record_line(RecordKind::Command, &prompt, &prompt_label)],
                )?;
                input.clear();
                cursor = 0;
                history_cursor = None;
                is_processing = true;
                info_line = " /help for commands | ↑/↓ history | Ctrl+C exit".to_string();

                let worker_processor = Arc::clone(&processor);
                let tx = result_tx.clone();
                thread::spawn(move || {
                    let result = worker_processor.process(&prompt, &pending.history_snapshot);
                    let _ = tx.send(result);
                });
            }
            KeyCode::Up => {
                let history = session.history();
                if !history.is_empty() {
                    if history_cursor.is_none() {
                        saved_input = input.clone();
                        history_cursor = Some(history.len() - 1);
                    } else if let Some(idx) = history_cursor
                        && idx > 0
                    {
                        history_cursor = Some(idx - 1);
                    }
                    if let Some(idx) = history_cursor
                        && let Some(entry) = history.get(idx)
                    {
                        input = entry.input.clone();
                        cursor = input.chars().count();
                    }
                }
            }
            KeyCode::Down => {
                if let Some(idx) = history_cursor {
                    let history = session.history();
                    if idx + 1 < history.len() {
                        history_cursor = Some(idx + 1);
                        if let Some(entry) = history.get(idx + 1) {
                            input = entry.input.clone();
                            cursor = input.chars().count();
                        }
                    } else {
                        history_cursor = None;
                        input = saved_input.clone();
                        cursor = input.chars().count();
                    }
                }
            }
            KeyCode::Backspace => {
                if cursor > 0 {
                    let start = char_to_byte(&input, cursor - 1);
                    let end = char_to_byte(&input, cursor);
                    input.replace_range(start..end, "");
                    cursor -= 1;
                }
            }
            KeyCode::Left => {
                cursor = cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                cursor = (cursor + 1).min(input.chars().count());
            }
            KeyCode::Home => {
                cursor = 0;
            }
            KeyCode::End => {
                cursor = input.chars().count();
            }
            KeyCode::Esc => {
                input.clear();
                cursor = 0;
                history_cursor = None;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let byte = char_to_byte(&input, cursor);
                input.insert(byte, c);
                cursor += 1;
            }
            _ => {}
        }
    }

    typewriter.cancel_active();
    Ok(())
}

fn run_boot_sequence(ui: &UiConfig) {
    for line in BOOT_LINES {
        println!("{line}");
        if !ui.reduced_motion {
            thread::sleep(Duration::from_millis(120));
        }
    }
    println!();
}

/// Push the fully-revealed complete lines into native scrollback, keeping
/// the partial tail for the inline viewport. `final_flush` drains the tail
/// too (reveal finished or was cancelled).
fn flush_revealed_lines(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    revealed: &str,
    flushed_bytes: &mut usize,
    kind: RecordKind,
    final_flush: bool,
) -> Result<()> {
    let pending = &revealed[(*flushed_bytes).min(revealed.len())..];
    let complete = if final_flush {
        if pending.is_empty() {
            return Ok(());
        }
        *flushed_bytes = revealed.len();
        pending
    } else {
        let Some(last_nl) = pending.rfind('\n') else {
            return Ok(());
        };
        let complete = &pending[..last_nl];
        *flushed_bytes += last_nl + 1;
        complete
    };

    let lines: Vec<Line<'static>> = complete
        .split('\n')
        .map(|line| record_line(kind, line, ""))
        .collect();
    insert_lines_above(terminal, &lines)
}

fn insert_lines_above(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    lines: &[Line<'static>],
) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    let viewport_width = terminal.size()?.width.max(1);
    let height = lines
        .iter()
        .map(|line| u32::from(wrapped_rows(line.width(), viewport_width)))
        .sum::<u32>()
        .min(u32::from(u16::MAX)) as u16;
    if height == 0 {
        return Ok(());
    }
    terminal.insert_before(height, |buf| {
        let area = buf.area;
        let bottom = area.y.saturating_add(area.height);
        let mut y = area.y;
        for line in lines {
            if y >= bottom {
                break;
            }
            let rows = wrapped_rows(line.width(), area.width);
            let render_rows = rows.min(bottom.saturating_sub(y));
            if render_rows == 0 {
                break;
            }
            let line_area = Rect::new(area.x, y, area.width, render_rows);
            Paragraph::new(line.clone())
                .wrap(Wrap { trim: false })
                .render(line_area, buf);
            y = y.saturating_add(rows);
        }
    })?;
    Ok(())
}

fn wrapped_rows(text_width: usize, viewport_width: u16) -> u16 {
    let width = usize::from(viewport_width.max(1));
    (text_width.max(1).div_ceil(width)).min(usize::from(u16::MAX)) as u16
}

/// Style one transcript line by record kind. Command echoes repeat the
/// prompt and color slash commands apart from free text, matching the
/// transcript aesthetic of the web original.
fn record_line(kind: RecordKind, text: &str, prompt_label: &str) -> Line<'static> {
    match kind {
        RecordKind::Command => {
            let input_color = if text.starts_with('/') {
                Color::Cyan
            } else {
                Color::Yellow
            };
            Line::from(vec![
                Span::styled(
                    format!("{prompt_label} "),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(text.to_string(), Style::default().fg(input_color)),
            ])
        }
        RecordKind::Output => Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(Color::Green),
        )),
        RecordKind::Warning => Line::from(Span::styled(
            format!("WARNING: {text}"),
            Style::default().fg(Color::LightRed),
        )),
        RecordKind::Error => Line::from(Span::styled(
            format!("ERROR: {text}"),
            Style::default().fg(Color::LightRed),
        )),
    }
}

fn char_to_byte(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

fn with_cursor(input: &str, cursor: usize, visible: bool) -> String {
    let cursor_char = if visible { '█' } else { ' ' };
    let byte = char_to_byte(input, cursor);
    let mut shown = input.to_string();
    shown.insert(byte, cursor_char);
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_rows_counts_soft_wrap() {
        assert_eq!(wrapped_rows(0, 80), 1);
        assert_eq!(wrapped_rows(80, 80), 1);
        assert_eq!(wrapped_rows(81, 80), 2);
        assert_eq!(wrapped_rows(10, 0), 10);
    }

    #[test]
    fn command_lines_color_slash_input_apart_from_free_text() {
        let slash = record_line(RecordKind::Command, "/help", "guest@host:~$");
        let free = record_line(RecordKind::Command, "hello there", "guest@host:~$");
        assert_ne!(slash.spans[1].style.fg, free.spans[1].style.fg);
    }

    #[test]
    fn failure_lines_carry_their_prefix() {
        let error = record_line(RecordKind::Error, "nope", "");
        let warning = record_line(RecordKind::Warning, "careful", "");
        assert!(error.spans[0].content.starts_with("ERROR: "));
        assert!(warning.spans[0].content.starts_with("WARNING: "));
    }

    #[test]
    fn cursor_insertion_respects_multibyte_input() {
        let shown = with_cursor("héllo", 2, true);
        assert!(shown.contains('█'));
        assert_eq!(shown.chars().count(), 6);
    }
}
