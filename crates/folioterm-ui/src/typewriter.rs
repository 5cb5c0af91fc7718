use folioterm_core::OutputRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Updates emitted while a record's content is revealed. Consumers redraw
/// (and auto-scroll) on every `Increment` and finalize on `Completed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// The visible prefix of the record's content grew.
    Increment { record_id: u64, revealed: String },
    /// The reveal finished — emitted exactly once per rendered record.
    /// A cancelled reveal still finishes fully revealed, never partial.
    Completed { record_id: u64, cancelled: bool },
}

/// Timed reveal generator for the typing effect, decoupled from the
/// display: its whole contract is the `RenderEvent` stream plus
/// cancellation. At most one reveal runs at a time — starting a new one
/// cancels (and fully reveals) the previous record first.
pub struct Typewriter {
    interval: Duration,
    chunk_chars: usize,
    instant: bool,
    tx: mpsc::Sender<RenderEvent>,
    active: Option<ActiveReveal>,
}

struct ActiveReveal {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Typewriter {
    pub fn new(
        interval_ms: u64,
        chunk_chars: usize,
        instant: bool,
        tx: mpsc::Sender<RenderEvent>,
    ) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms.max(1)),
            chunk_chars: chunk_chars.max(1),
            instant,
            tx,
            active: None,
        }
    }

    /// Start revealing `record`. Not restartable once started, but
    /// cancellable by the next `render` or an explicit `cancel_active`.
    pub fn render(&mut self, record: &OutputRecord) {
        self.cancel_active();

        if self.instant || !record.streaming || record.content.is_empty() {
            let _ = self.tx.send(RenderEvent::Increment {
                record_id: record.id,
                revealed: record.content.clone(),
            });
            let _ = self.tx.send(RenderEvent::Completed {
                record_id: record.id,
                cancelled: false,
            });
            return;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);
        let tx = self.tx.clone();
        let content = record.content.clone();
        let record_id = record.id;
        let interval = self.interval;
        let chunk = self.chunk_chars;

        let handle = thread::spawn(move || {
            let chars: Vec<char> = content.chars().collect();
            let mut shown = 0_usize;
            while shown < chars.len() {
                if worker_cancel.load(Ordering::SeqCst) {
                    // Cancelled mid-stream: jump to fully revealed.
                    let _ = tx.send(RenderEvent::Increment {
                        record_id,
                        revealed: content.clone(),
                    });
                    let _ = tx.send(RenderEvent::Completed {
                        record_id,
                        cancelled: true,
                    });
                    return;
                }
                shown = (shown + chunk).min(chars.len());
                let revealed: String = chars[..shown].iter().collect();
                if tx
                    .send(RenderEvent::Increment {
                        record_id,
                        revealed,
                    })
                    .is_err()
                {
                    return;
                }
                thread::sleep(interval);
            }
            let _ = tx.send(RenderEvent::Completed {
                record_id,
                cancelled: false,
            });
        });

        self.active = Some(ActiveReveal { cancel, handle });
    }

    /// Cancel the in-flight reveal, blocking until its final events are
    /// queued. This is what guarantees a cancelled record's events all
    /// precede the next record's.
    pub fn cancel_active(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.store(true, Ordering::SeqCst);
            let _ = active.handle.join();
        }
    }
}

impl Drop for Typewriter {
    fn drop(&mut self) {
        self.cancel_active();
    }
}
