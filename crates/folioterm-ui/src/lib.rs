mod shell;
mod typewriter;

pub use shell::{WELCOME_TEXT, run_shell};
pub use typewriter::{RenderEvent, Typewriter};
