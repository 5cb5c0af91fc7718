pub mod command;
pub mod handlers;
pub mod processor;
pub mod session;

pub use command::Builtin;
pub use processor::{CommandProcessor, assistant_error_message};
pub use session::{PendingSubmit, RenderSink, Session};
