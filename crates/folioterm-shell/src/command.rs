use crate::handlers;
use folioterm_catalog::ProjectCatalog;
use folioterm_core::{CommandResult, HistoryEntry};

/// The closed set of builtin commands. Dispatch is a match on this enum, so
/// adding a command without wiring its handler fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Help,
    About,
    Skills,
    Projects,
    Project,
    Contact,
    Clear,
    Whoami,
    History,
    Coffee,
    Sudo,
    Exit,
}

impl Builtin {
    /// Resolve an already-lowercased token. The token must keep its leading
    /// slash — `"help"` does not resolve, `"/help"` does.
    pub fn parse(name: &str) -> Option<Self> {
        let cmd = match name {
            "/help" => Self::Help,
            "/about" => Self::About,
            "/skills" => Self::Skills,
            "/projects" => Self::Projects,
            "/project" => Self::Project,
            "/contact" => Self::Contact,
            "/clear" => Self::Clear,
            "/whoami" => Self::Whoami,
            "/history" => Self::History,
            "/coffee" => Self::Coffee,
            "/sudo" => Self::Sudo,
            "/exit" => Self::Exit,
            _ => return None,
        };
        Some(cmd)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Help => "/help",
            Self::About => "/about",
            Self::Skills => "/skills",
            Self::Projects => "/projects",
            Self::Project => "/project",
            Self::Contact => "/contact",
            Self::Clear => "/clear",
            Self::Whoami => "/whoami",
            Self::History => "/history",
            Self::Coffee => "/coffee",
            Self::Sudo => "/sudo",
            Self::Exit => "/exit",
        }
    }

    pub const fn all() -> &'static [Builtin] {
        &[
            Self::Help,
            Self::About,
            Self::Skills,
            Self::Projects,
            Self::Project,
            Self::Contact,
            Self::Clear,
            Self::Whoami,
            Self::History,
            Self::Coffee,
            Self::Sudo,
            Self::Exit,
        ]
    }

    /// Run the handler. Handlers read history and the catalog but never
    /// mutate session state — the dispatcher owns all mutation.
    pub fn run(
        self,
        args: &[String],
        history: &[HistoryEntry],
        catalog: &ProjectCatalog,
    ) -> CommandResult {
        match self {
            Self::Help => handlers::help(),
            Self::About => handlers::about(),
            Self::Skills => handlers::skills(),
            Self::Projects => handlers::projects(catalog),
            Self::Project => handlers::project(args, catalog),
            Self::Contact => handlers::contact(),
            Self::Clear => CommandResult::Clear,
            Self::Whoami => handlers::whoami(),
            Self::History => handlers::history(history),
            Self::Coffee => handlers::coffee(),
            Self::Sudo => handlers::sudo(),
            Self::Exit => handlers::exit(),
        }
    }
}
