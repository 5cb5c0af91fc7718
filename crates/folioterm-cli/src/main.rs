use anyhow::{Result, bail};
use clap::Parser;
use folioterm_catalog::ProjectCatalog;
use folioterm_core::{AppConfig, EventKind, OutputRecord, RecordKind, tokenize};
use folioterm_llm::HttpChatService;
use folioterm_observe::Observer;
use folioterm_shell::{CommandProcessor, RenderSink, Session};
use folioterm_ui::run_shell;

#[derive(Parser)]
#[command(name = "folioterm")]
#[command(about = "AI-powered portfolio terminal", long_about = None)]
struct Cli {
    /// Non-interactive mode: process one input line, print the rendered
    /// transcript to stdout, then exit.
    #[arg(short = 'p', long = "print")]
    print_mode: bool,

    /// Input for print mode (read from stdin when omitted).
    prompt: Vec<String>,

    /// Skip the boot sequence animation.
    #[arg(long = "skip-boot")]
    skip_boot: bool,

    /// Override the assistant endpoint for this invocation.
    #[arg(long)]
    endpoint: Option<String>,

    /// Enable verbose event logging to stderr.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let workspace = std::env::current_dir()?;
    let mut cfg = AppConfig::load(&workspace)?;
    if let Some(endpoint) = cli.endpoint.clone() {
        cfg.assistant.endpoint = endpoint;
    }

    let mut observer = Observer::new(&workspace)?;
    observer.set_verbose(cli.verbose);
    observer.record(EventKind::SessionStartedV1 {
        workspace: workspace.display().to_string(),
    });

    let catalog = ProjectCatalog::load(&workspace)?;
    let chat = HttpChatService::new(&cfg.assistant)?;
    let processor = CommandProcessor::new(catalog, Box::new(chat));

    if cli.print_mode {
        return run_print_mode(&cli, &processor, &observer);
    }
    run_shell(&cfg, processor, &observer, cli.skip_boot)
}

/// Plain renderer for print mode: records go straight to stdout with the
/// same prefixes the TUI uses.
struct StdoutSink;

impl RenderSink for StdoutSink {
    fn render(&mut self, record: &OutputRecord) {
        match record.kind {
            RecordKind::Command => println!("> {}", record.content),
            RecordKind::Output => println!("{}", record.content),
            RecordKind::Warning => println!("WARNING: {}", record.content),
            RecordKind::Error => println!("ERROR: {}", record.content),
        }
    }
}

fn run_print_mode(cli: &Cli, processor: &CommandProcessor, observer: &Observer) -> Result<()> {
    let input = if cli.prompt.is_empty() {
        let mut buffer = String::new();
        std::io::stdin().read_line(&mut buffer)?;
        buffer.trim().to_string()
    } else {
        cli.prompt.join(" ")
    };
    if input.is_empty() {
        bail!("no input provided");
    }

    let mut session = Session::new();
    session.mark_ready();
    observer.record(EventKind::InputSubmittedV1 {
        input: input.clone(),
    });

    let mut sink = StdoutSink;
    session.submit(&input, processor, &mut sink)?;

    let outcome = session
        .records()
        .last()
        .map(|record| match record.kind {
            RecordKind::Command => "command",
            RecordKind::Output => "output",
            RecordKind::Warning => "warning",
            RecordKind::Error => "error",
        })
        .unwrap_or("clear");
    observer.record(EventKind::CommandDispatchedV1 {
        name: tokenize(&input).name,
        outcome: outcome.to_string(),
    });
    Ok(())
}
