use assert_cmd::Command;
use std::fs;
use std::net::TcpListener;
use std::path::Path;
use tempfile::TempDir;

fn run_print(workspace: &Path, args: &[&str]) -> String {
    let output = Command::new(assert_cmd::cargo::cargo_bin!("folioterm"))
        .current_dir(workspace)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf8 stdout")
}

/// Point the assistant at a port that was just released, so free-text
/// input fails fast with a refused connection.
fn write_offline_settings(workspace: &Path) {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let runtime = workspace.join(".folioterm");
    fs::create_dir_all(&runtime).expect("runtime dir");
    fs::write(
        runtime.join("settings.local.json"),
        format!(r#"{{"assistant":{{"endpoint":"http://127.0.0.1:{port}/chat","timeout_seconds":2}}}}"#),
    )
    .expect("settings override");
}

#[test]
fn help_command_prints_the_command_listing() {
    let workspace = TempDir::new().expect("workspace");
    let stdout = run_print(workspace.path(), &["--print", "/help"]);
    assert!(stdout.contains("Available Commands"));
    assert!(stdout.contains("/projects"));
    // The command echo precedes the output.
    assert!(stdout.starts_with("> /help"));
}

#[test]
fn unknown_slash_command_is_an_error_naming_the_command() {
    let workspace = TempDir::new().expect("workspace");
    let stdout = run_print(workspace.path(), &["--print", "/warp_drive"]);
    assert!(stdout.contains("ERROR:"));
    assert!(stdout.contains("\"/warp_drive\""));
    assert!(stdout.contains("/help"));
}

#[test]
fn history_of_a_fresh_session_is_empty() {
    let workspace = TempDir::new().expect("workspace");
    let stdout = run_print(workspace.path(), &["--print", "/history"]);
    assert!(stdout.contains("No commands executed yet"));
}

#[test]
fn project_detail_resolves_case_insensitively() {
    let workspace = TempDir::new().expect("workspace");
    let stdout = run_print(workspace.path(), &["--print", "/project", "AI_Portfolio_Terminal"]);
    assert!(stdout.contains("AI PORTFOLIO TERMINAL"));
    assert!(stdout.contains("Technical Stack"));
}

#[test]
fn project_without_argument_prints_usage_error() {
    let workspace = TempDir::new().expect("workspace");
    let stdout = run_print(workspace.path(), &["--print", "/project"]);
    assert!(stdout.contains("ERROR:"));
    assert!(stdout.contains("Usage: /project"));
}

#[test]
fn sudo_is_rendered_as_a_warning() {
    let workspace = TempDir::new().expect("workspace");
    let stdout = run_print(workspace.path(), &["--print", "/sudo"]);
    assert!(stdout.contains("WARNING:"));
    assert!(stdout.contains("not in the sudoers file"));
}

#[test]
fn free_text_against_an_offline_assistant_reports_it_as_offline() {
    let workspace = TempDir::new().expect("workspace");
    write_offline_settings(workspace.path());
    let stdout = run_print(workspace.path(), &["--print", "hello", "there"]);
    assert!(stdout.contains("ERROR:"));
    assert!(stdout.contains("offline"));
}

#[test]
fn session_events_are_logged_to_the_runtime_dir() {
    let workspace = TempDir::new().expect("workspace");
    let _ = run_print(workspace.path(), &["--print", "/whoami"]);
    let log = fs::read_to_string(workspace.path().join(".folioterm/observe.log")).expect("log");
    assert!(log.contains("SessionStartedV1"));
    assert!(log.contains("CommandDispatchedV1"));
}
