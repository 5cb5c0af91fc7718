use chrono::Local;
use folioterm_catalog::{Project, ProjectCatalog};
use folioterm_core::{CommandResult, HistoryEntry};

const WELCOME_BANNER: &str = r"
     ╔═══════════════════════════════════════╗
     ║                                       ║
     ║         WELCOME TO MY PORTFOLIO       ║
     ║                                       ║
     ║          AI-Powered Interface         ║
     ║                                       ║
     ╚═══════════════════════════════════════╝";

const COFFEE_ART: &str = r"
                    (  )   (   )  )
                     ) (   )  (  (
                     ( )  (    ) )
                     _____________
                    <_____________> ___
                    |             |/ _ \
                    |               | | |
                    |               |_| |
                 ___|             |\___/
                /    \___________/    \
                \_____________________/";

pub fn help() -> CommandResult {
    CommandResult::output(format!(
        "{WELCOME_BANNER}

Available Commands:
────────────────────
/help              Show this help menu
/about             Learn about me and my journey
/skills            View my technical skills matrix
/projects          Browse my project portfolio
/project <name>    View specific project details
/contact           Get in touch with me
/whoami            Display current user info
/history           Show command history
/clear             Clear terminal screen

Easter Eggs:
────────────
/coffee            ☕ Coding fuel status
/sudo              🔒 Try root access
/exit              🚪 Attempt to exit

Pro tip: Use ↑/↓ arrow keys to navigate command history!"
    ))
}

pub fn about() -> CommandResult {
    CommandResult::output(
        "
╔══════════════════════════════════════════════════════════╗
║                        ABOUT ME                          ║
╚══════════════════════════════════════════════════════════╝

They say data is the new oil, and I'm an engineer who's not afraid to
get my hands dirty. I've spent my time wrangling messy systems and
coaxing insights out of them, proving fluency in both code and the art
of convincing a database to behave.

This portfolio is a collection of my proudest moments — things I've
built that actually work, not just on paper. From predictive analytics
to the occasional deep learning experiment, I'm here to turn complex
problems into elegant, and sometimes surprisingly funny, solutions.

Current Status: Building the future, one algorithm at a time 🚀
Location: Distributed across the digital realm
Favorite Quote: \"The best way to predict the future is to code it.\"",
    )
}

pub fn skills() -> CommandResult {
    CommandResult::output(
        "
╔══════════════════════════════════════════════════════════╗
║                    SKILL MATRIX                          ║
╚══════════════════════════════════════════════════════════╝

Programming Languages:
━━━━━━━━━━━━━━━━━━━━━━
Rust          ████████████████████ 95%
Python        ████████████████     80%
TypeScript    ███████████          55%
Go            ███████              40%

Systems & Infrastructure:
━━━━━━━━━━━━━━━━━━━━━━━━━
Linux         ███████████████████  90%
Docker        ███████████████████  90%
PostgreSQL    █████████████████    80%
Kubernetes    ██████████████       70%

AI/ML Tooling:
━━━━━━━━━━━━━━
PyTorch       ██████████████████   85%
Hugging Face  █████████████████    80%
LLM APIs      ████████████████████ 95%

Specializations:
━━━━━━━━━━━━━━━━
• Systems Programming
• Machine Learning Infrastructure
• Full-Stack Development
• System Design & Architecture",
    )
}

pub fn projects(catalog: &ProjectCatalog) -> CommandResult {
    let mut output = String::from(
        "
╔══════════════════════════════════════════════════════════╗
║                   PROJECT PORTFOLIO                      ║
╚══════════════════════════════════════════════════════════╝
",
    );
    for (index, project) in catalog.list().iter().enumerate() {
        output.push_str(&format!(
            "
{}. {}
   ├─ {}
   ├─ Tech: {}
   ├─ Status: {}
   └─ Category: {}

   Use: /project {}
",
            index + 1,
            project.name,
            project.description,
            project.tech_stack.join(", "),
            project.status,
            project.category.replace('_', " "),
            project.slug(),
        ));
    }
    CommandResult::output(output)
}

pub fn project(args: &[String], catalog: &ProjectCatalog) -> CommandResult {
    if args.is_empty() {
        return CommandResult::error(
            "Usage: /project <project_name> — run /projects to see what's available first.",
        );
    }
    let requested = args.join("_");
    let Some(project) = catalog.find(&requested) else {
        return CommandResult::error(format!(
            "Project \"{requested}\" not found. Use /projects to see available projects."
        ));
    };
    CommandResult::output(render_project(project))
}

fn render_project(project: &Project) -> String {
    let mut output = format!(
        "
╔══════════════════════════════════════════════════════════╗
║  {}
╚══════════════════════════════════════════════════════════╝
",
        project.name.to_uppercase()
    );
    if let Some(art) = &project.ascii_art {
        output.push_str(art);
        output.push('\n');
    }
    output.push_str(&format!("\nDescription:\n{}\n", project.description));
    output.push_str("\nTechnical Stack:\n");
    for tech in &project.tech_stack {
        output.push_str(&format!("• {tech}\n"));
    }
    if let Some(url) = &project.github_url {
        output.push_str(&format!("\nGitHub: {url}"));
    }
    if let Some(url) = &project.live_demo {
        output.push_str(&format!("\nLive Demo: {url}"));
    }
    if let Some(snippet) = &project.code_snippet {
        output.push_str(&format!("\n\nSnippet:\n{snippet}\n"));
    }
    output.push_str(&format!("\nStatus: {}", project.status));
    output
}

pub fn contact() -> CommandResult {
    CommandResult::output(
        "
╔══════════════════════════════════════════════════════════╗
║                     CONTACT INFO                         ║
╚══════════════════════════════════════════════════════════╝

📧 Email: hello@folioterm.dev
🌐 Website: you are looking at it right now
💼 LinkedIn: linkedin.com/in/folioterm
🐱 GitHub: github.com/example

💬 Always happy to discuss:
   • Systems and infrastructure projects
   • AI/ML collaborations
   • Open source contributions
   • Interesting technical challenges

Response time: Usually within 24 hours
Preferred contact: Email for professional inquiries

Status: Available for new opportunities! 🚀",
    )
}

pub fn whoami() -> CommandResult {
    CommandResult::output(
        "
User: guest
Groups: visitors
Access Level: public
Session: active
AI Assistant: online
Consciousness Level: questioning reality
Current Directory: /portfolio/awesome_developer
Shell: folioterm 0.1",
    )
}

pub fn history(entries: &[HistoryEntry]) -> CommandResult {
    if entries.is_empty() {
        return CommandResult::output("Command History:\nNo commands executed yet");
    }
    let lines: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| format!("  {}: {}", index + 1, entry.input))
        .collect();
    CommandResult::output(format!("Command History:\n{}", lines.join("\n")))
}

pub fn coffee() -> CommandResult {
    let date_label = Local::now().format("%a %b %d %Y").to_string();
    CommandResult::output(coffee_report(&date_label))
}

/// Daily stats derived from a stable hash of the date string, so every
/// `/coffee` on the same day reports the same numbers.
fn coffee_report(date_label: &str) -> String {
    let seed = date_seed(date_label);
    let cups = 3 + seed % 8;
    let caffeine = [
        "LOW",
        "MODERATE",
        "HIGH",
        "MAXIMUM OVERDRIVE",
        "DANGEROUSLY HIGH",
    ][(seed % 5) as usize];
    let quality = 0.65 + f64::from(seed % 30) / 100.0;
    let bugs_per_cup = 2.1 + f64::from(seed % 25) / 10.0;
    let next_refill = 5 + seed % 55;
    let status = [
        "FULLY CAFFEINATED AND READY TO CODE! 🚀",
        "COFFEE LEVELS: OPTIMAL FOR DEBUGGING! ☕",
        "RUNNING ON PURE CAFFEINE AND DETERMINATION! ⚡",
        "COFFEE.EXE IS RUNNING SMOOTHLY! 💻",
        "BEANS PROCESSED, BRAIN ACTIVATED! 🧠",
    ][(seed % 5) as usize];

    format!(
        "{COFFEE_ART}

☕ COFFEE STATUS REPORT ☕
━━━━━━━━━━━━━━━━━━━━━━━━━
Cups consumed today: {cups}
Current caffeine level: {caffeine}
Code quality correlation: +{quality:.2}
Bugs fixed per cup: {bugs_per_cup:.1}
Next refill in: {next_refill} minutes

Status: {status}"
    )
}

fn date_seed(date_label: &str) -> u32 {
    let mut hash: i32 = 0;
    for ch in date_label.chars() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(ch as i32);
    }
    hash.unsigned_abs()
}

pub fn sudo() -> CommandResult {
    CommandResult::warning(
        "sudo: sorry, user guest is not in the sudoers file. This incident will be reported. 🚨",
    )
}

pub fn exit() -> CommandResult {
    CommandResult::output(
        "
Attempting to exit...
Error: Cannot exit the Matrix.
You are now deeper in the rabbit hole.

There is no spoon... 🥄
There is only more code to explore!

Type /help to see what else you can discover.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use folioterm_core::CommandResult;

    #[test]
    fn history_renders_numbered_lines_in_submission_order() {
        let entries = vec![
            HistoryEntry::now("/help"),
            HistoryEntry::now("foo"),
            HistoryEntry::now("/skills"),
        ];
        let CommandResult::Output { text, .. } = history(&entries) else {
            panic!("history must produce output");
        };
        let numbered: Vec<&str> = text.lines().filter(|l| l.trim_start().starts_with(|c: char| c.is_ascii_digit())).collect();
        assert_eq!(numbered, vec!["  1: /help", "  2: foo", "  3: /skills"]);
    }

    #[test]
    fn history_of_empty_session_says_so() {
        let CommandResult::Output { text, .. } = history(&[]) else {
            panic!("history must produce output");
        };
        assert!(text.contains("No commands executed yet"));
    }

    #[test]
    fn project_without_argument_is_a_user_error_with_usage() {
        let catalog = ProjectCatalog::builtin();
        let CommandResult::Error { text } = project(&[], &catalog) else {
            panic!("missing argument must be an error");
        };
        assert!(text.contains("Usage: /project"));
    }

    #[test]
    fn project_joins_arguments_with_underscores() {
        let catalog = ProjectCatalog::builtin();
        let args = vec!["neural".to_string(), "network".to_string(), "visualizer".to_string()];
        let CommandResult::Output { text, .. } = project(&args, &catalog) else {
            panic!("known project must produce output");
        };
        assert!(text.contains("NEURAL NETWORK VISUALIZER"));
    }

    #[test]
    fn unknown_project_error_names_the_request() {
        let catalog = ProjectCatalog::builtin();
        let args = vec!["time_machine".to_string()];
        let CommandResult::Error { text } = project(&args, &catalog) else {
            panic!("unknown project must be an error");
        };
        assert!(text.contains("\"time_machine\""));
        assert!(text.contains("/projects"));
    }

    #[test]
    fn projects_listing_mentions_every_catalog_entry() {
        let catalog = ProjectCatalog::builtin();
        let CommandResult::Output { text, .. } = projects(&catalog) else {
            panic!("projects must produce output");
        };
        for entry in catalog.list() {
            assert!(text.contains(&entry.name));
            assert!(text.contains(&format!("/project {}", entry.slug())));
        }
    }

    #[test]
    fn coffee_report_is_deterministic_per_date() {
        let a = coffee_report("Wed Aug 06 2025");
        let b = coffee_report("Wed Aug 06 2025");
        assert_eq!(a, b);
        assert!(a.contains("COFFEE STATUS REPORT"));
    }

    #[test]
    fn sudo_is_a_single_line_warning() {
        let CommandResult::Warning { text } = sudo() else {
            panic!("sudo must warn");
        };
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("not in the sudoers file"));
    }
}
