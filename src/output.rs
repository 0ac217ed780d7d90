//! Shared output formatting for weekdo CLI commands.

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "weekdo.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
            },
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Tasks", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// Best-effort command name for error envelopes, read before clap parses.
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

fn command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut skip_value = false;
    let mut positional = Vec::new();

    for arg in args {
        if skip_value {
            skip_value = false;
            continue;
        }
        if arg == "--data-dir" || arg == "--config" {
            skip_value = true;
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        positional.push(arg);
        if positional.len() == 2 || !has_subcommands(&positional[0]) {
            break;
        }
    }

    if positional.is_empty() {
        "weekdo".to_string()
    } else {
        positional.join(" ")
    }
}

fn has_subcommands(command: &str) -> bool {
    matches!(command, "task" | "category" | "user" | "reset")
}

fn error_kind(err: &Error) -> &'static str {
    if err.is_validation() {
        "user_error"
    } else {
        "operation_failed"
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::TaskNotFound(_) => vec!["weekdo task list".to_string()],
        Error::UserNotFound(_) => vec!["weekdo user list".to_string()],
        Error::MissingCategory => vec!["weekdo task add <title> --category <name>".to_string()],
        Error::MissingSchedule => vec!["weekdo task add <title> --weekday <day>".to_string()],
        Error::MissingAssignee => vec!["weekdo task add <title> --user <id>".to_string()],
        Error::InvalidConfig(_) | Error::TomlParse(_) => {
            vec!["fix weekdo.toml then retry".to_string()]
        }
        Error::LockFailed(_) => vec!["retry once the other weekdo process finishes".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn command_name_skips_global_flags() {
        assert_eq!(
            command_name(args(&["--data-dir", "/tmp/x", "--json", "task", "add", "milk"])),
            "task add"
        );
        assert_eq!(command_name(args(&["score"])), "score");
        assert_eq!(command_name(args(&["name", "Joana"])), "name");
        assert_eq!(command_name(args(&["--quiet"])), "weekdo");
    }

    #[test]
    fn human_output_sections() {
        let mut human = HumanOutput::new("weekdo task list: 1 task");
        human.push_summary("filter", "All");
        human.push_detail("#1 [ ] milk");
        human.push_next_step("weekdo task done 1");

        let text = format_human(&human);
        assert!(text.starts_with("weekdo task list: 1 task"));
        assert!(text.contains("- filter: All"));
        assert!(text.contains("Tasks:\n- #1 [ ] milk"));
        assert!(text.contains("Next steps:\n- weekdo task done 1"));
    }

    #[test]
    fn error_kind_follows_validation() {
        assert_eq!(error_kind(&Error::EmptyTitle), "user_error");
        assert_eq!(
            error_kind(&Error::Storage("disk".to_string())),
            "operation_failed"
        );
        assert_eq!(error_next_steps(&Error::TaskNotFound(3)), vec!["weekdo task list"]);
    }
}
