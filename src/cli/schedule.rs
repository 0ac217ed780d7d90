//! weekdo score, reset and name commands

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use crate::app::App;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::reset::ResetOutcome;
use crate::score::{self, DayScore};

use super::ResetCommands;

#[derive(Serialize)]
struct ScoreReport {
    points: usize,
    days: Vec<DayScore>,
}

#[derive(Serialize)]
struct ResetReport {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ResetOutcome>,
}

#[derive(Serialize)]
struct NameReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

pub fn run_score(app: &App, output: OutputOptions) -> Result<()> {
    let tasks = app.tasks().snapshot();
    let report = ScoreReport {
        points: score::points(&tasks),
        days: score::score_by_day(&tasks),
    };

    let mut human = HumanOutput::new(format!("weekdo score: {} points", report.points));
    for day in &report.days {
        human.push_summary(day.weekday.label(), format!("{} ({:+})", day.points, day.delta));
    }
    if report.days.is_empty() {
        human.push_next_step("weekdo task done <id>");
    }
    emit_success(output, "score", &report, Some(&human))
}

pub async fn run_reset(app: &App, command: ResetCommands, output: OutputOptions) -> Result<()> {
    let config = &app.config().reset;
    match command {
        ResetCommands::Check => {
            if !config.enabled {
                let mut human = HumanOutput::new("weekdo reset check: disabled");
                human.push_next_step("set reset.enabled = true in weekdo.toml");
                let report = ResetReport {
                    enabled: false,
                    result: None,
                };
                return emit_success(output, "reset check", &report, Some(&human));
            }

            let outcome = app
                .weekly_reset()
                .check(app.tasks(), Local::now())
                .await?;
            let human = reset_human(&outcome);
            let report = ResetReport {
                enabled: true,
                result: Some(outcome),
            };
            emit_success(output, "reset check", &report, Some(&human))
        }
        ResetCommands::Watch { interval_secs } => {
            if !config.enabled {
                return Err(Error::InvalidArgument(
                    "weekly reset is disabled in weekdo.toml".to_string(),
                ));
            }
            let secs = interval_secs.unwrap_or(config.check_interval_secs);
            if secs == 0 {
                return Err(Error::InvalidArgument(
                    "--interval-secs must be > 0".to_string(),
                ));
            }

            info!(interval_secs = secs, "watching weekly reset");
            let reset = app.weekly_reset();
            tokio::select! {
                _ = reset.run(app.tasks(), Duration::from_secs(secs)) => {}
                signal = tokio::signal::ctrl_c() => signal?,
            }

            let human = HumanOutput::new("weekdo reset watch: stopped");
            let report = ResetReport {
                enabled: true,
                result: None,
            };
            emit_success(output, "reset watch", &report, Some(&human))
        }
    }
}

fn reset_human(outcome: &ResetOutcome) -> HumanOutput {
    match outcome {
        ResetOutcome::Armed { next } => {
            let mut human = HumanOutput::new("weekdo reset check: armed");
            human.push_summary("next reset", show(next));
            human
        }
        ResetOutcome::Waiting { next } => {
            let mut human = HumanOutput::new("weekdo reset check: waiting");
            human.push_summary("next reset", show(next));
            human
        }
        ResetOutcome::Swept { removed, next } => {
            let mut human = HumanOutput::new("weekdo reset check: swept");
            human.push_summary("removed", removed.to_string());
            human.push_summary("next reset", show(next));
            human
        }
    }
}

fn show(instant: &DateTime<Local>) -> String {
    instant.format("%A %d %b %Y %H:%M").to_string()
}

pub fn run_name(app: &App, name: Option<String>, output: OutputOptions) -> Result<()> {
    let (command, name) = match name {
        Some(name) => ("name set", Some(app.set_display_name(&name)?)),
        None => ("name", app.display_name()),
    };

    let human = match &name {
        Some(name) => HumanOutput::new(format!("weekdo {command}: {name}")),
        None => {
            let mut human = HumanOutput::new(format!("weekdo {command}: not set"));
            human.push_next_step("weekdo name <your name>");
            human
        }
    };
    emit_success(output, command, &NameReport { name }, Some(&human))
}
