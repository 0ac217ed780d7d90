//! weekdo task command implementation

use chrono::Local;
use serde::Serialize;

use crate::app::App;
use crate::deadline::{self, DeadlineForm};
use crate::edit::TitleEdit;
use crate::error::{Error, Result};
use crate::filter::{CategoryFilter, TaskFilter};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{NewTask, Task};

use super::TaskCommands;

/// Task as shown to the user
#[derive(Serialize)]
struct TaskView {
    position: usize,
    #[serde(flatten)]
    task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due: Option<String>,
}

#[derive(Serialize)]
struct TaskListReport {
    filter: TaskFilter,
    total: usize,
    tasks: Vec<TaskView>,
}

#[derive(Serialize)]
struct TaskReport {
    task: TaskView,
}

/// Input accepted while the local store is unavailable
#[derive(Serialize)]
pub(super) struct UnsavedReport {
    pub(super) input: String,
    pub(super) saved: bool,
}

pub(super) const UNSAVED_WARNING: &str = "local store unavailable; nothing was saved";

#[derive(Serialize)]
struct TaskRemovedReport {
    id: u64,
    remaining: usize,
}

#[derive(Serialize)]
struct TaskMovedReport {
    from: usize,
    to: usize,
    persisted: usize,
    failed: usize,
}

pub async fn run(app: &App, command: TaskCommands, output: OutputOptions) -> Result<()> {
    match command {
        TaskCommands::Add {
            title,
            category,
            user,
            weekday,
            time,
        } => {
            if let Some(user_id) = user {
                if app.users().find(user_id).is_none() {
                    return Err(Error::UserNotFound(user_id));
                }
            }
            let title = title.trim().to_string();
            let added = app
                .tasks()
                .add(NewTask {
                    title: title.clone(),
                    category,
                    assignee_id: user,
                    weekday,
                    time,
                })
                .await?;
            match added {
                Some(id) => emit_found(app, "task add", "added", id, output),
                None => {
                    let mut human = HumanOutput::new(format!("weekdo task add: {title}"));
                    human.push_warning(UNSAVED_WARNING);
                    let report = UnsavedReport { input: title, saved: false };
                    emit_success(output, "task add", &report, Some(&human))
                }
            }
        }
        TaskCommands::List {
            category,
            other,
            user,
        } => run_list(app, category, other, user, output),
        TaskCommands::Done { id } => {
            app.tasks().toggle_completed(id).await?;
            emit_found(app, "task done", "updated", id, output)
        }
        TaskCommands::Rename { id, title } => {
            let current = app.tasks().find(id).ok_or(Error::TaskNotFound(id))?;
            let mut edit = TitleEdit::default();
            edit.start(&current.title);
            edit.set_draft(&title);
            let title = edit.save().ok_or(Error::EmptyTitle)?;
            app.tasks().rename(id, &title).await?;
            emit_found(app, "task rename", "renamed", id, output)
        }
        TaskCommands::Rm { id } => {
            app.tasks().remove(id).await?;
            let report = TaskRemovedReport {
                id,
                remaining: app.tasks().snapshot().len(),
            };
            let mut human = HumanOutput::new(format!("weekdo task rm: #{id}"));
            human.push_summary("remaining", report.remaining.to_string());
            emit_success(output, "task rm", &report, Some(&human))
        }
        TaskCommands::Move { from, to } => {
            let from_index = position_to_index(from)?;
            let to_index = position_to_index(to)?;
            let moved = app.tasks().reorder(from_index, to_index).await?;
            let report = TaskMovedReport {
                from,
                to,
                persisted: moved.persisted,
                failed: moved.failed,
            };
            let mut human = HumanOutput::new(format!("weekdo task move: {from} -> {to}"));
            human.push_summary("persisted", moved.persisted.to_string());
            if moved.failed > 0 {
                human.push_warning(format!(
                    "{} task positions were not saved",
                    moved.failed
                ));
            }
            human.push_next_step("weekdo task list");
            emit_success(output, "task move", &report, Some(&human))
        }
        TaskCommands::Tag { id, categories } => {
            app.tasks().set_categories(id, &categories).await?;
            let task = app.tasks().find(id).ok_or(Error::TaskNotFound(id))?;
            let unknown: Vec<String> = task
                .categories
                .iter()
                .filter(|name| !app.categories().contains(name))
                .cloned()
                .collect();
            let item = view(app, position_of(app, id), task);
            let mut human = task_human(app, "weekdo task tag", &item);
            for name in unknown {
                human.push_warning(format!("category '{name}' is not in the category list"));
            }
            emit_success(output, "task tag", &TaskReport { task: item }, Some(&human))
        }
        TaskCommands::Assign { id, user } => {
            app.assign(id, user).await?;
            emit_found(app, "task assign", "assigned", id, output)
        }
        TaskCommands::Deadline {
            id,
            clear,
            weekday,
            start_date,
            start_time,
            end_date,
            end_time,
        } => {
            if clear {
                app.tasks().clear_deadline(id).await?;
            } else {
                let current = app.tasks().find(id).ok_or(Error::TaskNotFound(id))?;
                let mut form = current
                    .deadline
                    .as_ref()
                    .map(|existing| DeadlineForm::from_deadline(existing, app.today()))
                    .unwrap_or_default();
                if weekday.is_some() {
                    form.weekday = weekday;
                }
                if let Some(value) = start_date {
                    form.start_date = value;
                }
                if let Some(value) = start_time {
                    form.start_time = value;
                }
                if let Some(value) = end_date {
                    form.end_date = value;
                }
                if let Some(value) = end_time {
                    form.end_time = value;
                }
                app.tasks().set_deadline(id, &form).await?;
            }
            emit_found(app, "task deadline", "deadline", id, output)
        }
    }
}

fn run_list(
    app: &App,
    category: Option<String>,
    other: bool,
    user: Option<u64>,
    output: OutputOptions,
) -> Result<()> {
    let category = if other {
        CategoryFilter::Other
    } else {
        category
            .map(|label| app.category_filter(&label))
            .unwrap_or_default()
    };
    let filter = TaskFilter {
        category,
        user_id: user,
    };

    let all = app.tasks().snapshot();
    let tasks: Vec<TaskView> = app
        .filtered_tasks(&filter)
        .into_iter()
        .map(|task| {
            let position = task
                .id
                .and_then(|id| all.iter().position(|t| t.id == Some(id)))
                .map(|index| index + 1)
                .unwrap_or(0);
            view(app, position, task)
        })
        .collect();

    let mut human = HumanOutput::new(format!(
        "weekdo task list: {} of {} tasks",
        tasks.len(),
        all.len()
    ));
    human.push_summary("category", filter_label(app, &filter.category));
    if let Some(user_id) = user {
        let name = app
            .users()
            .find(user_id)
            .map(|u| u.name)
            .unwrap_or_else(|| format!("#{user_id}"));
        human.push_summary("user", name);
    }
    if let Some(name) = app.display_name() {
        human.push_summary("board", format!("{name}'s week"));
    }
    for item in &tasks {
        human.push_detail(task_line(item));
    }
    if all.is_empty() {
        human.push_next_step("weekdo task add <title> --category <name> --weekday <day>");
    }

    let report = TaskListReport {
        filter,
        total: all.len(),
        tasks,
    };
    emit_success(output, "task list", &report, Some(&human))
}

fn position_to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| Error::InvalidArgument("positions start at 1".to_string()))
}

fn position_of(app: &App, id: u64) -> usize {
    app.tasks()
        .snapshot()
        .iter()
        .position(|task| task.id == Some(id))
        .map(|index| index + 1)
        .unwrap_or(0)
}

fn view(app: &App, position: usize, task: Task) -> TaskView {
    let assignee = task
        .assignee_id
        .and_then(|id| app.users().find(id))
        .map(|user| user.name);
    let deadline_text = task.deadline.as_ref().map(|d| app.describe_deadline(d));
    let due = task
        .deadline
        .as_ref()
        .and_then(|d| deadline::due_hint(d, Local::now().naive_local()));
    TaskView {
        position,
        task,
        assignee,
        deadline_text,
        due,
    }
}

fn filter_label(app: &App, filter: &CategoryFilter) -> String {
    match filter {
        CategoryFilter::All => "All".to_string(),
        CategoryFilter::Named(name) => name.clone(),
        CategoryFilter::Other => app.config().categories.other_label.clone(),
    }
}

fn task_line(item: &TaskView) -> String {
    let task = &item.task;
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!(
        "{}. #{} [{mark}] {}",
        item.position,
        task.id.unwrap_or_default(),
        task.title
    );
    if !task.categories.is_empty() {
        line.push_str(&format!(" · {}", task.categories.join(", ")));
    }
    if let Some(assignee) = &item.assignee {
        line.push_str(&format!(" · @{assignee}"));
    }
    if let Some(text) = &item.deadline_text {
        line.push_str(&format!(" · {text}"));
    }
    if let Some(due) = &item.due {
        line.push_str(&format!(" ({due})"));
    }
    line
}

fn task_human(app: &App, header: &str, item: &TaskView) -> HumanOutput {
    let task = &item.task;
    let mut human = HumanOutput::new(format!("{header}: {}", task.title));
    human.push_summary("id", task.id.unwrap_or_default().to_string());
    human.push_summary("status", if task.completed { "done" } else { "open" });
    human.push_summary("categories", task.categories.join(", "));
    if let Some(assignee) = &item.assignee {
        human.push_summary("assignee", assignee.clone());
    }
    if let Some(text) = &item.deadline_text {
        human.push_summary("deadline", text.clone());
    }
    if item.deadline_text.as_deref() == Some(app.config().deadline.invalid_label.as_str()) {
        human.push_warning("stored deadline could not be read");
    }
    human
}

fn emit_task(
    app: &App,
    command: &str,
    verb: &str,
    position: usize,
    task: Task,
    output: OutputOptions,
) -> Result<()> {
    let item = view(app, position, task);
    let human = task_human(app, &format!("weekdo {command} ({verb})"), &item);
    emit_success(output, command, &TaskReport { task: item }, Some(&human))
}

fn emit_found(app: &App, command: &str, verb: &str, id: u64, output: OutputOptions) -> Result<()> {
    let task = app.tasks().find(id).ok_or(Error::TaskNotFound(id))?;
    emit_task(app, command, verb, position_of(app, id), task, output)
}
