//! weekdo user command implementation

use serde::Serialize;

use crate::app::App;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::user::User;

use super::task::{UnsavedReport, UNSAVED_WARNING};
use super::UserCommands;

#[derive(Serialize)]
struct UserListReport {
    users: Vec<User>,
}

#[derive(Serialize)]
struct UserChangeReport {
    user: User,
    users: usize,
}

pub async fn run(app: &App, command: UserCommands, output: OutputOptions) -> Result<()> {
    let registry = app.users();
    match command {
        UserCommands::List => {
            let users = registry.snapshot();
            let mut human = HumanOutput::new(format!("weekdo user list: {} users", users.len()));
            for user in &users {
                human.push_summary(format!("#{}", user.id.unwrap_or_default()), user.name.clone());
            }
            emit_success(output, "user list", &UserListReport { users }, Some(&human))
        }
        UserCommands::Add { name } => {
            let Some(id) = registry.add(&name).await? else {
                let name = name.trim().to_string();
                let mut human = HumanOutput::new(format!("weekdo user add: {name}"));
                human.push_warning(UNSAVED_WARNING);
                let report = UnsavedReport { input: name, saved: false };
                return emit_success(output, "user add", &report, Some(&human));
            };
            let users = registry.snapshot();
            let user = registry.find(id).ok_or(Error::UserNotFound(id))?;
            let mut human = HumanOutput::new(format!("weekdo user add: {}", user.name));
            human.push_summary("id", user.id.unwrap_or_default().to_string());
            human.push_next_step(format!(
                "weekdo task add <title> --user {}",
                user.id.unwrap_or_default()
            ));
            let report = UserChangeReport {
                user,
                users: users.len(),
            };
            emit_success(output, "user add", &report, Some(&human))
        }
        UserCommands::Rm { id } => {
            let user = registry.find(id).ok_or(Error::UserNotFound(id))?;
            registry.remove(id).await?;
            let mut human = HumanOutput::new(format!("weekdo user rm: {}", user.name));
            let assigned = app
                .tasks()
                .snapshot()
                .iter()
                .filter(|task| task.assignee_id == Some(id))
                .count();
            if assigned > 0 {
                human.push_warning(format!("{assigned} tasks still reference user #{id}"));
            }
            let report = UserChangeReport {
                user,
                users: registry.snapshot().len(),
            };
            emit_success(output, "user rm", &report, Some(&human))
        }
    }
}
