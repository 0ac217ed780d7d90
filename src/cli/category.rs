//! weekdo category command implementation

use serde::Serialize;

use crate::app::App;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::CategoryCommands;

#[derive(Serialize)]
struct CategoryListReport {
    categories: Vec<String>,
    defaults: Vec<String>,
    other_label: String,
}

#[derive(Serialize)]
struct CategoryChangeReport {
    name: String,
    changed: bool,
    categories: Vec<String>,
}

pub async fn run(app: &App, command: CategoryCommands, output: OutputOptions) -> Result<()> {
    let registry = app.categories();
    match command {
        CategoryCommands::List => {
            let report = CategoryListReport {
                categories: registry.snapshot(),
                defaults: registry.defaults().to_vec(),
                other_label: app.config().categories.other_label.clone(),
            };
            let mut human = HumanOutput::new(format!(
                "weekdo category list: {} categories",
                report.categories.len()
            ));
            for name in &report.categories {
                human.push_summary(name.clone(), "");
            }
            emit_success(output, "category list", &report, Some(&human))
        }
        CategoryCommands::Add { name } => {
            let changed = registry.add(&name).await?;
            let name = name.trim().to_string();
            let mut human = HumanOutput::new(format!("weekdo category add: {name}"));
            if !changed {
                human.push_warning(format!("category '{name}' already exists"));
            }
            emit_change(output, "category add", name, changed, registry.snapshot(), human)
        }
        CategoryCommands::Rm { name } => {
            let changed = registry.remove(&name).await?;
            let mut human = HumanOutput::new(format!("weekdo category rm: {name}"));
            if !changed {
                human.push_warning(format!("category '{name}' was not in the list"));
            } else if registry.defaults().contains(&name) {
                human.push_warning(format!(
                    "'{name}' is a default category and comes back on the next load"
                ));
            }
            emit_change(output, "category rm", name, changed, registry.snapshot(), human)
        }
        CategoryCommands::Reorder { names } => {
            registry.reorder(names).await?;
            let categories = registry.snapshot();
            let mut human = HumanOutput::new("weekdo category reorder");
            for name in &categories {
                human.push_summary(name.clone(), "");
            }
            emit_success(output, "category reorder", &categories, Some(&human))
        }
    }
}

fn emit_change(
    output: OutputOptions,
    command: &str,
    name: String,
    changed: bool,
    categories: Vec<String>,
    mut human: HumanOutput,
) -> Result<()> {
    human.push_summary("categories", categories.join(", "));
    let report = CategoryChangeReport {
        name,
        changed,
        categories,
    };
    emit_success(output, command, &report, Some(&human))
}
