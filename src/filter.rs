//! Task list filtering by category and assignee

use serde::Serialize;

use crate::task::Task;

/// Category selection for the task list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact category name
    Named(String),
    /// Any category outside the default set
    Other,
}

impl CategoryFilter {
    /// Map a selection label to a filter. `All` (any case) or a blank label
    /// selects everything; `other_label` selects [`CategoryFilter::Other`].
    pub fn parse(label: &str, other_label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else if label == other_label {
            CategoryFilter::Other
        } else {
            CategoryFilter::Named(label.to_string())
        }
    }

    pub fn matches(&self, task: &Task, defaults: &[String]) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => task.has_category(name),
            CategoryFilter::Other => task
                .categories
                .iter()
                .any(|category| !defaults.contains(category)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskFilter {
    pub category: CategoryFilter,
    pub user_id: Option<u64>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, defaults: &[String]) -> bool {
        if let Some(user_id) = self.user_id {
            if task.assignee_id != Some(user_id) {
                return false;
            }
        }
        self.category.matches(task, defaults)
    }
}

/// Tasks passing `filter`, in stored order.
pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter, defaults: &[String]) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task, defaults))
        .cloned()
        .collect()
}
