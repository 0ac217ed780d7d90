//! Weekly score: completed tasks per weekday slot

use serde::Serialize;

use crate::deadline::Weekday;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayScore {
    pub weekday: Weekday,
    pub points: usize,
    /// Change from the previous listed day
    pub delta: i64,
}

/// Completed tasks, regardless of deadline
pub fn points(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| task.completed).count()
}

/// Points per weekday for completed tasks scheduled on a bare weekday slot.
///
/// Days run Monday to Sunday and days without points are left out.
pub fn score_by_day(tasks: &[Task]) -> Vec<DayScore> {
    let mut counts = [0usize; 7];
    for task in tasks.iter().filter(|task| task.completed) {
        if let Some(weekday) = task.deadline.as_ref().and_then(|d| d.weekday_slot()) {
            counts[weekday.index()] += 1;
        }
    }

    let mut scores = Vec::new();
    let mut previous = 0i64;
    for weekday in Weekday::ALL {
        let points = counts[weekday.index()];
        if points == 0 {
            continue;
        }
        let current = points as i64;
        scores.push(DayScore {
            weekday,
            points,
            delta: current - previous,
        });
        previous = current;
    }
    scores
}
