//! Weekly reset
//!
//! Once a week (Sunday 23:59 local time) every task is deleted. The next
//! reset instant is kept in flag storage as epoch milliseconds, so a missed
//! reset fires on the first check after it.

use std::time::Duration;

use chrono::{DateTime, Datelike, Local, LocalResult, NaiveDateTime, NaiveTime, TimeZone};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::flags::{FlagStore, RESET_CHECKPOINT};
use crate::task::TaskBoard;

/// Minutes after midnight of the Sunday reset (23:59)
const RESET_MINUTE_OF_DAY: i64 = 23 * 60 + 59;

/// First Sunday 23:59 strictly after `now`.
pub fn next_checkpoint(now: DateTime<Local>) -> DateTime<Local> {
    let days_ahead = (7 - now.weekday().num_days_from_sunday()) % 7;
    let sunday = now.date_naive() + chrono::Duration::days(i64::from(days_ahead));
    let mut candidate =
        sunday.and_time(NaiveTime::MIN) + chrono::Duration::minutes(RESET_MINUTE_OF_DAY);
    if candidate <= now.naive_local() {
        candidate += chrono::Duration::days(7);
    }
    resolve_local(candidate)
}

fn resolve_local(naive: NaiveDateTime) -> DateTime<Local> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Skipped by a DST jump; read the wall time as UTC instead.
        LocalResult::None => Local.from_utc_datetime(&naive),
    }
}

/// Result of one reset check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResetOutcome {
    /// No usable checkpoint existed; one was stored, nothing deleted.
    Armed { next: DateTime<Local> },
    /// Checkpoint still in the future.
    Waiting { next: DateTime<Local> },
    Swept { removed: usize, next: DateTime<Local> },
}

#[derive(Debug, Clone)]
pub struct WeeklyReset {
    flags: FlagStore,
}

impl WeeklyReset {
    pub fn new(flags: FlagStore) -> Self {
        Self { flags }
    }

    /// Stored checkpoint, if present and readable.
    pub fn checkpoint(&self) -> Option<DateTime<Local>> {
        let raw = self.flags.get(RESET_CHECKPOINT)?;
        let Ok(millis) = raw.trim().parse::<i64>() else {
            warn!(value = raw.trim(), "unparseable reset checkpoint");
            return None;
        };
        Local.timestamp_millis_opt(millis).single()
    }

    fn store_checkpoint(&self, next: DateTime<Local>) -> Result<()> {
        self.flags
            .set(RESET_CHECKPOINT, &next.timestamp_millis().to_string())
    }

    /// One tick: arm, wait, or sweep every task and move the checkpoint on.
    ///
    /// A failed sweep leaves the checkpoint untouched so the next tick
    /// retries.
    pub async fn check(&self, board: &TaskBoard, now: DateTime<Local>) -> Result<ResetOutcome> {
        let Some(checkpoint) = self.checkpoint() else {
            let next = next_checkpoint(now);
            self.store_checkpoint(next)?;
            info!(next = %next, "weekly reset armed");
            return Ok(ResetOutcome::Armed { next });
        };

        if now < checkpoint {
            return Ok(ResetOutcome::Waiting { next: checkpoint });
        }

        let removed = board.clear_all().await?;
        let next = next_checkpoint(now);
        self.store_checkpoint(next)?;
        info!(removed, next = %next, "weekly reset swept tasks");
        Ok(ResetOutcome::Swept { removed, next })
    }

    /// Check now and then every `period`, forever.
    pub async fn run(&self, board: &TaskBoard, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.check(board, Local::now()).await {
                error!(error = %err, "weekly reset check failed; retrying next tick");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::Weekday;
    use crate::storage::LocalStore;
    use crate::task::{NewTask, TaskRules};
    use chrono::{NaiveDate, Timelike};
    use tempfile::tempdir;

    fn local(date: &str, hour: u32, minute: u32, second: u32) -> DateTime<Local> {
        let naive = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .expect("date")
            .and_hms_opt(hour, minute, second)
            .expect("time");
        Local
            .from_local_datetime(&naive)
            .earliest()
            .expect("local time")
    }

    async fn board_with_tasks(dir: &std::path::Path, count: usize) -> TaskBoard {
        let board = TaskBoard::load(LocalStore::new(dir), TaskRules::default())
            .await
            .expect("board");
        for n in 0..count {
            board
                .add(NewTask {
                    title: format!("task {n}"),
                    category: Some("Home".to_string()),
                    weekday: Some(Weekday::Monday),
                    ..NewTask::default()
                })
                .await
                .expect("add");
        }
        board
    }

    #[test]
    fn midweek_points_to_coming_sunday() {
        let next = next_checkpoint(local("2024-01-03", 10, 0, 0));
        assert_eq!(next.date_naive().to_string(), "2024-01-07");
        assert_eq!((next.hour(), next.minute()), (23, 59));
    }

    #[test]
    fn sunday_before_reset_is_same_day() {
        let next = next_checkpoint(local("2024-01-07", 9, 30, 0));
        assert_eq!(next.date_naive().to_string(), "2024-01-07");
    }

    #[test]
    fn at_or_after_reset_moves_a_week() {
        let at = next_checkpoint(local("2024-01-07", 23, 59, 0));
        assert_eq!(at.date_naive().to_string(), "2024-01-14");
        let after = next_checkpoint(local("2024-01-07", 23, 59, 30));
        assert_eq!(after.date_naive().to_string(), "2024-01-14");
    }

    #[tokio::test]
    async fn missing_checkpoint_arms_without_sweeping() {
        let dir = tempdir().expect("tempdir");
        let board = board_with_tasks(dir.path(), 2).await;
        let reset = WeeklyReset::new(FlagStore::new(dir.path()));

        let now = local("2024-01-03", 10, 0, 0);
        let outcome = reset.check(&board, now).await.expect("check");
        assert!(matches!(outcome, ResetOutcome::Armed { .. }));
        assert_eq!(board.snapshot().len(), 2);
        assert_eq!(reset.checkpoint(), Some(next_checkpoint(now)));
    }

    #[tokio::test]
    async fn unparseable_checkpoint_is_rearmed() {
        let dir = tempdir().expect("tempdir");
        let board = board_with_tasks(dir.path(), 1).await;
        let flags = FlagStore::new(dir.path());
        flags.set(RESET_CHECKPOINT, "soon").expect("set");
        let reset = WeeklyReset::new(flags);

        let outcome = reset.check(&board, Local::now()).await.expect("check");
        assert!(matches!(outcome, ResetOutcome::Armed { .. }));
        assert_eq!(board.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn future_checkpoint_waits() {
        let dir = tempdir().expect("tempdir");
        let board = board_with_tasks(dir.path(), 1).await;
        let reset = WeeklyReset::new(FlagStore::new(dir.path()));
        let now = local("2024-01-03", 10, 0, 0);
        reset.check(&board, now).await.expect("arm");

        let later = local("2024-01-05", 8, 0, 0);
        let outcome = reset.check(&board, later).await.expect("check");
        assert!(matches!(outcome, ResetOutcome::Waiting { .. }));
        assert_eq!(board.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn due_checkpoint_sweeps_and_moves_on() {
        let dir = tempdir().expect("tempdir");
        let board = board_with_tasks(dir.path(), 3).await;
        let flags = FlagStore::new(dir.path());
        let now = Local::now();
        let past = now.timestamp_millis() - 60_000;
        flags.set(RESET_CHECKPOINT, &past.to_string()).expect("set");
        let reset = WeeklyReset::new(flags);

        let outcome = reset.check(&board, now).await.expect("sweep");
        let ResetOutcome::Swept { removed, next } = outcome else {
            panic!("expected sweep, got {outcome:?}");
        };
        assert_eq!(removed, 3);
        assert!(board.snapshot().is_empty());
        assert!(next > now);
        assert_eq!(next.weekday(), chrono::Weekday::Sun);
        assert_eq!((next.hour(), next.minute()), (23, 59));
        assert_eq!(reset.checkpoint(), Some(next));
    }

    #[tokio::test]
    async fn run_arms_on_first_tick() {
        let dir = tempdir().expect("tempdir");
        let board = board_with_tasks(dir.path(), 0).await;
        let reset = WeeklyReset::new(FlagStore::new(dir.path()));

        let ran = tokio::time::timeout(
            Duration::from_millis(200),
            reset.run(&board, Duration::from_millis(20)),
        )
        .await;
        assert!(ran.is_err());
        assert!(reset.checkpoint().is_some());
    }
}
