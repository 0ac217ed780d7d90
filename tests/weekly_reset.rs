mod support;

use chrono::{Datelike, Duration, Local, TimeZone, Timelike};
use weekdo::deadline::Weekday;
use weekdo::flags::{FlagStore, RESET_CHECKPOINT};
use weekdo::reset::{next_checkpoint, ResetOutcome, WeeklyReset};
use weekdo::task::NewTask;

use support::TestDir;

#[test]
fn checkpoint_is_always_a_future_sunday_at_2359() {
    let start = Local
        .with_ymd_and_hms(2024, 3, 4, 8, 0, 0)
        .single()
        .expect("valid local time");
    for hours in (0..24 * 14).step_by(5) {
        let now = start + Duration::hours(hours);
        let next = next_checkpoint(now);
        assert!(next > now);
        assert_eq!(next.weekday(), chrono::Weekday::Sun);
        assert_eq!((next.hour(), next.minute()), (23, 59));
        assert!(next - now <= Duration::days(7) + Duration::hours(1));
    }
}

#[tokio::test]
async fn missed_checkpoint_sweeps_once() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    let board = dir.board().await;
    for title in ["laundry", "groceries"] {
        board
            .add(NewTask {
                title: title.to_string(),
                category: Some("Home".to_string()),
                weekday: Some(Weekday::Saturday),
                ..NewTask::default()
            })
            .await?;
    }

    let flags = FlagStore::new(dir.path());
    let now = Local::now();
    let overdue = now - Duration::hours(1);
    flags.set(RESET_CHECKPOINT, &overdue.timestamp_millis().to_string())?;

    let reset = WeeklyReset::new(flags);
    let outcome = reset.check(&board, now).await?;
    assert!(matches!(outcome, ResetOutcome::Swept { removed: 2, .. }));
    assert!(board.snapshot().is_empty());
    assert!(dir.store().get_tasks().await?.is_empty());

    let stored = reset.checkpoint().expect("checkpoint stored");
    assert_eq!(stored.timestamp_millis(), next_checkpoint(now).timestamp_millis());

    let again = reset.check(&board, now).await?;
    assert!(matches!(again, ResetOutcome::Waiting { .. }));
    Ok(())
}

#[tokio::test]
async fn garbage_checkpoint_rearms_without_sweeping() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    let board = dir.board().await;
    board
        .add(NewTask {
            title: "keep me".to_string(),
            category: Some("Work".to_string()),
            weekday: Some(Weekday::Monday),
            ..NewTask::default()
        })
        .await?;
    dir.write_file("flags/weekly_reset_checkpoint", "yesterday-ish")?;

    let reset = WeeklyReset::new(FlagStore::new(dir.path()));
    let outcome = reset.check(&board, Local::now()).await?;
    assert!(matches!(outcome, ResetOutcome::Armed { .. }));
    assert_eq!(board.snapshot().len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_sweep_keeps_checkpoint_and_tasks() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    let board = dir.impatient_board().await;
    for title in ["water plants", "call mum"] {
        board
            .add(NewTask {
                title: title.to_string(),
                category: Some("Home".to_string()),
                weekday: Some(Weekday::Sunday),
                ..NewTask::default()
            })
            .await?;
    }

    let flags = FlagStore::new(dir.path());
    let now = Local::now();
    let overdue = now - Duration::minutes(5);
    flags.set(RESET_CHECKPOINT, &overdue.timestamp_millis().to_string())?;
    let reset = WeeklyReset::new(flags);

    let held = dir.hold_tasks_lock();
    let err = reset.check(&board, now).await.expect_err("sweep blocked");
    assert!(matches!(err, weekdo::Error::LockFailed(_)));
    assert_eq!(
        reset.checkpoint().map(|at| at.timestamp_millis()),
        Some(overdue.timestamp_millis())
    );
    assert_eq!(board.snapshot().len(), 2);
    assert_eq!(dir.store().get_tasks().await?.len(), 2);

    drop(held);
    let retried = reset.check(&board, now).await?;
    assert!(matches!(retried, ResetOutcome::Swept { removed: 2, .. }));
    assert!(board.snapshot().is_empty());
    Ok(())
}
