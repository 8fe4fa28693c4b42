//! End-to-end lifecycle tests: schedule → fire → outcome, restart
//! recovery, and cancellation against live timers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use wisp::scheduler::now_epoch_millis;
use wisp::{
    EventKind, Goal, GoalCategory, GoalHooks, GoalMemory, GoalOutcome, GoalScheduler, MemoryPhase,
    MemoryStore, Mood, SchedulerConfig, TimeWindow,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        sweep_interval_secs: 1,
        // Any non-empty window gets a midpoint check.
        midpoint_check_threshold_min: 0,
        ..SchedulerConfig::default()
    }
}

#[tokio::test]
async fn full_lifecycle_produces_signals_memories_and_outcome() {
    let (memory_tx, mut memory_rx) = mpsc::unbounded_channel::<GoalMemory>();
    let scheduler = GoalScheduler::new(MemoryStore::new(), memory_tx).with_config(fast_config());
    let mut signals = scheduler.subscribe();

    let outcome_slot: Arc<Mutex<Option<GoalOutcome>>> = Arc::new(Mutex::new(None));
    let started: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let outcome_sink = Arc::clone(&outcome_slot);
    let started_sink = Arc::clone(&started);
    let hooks = GoalHooks::new()
        .on_start(move |goal| {
            *started_sink.lock().unwrap() = Some(goal.title.clone());
        })
        .on_end(move |outcome| {
            *outcome_sink.lock().unwrap() = Some(outcome.clone());
        });

    let now = now_epoch_millis();
    let goal = Goal::new("solidity", "Learn Solidity", GoalCategory::Learning, 8)
        .with_description("smart contract basics");
    assert!(scheduler.schedule_goal_with_hooks(
        goal,
        TimeWindow::new(now + 100, now + 500),
        hooks
    ));

    for expected in [EventKind::GoalStart, EventKind::GoalCheck, EventKind::GoalEnd] {
        let signal = timeout(RECV_TIMEOUT, signals.recv())
            .await
            .expect("signal within timeout")
            .expect("channel open");
        assert_eq!(signal.kind, expected);
        assert_eq!(signal.goal_id, "solidity");
    }

    assert_eq!(started.lock().unwrap().as_deref(), Some("Learn Solidity"));

    let start_memory = memory_rx.try_recv().expect("start memory");
    assert_eq!(start_memory.phase, MemoryPhase::Started);
    // Priority 8 is not above 8, so the learning category picks the mood.
    assert_eq!(start_memory.mood, Mood::Curious);
    assert_eq!(start_memory.emotional_weight, 16);
    assert_eq!(start_memory.importance, 80);

    let end_memory = memory_rx.try_recv().expect("end memory");
    assert_eq!(end_memory.phase, MemoryPhase::Completed);

    let outcome = outcome_slot.lock().unwrap().clone().expect("outcome delivered");
    assert_eq!(outcome.goal_id, "solidity");
    assert_eq!(outcome.success, outcome.efficiency > 50);
    assert_eq!(
        end_memory.mood,
        if outcome.success {
            Mood::Accomplished
        } else {
            Mood::Frustrated
        }
    );
    assert!(outcome.efficiency < 130);
    assert!(!outcome.next_actions.is_empty());
    assert!(scheduler.scheduled_events().is_empty());
}

#[tokio::test]
async fn restart_rearms_pending_timers() {
    let store = Arc::new(MemoryStore::new());

    // First process: schedule and persist, then go away.
    let (memory_tx, _memory_rx) = mpsc::unbounded_channel();
    let first = GoalScheduler::new(Arc::clone(&store), memory_tx);
    let now = now_epoch_millis();
    let goal = Goal::new("resume", "Resumable goal", GoalCategory::Work, 5);
    assert!(first.schedule_goal(goal, TimeWindow::new(now + 400, now + 600_000)));
    first.save().expect("save");
    drop(first);

    // Second process: restore from the same store.
    let (memory_tx, _memory_rx) = mpsc::unbounded_channel();
    let second = GoalScheduler::new(Arc::clone(&store), memory_tx).with_config(SchedulerConfig {
        // Long sweep so the re-armed timer is the only firing path.
        sweep_interval_secs: 3_600,
        ..SchedulerConfig::default()
    });
    let mut signals = second.subscribe();
    let sweep = second.start();

    // The end event sits far in the future, so at least it is pending.
    assert!(!second.scheduled_events().is_empty());

    let signal = timeout(RECV_TIMEOUT, signals.recv())
        .await
        .expect("re-armed start timer fired")
        .expect("channel open");
    assert_eq!(signal.kind, EventKind::GoalStart);
    assert_eq!(signal.goal_id, "resume");

    sweep.abort();
}

#[tokio::test]
async fn overdue_restored_events_fire_on_first_sweep() {
    let store = Arc::new(MemoryStore::new());

    let (memory_tx, _memory_rx) = mpsc::unbounded_channel();
    let first = GoalScheduler::new(Arc::clone(&store), memory_tx);
    let now = now_epoch_millis();
    let goal = Goal::new("overdue", "Already due", GoalCategory::Personal, 3);
    assert!(first.schedule_goal(goal, TimeWindow::new(now + 50, now + 90)));
    first.save().expect("save while still pending");
    drop(first);

    // Let both scheduled times slip into the past before restoring.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let (memory_tx, _memory_rx) = mpsc::unbounded_channel();
    let second =
        GoalScheduler::new(Arc::clone(&store), memory_tx).with_config(fast_config());
    let mut signals = second.subscribe();
    let sweep = second.start();

    // The first sweep tick fires immediately and catches both events.
    for expected in [EventKind::GoalStart, EventKind::GoalEnd] {
        let signal = timeout(RECV_TIMEOUT, signals.recv())
            .await
            .expect("sweep fired overdue event")
            .expect("channel open");
        assert_eq!(signal.kind, expected);
        assert_eq!(signal.goal_id, "overdue");
    }
    assert!(second.scheduled_events().is_empty());

    sweep.abort();
}

#[tokio::test]
async fn cancelled_goal_stays_silent() {
    let (memory_tx, mut memory_rx) = mpsc::unbounded_channel();
    let scheduler = GoalScheduler::new(MemoryStore::new(), memory_tx);
    let mut signals = scheduler.subscribe();

    let now = now_epoch_millis();
    let goal = Goal::new("doomed", "Never happens", GoalCategory::Social, 6);
    assert!(scheduler.schedule_goal(goal, TimeWindow::new(now + 2_000, now + 60_000)));

    assert!(scheduler.cancel_goal("doomed"));
    assert!(!scheduler.cancel_goal("doomed"));

    // Give a cancelled timer every chance to misfire.
    let outcome = timeout(Duration::from_millis(300), signals.recv()).await;
    assert!(outcome.is_err(), "cancelled goal emitted a signal");
    assert!(memory_rx.try_recv().is_err(), "cancelled goal emitted a memory");
}
