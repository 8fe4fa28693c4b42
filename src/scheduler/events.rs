//! Schedule event records and their lifecycle states.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Process-wide counter disambiguating event ids created in the same
/// millisecond.
static EVENT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Lifecycle moment an event represents. Closed set; the persisted
/// format admits no other values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    GoalStart,
    GoalEnd,
    GoalReminder,
    GoalCheck,
}

impl EventKind {
    /// Stable snake_case name, used in event ids.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoalStart => "goal_start",
            Self::GoalEnd => "goal_end",
            Self::GoalReminder => "goal_reminder",
            Self::GoalCheck => "goal_check",
        }
    }

    /// Wire name of the broadcast signal for this kind.
    ///
    /// These four strings are the public notification contract; UI layers
    /// key their listeners on them.
    #[must_use]
    pub fn signal_name(&self) -> &'static str {
        match self {
            Self::GoalStart => "ai-goal-start",
            Self::GoalEnd => "ai-goal-end",
            Self::GoalCheck => "ai-goal-check",
            Self::GoalReminder => "ai-goal-reminder",
        }
    }
}

/// Lifecycle state of a schedule event.
///
/// A settled event (fired or cancelled) is immutable and inert; the
/// scheduler never re-fires it. The two settled states are distinct so
/// persisted history can tell "ran" apart from "called off".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EventState {
    /// Waiting for its scheduled time.
    Pending,
    /// Executed its effects at `at_ms`.
    Fired {
        /// Epoch milliseconds at which the event ran.
        at_ms: u64,
    },
    /// Cancelled at `at_ms` without running effects.
    Cancelled {
        /// Epoch milliseconds at which the event was cancelled.
        at_ms: u64,
    },
}

impl EventState {
    /// `true` while the event is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// `true` once the event has fired or been cancelled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }
}

/// Outcome recorded on a fired `GoalEnd` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResult {
    /// Whether the goal counted as a success.
    pub success: bool,
    /// Actual start, epoch milliseconds.
    pub actual_start_ms: u64,
    /// Actual end, epoch milliseconds.
    pub actual_end_ms: u64,
    /// Efficiency clamped to 0–100 for display purposes.
    pub completion_rate: u32,
    /// The end-of-goal reflection string.
    pub feedback: String,
}

/// One timer-backed lifecycle record for a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    /// Unique id: `{kind}-{goal_id}-{created_ms}-{seq}`.
    pub id: String,
    /// Goal this event belongs to. Relation only — the scheduler never
    /// owns or mutates goal state.
    pub goal_id: String,
    /// Which lifecycle moment this event marks.
    pub kind: EventKind,
    /// When the event must fire, epoch milliseconds.
    pub scheduled_ms: u64,
    /// Pending / fired / cancelled.
    #[serde(flatten)]
    pub state: EventState,
    /// Populated on fired end events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EventResult>,
}

impl ScheduleEvent {
    /// Create a pending event for a goal at the given time.
    #[must_use]
    pub fn new(kind: EventKind, goal_id: &str, scheduled_ms: u64) -> Self {
        let created_ms = now_epoch_millis();
        let seq = EVENT_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
        Self {
            id: format!("{}-{goal_id}-{created_ms}-{seq}", kind.as_str()),
            goal_id: goal_id.to_owned(),
            kind,
            scheduled_ms,
            state: EventState::Pending,
            result: None,
        }
    }
}

impl std::fmt::Display for ScheduleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let when = chrono::DateTime::from_timestamp_millis(self.scheduled_ms as i64)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.scheduled_ms.to_string());
        write!(f, "{} for goal '{}' at {when}", self.kind.as_str(), self.goal_id)
    }
}

/// Current epoch time in milliseconds.
#[must_use]
pub fn now_epoch_millis() -> u64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        Err(_) => 0,
    }
}
