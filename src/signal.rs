//! Lifecycle signals broadcast to subscribers.

use crate::scheduler::EventKind;
use serde::{Deserialize, Serialize};

/// One lifecycle notification: which moment, for which goal.
///
/// Delivered on the scheduler's broadcast channel; any number of
/// listeners can [`subscribe`](crate::GoalScheduler::subscribe). The wire
/// name of a signal is [`EventKind::signal_name`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalSignal {
    /// Lifecycle moment that fired.
    pub kind: EventKind,
    /// Goal the event belongs to.
    pub goal_id: String,
}

impl GoalSignal {
    /// Wire name of this signal (`ai-goal-start` etc.).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.signal_name()
    }
}
