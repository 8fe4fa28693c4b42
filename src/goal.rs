//! Goal records consumed by the scheduler.
//!
//! Goals are owned by the caller (persona, UI, or agent layer); the
//! scheduler holds read-only snapshots and never mutates them.

use serde::{Deserialize, Serialize};

/// Highest meaningful goal priority. Values above are clamped.
pub const MAX_PRIORITY: u8 = 10;

/// Category of a goal. Influences derived mood and efficiency bonuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Learning,
    Creative,
    Social,
    Work,
    Personal,
    Fitness,
    Exploration,
}

/// A planned execution window, in epoch milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    /// Planned start, epoch milliseconds.
    pub start_ms: u64,
    /// Planned end, epoch milliseconds. Always after `start_ms` for
    /// windows accepted by the scheduler.
    pub end_ms: u64,
}

impl TimeWindow {
    /// Create a window from start/end epoch milliseconds.
    #[must_use]
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Planned duration in fractional minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        self.end_ms.saturating_sub(self.start_ms) as f64 / 60_000.0
    }

    /// Temporal midpoint of the window, epoch milliseconds.
    #[must_use]
    pub fn midpoint_ms(&self) -> u64 {
        self.start_ms + self.end_ms.saturating_sub(self.start_ms) / 2
    }
}

/// A user- or agent-defined task with an optional planned time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier, assigned by the goal source.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Category, used for mood derivation.
    pub category: GoalCategory,
    /// Priority 0–10. Clamped by [`Goal::new`].
    pub priority: u8,
    /// Planned execution window, if the goal has one.
    pub window: Option<TimeWindow>,
}

impl Goal {
    /// Create a goal with no planned window. Priority is clamped to 0–10.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: GoalCategory,
        priority: u8,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category,
            priority: priority.min(MAX_PRIORITY),
            window: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a planned execution window.
    #[must_use]
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn priority_is_clamped() {
        let goal = Goal::new("g1", "Test", GoalCategory::Work, 42);
        assert_eq!(goal.priority, MAX_PRIORITY);
    }

    #[test]
    fn window_duration_and_midpoint() {
        let window = TimeWindow::new(60_000, 5_460_000);
        assert!((window.duration_minutes() - 90.0).abs() < f64::EPSILON);
        assert_eq!(window.midpoint_ms(), 2_760_000);
    }

    #[test]
    fn goal_round_trips_through_json() {
        let goal = Goal::new("g1", "Learn Solidity", GoalCategory::Learning, 8)
            .with_description("smart contract basics")
            .with_window(TimeWindow::new(1_000, 2_941_000));
        let json = serde_json::to_string(&goal).expect("serialize");
        assert!(json.contains(r#""category":"learning""#));
        let restored: Goal = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.id, goal.id);
        assert_eq!(restored.window, goal.window);
    }
}
