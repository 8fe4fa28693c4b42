//! Configuration for the goal scheduler.
//!
//! All timing knobs live here so embedders (and tests) can tighten them
//! without touching the engine. Defaults match the production cadence:
//! a 60-second sweep, midpoint checks for goals longer than 30 minutes,
//! and a 24-hour retention window for settled events.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Timing and capacity knobs for [`GoalScheduler`](crate::GoalScheduler).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Interval between sweep ticks in seconds.
    ///
    /// The sweep is a safety net behind per-event timers: it fires any
    /// due-but-unfired events, persists the queue, and compacts history.
    pub sweep_interval_secs: u64,
    /// Planned duration above which a midpoint check event is created,
    /// in minutes.
    pub midpoint_check_threshold_min: u64,
    /// How long settled (fired or cancelled) events are retained before
    /// the sweep drops them, in hours.
    pub retention_hours: u64,
    /// Capacity of the broadcast channel carrying goal signals.
    pub signal_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
            midpoint_check_threshold_min: 30,
            retention_hours: 24,
            signal_capacity: 64,
        }
    }
}

impl SchedulerConfig {
    /// Midpoint-check threshold in milliseconds.
    #[must_use]
    pub fn midpoint_check_threshold_ms(&self) -> u64 {
        self.midpoint_check_threshold_min.saturating_mul(60_000)
    }

    /// Retention window in milliseconds.
    #[must_use]
    pub fn retention_ms(&self) -> u64 {
        self.retention_hours.saturating_mul(3_600_000)
    }
}

/// Scheduler state directory.
///
/// Resolves to `dirs::config_dir()/wisp/` by default. Override with the
/// `WISP_STATE_DIR` environment variable (used by tests and custom
/// deployments).
#[must_use]
pub fn state_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("WISP_STATE_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("wisp"))
        .unwrap_or_else(|| PathBuf::from("/tmp/wisp-state"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn defaults_match_production_cadence() {
        let config = SchedulerConfig::default();
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.midpoint_check_threshold_min, 30);
        assert_eq!(config.retention_hours, 24);
        assert_eq!(config.midpoint_check_threshold_ms(), 30 * 60 * 1000);
        assert_eq!(config.retention_ms(), 24 * 3600 * 1000);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{"sweep_interval_secs": 5}"#).expect("parse");
        assert_eq!(config.sweep_interval_secs, 5);
        assert_eq!(config.midpoint_check_threshold_min, 30);
    }
}
