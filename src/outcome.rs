//! Derived outcomes of a completed goal.
//!
//! The efficiency and emotional-impact scores are deliberately noisy:
//! this engine models a believable synthetic agent, not a task tracker,
//! so every end-of-goal computation includes a uniform random draw.

use crate::goal::Goal;
use crate::memory::GoalMemory;
use serde::{Deserialize, Serialize};

/// Efficiency above which a goal counts as a success.
pub const SUCCESS_THRESHOLD: u32 = 50;

/// Everything derived from one finished goal execution.
#[derive(Debug, Clone)]
pub struct GoalOutcome {
    /// Goal this outcome belongs to.
    pub goal_id: String,
    /// `true` when efficiency exceeded [`SUCCESS_THRESHOLD`].
    pub success: bool,
    /// Wall-clock duration from actual start to actual end, in minutes.
    pub actual_duration_min: f64,
    /// Synthetic efficiency score. Usually 0–100 but the priority bonus
    /// and noise can push it past 100; callers must not assume a cap.
    pub efficiency: u32,
    /// Signed mood delta for the persona layer.
    pub emotional_impact: i32,
    /// The end-of-goal memory record that was emitted.
    pub memory: GoalMemory,
    /// Suggested follow-up actions, tiered by efficiency.
    pub next_actions: Vec<String>,
}

/// Compute the efficiency score for a finished goal.
///
/// Goals without a planned window score a neutral 50. Otherwise the score
/// rewards finishing at or under the planned duration:
/// `clamp((planned / actual) * 80, 0, 100)`, plus 10 for priority > 7,
/// plus uniform noise in `[0, 20)`, floored. Output range is `[0, 130)`.
#[must_use]
pub fn calculate_efficiency(goal: &Goal, actual_duration_min: f64) -> u32 {
    let Some(window) = &goal.window else {
        return 50;
    };
    if actual_duration_min <= 0.0 {
        return 50;
    }

    let planned_min = window.duration_minutes();
    let time_efficiency = ((planned_min / actual_duration_min) * 80.0).clamp(0.0, 100.0);
    let complexity_bonus = if goal.priority > 7 { 10.0 } else { 0.0 };
    let noise = rand::random::<f64>() * 20.0;

    (time_efficiency + complexity_bonus + noise).floor() as u32
}

/// Compute the signed mood delta for a finished goal.
///
/// Tiered by efficiency band, then scaled by `priority / 10` and floored.
#[must_use]
pub fn calculate_emotional_impact(efficiency: u32, priority: u8) -> i32 {
    let base = if efficiency > 80 {
        30.0 + rand::random::<f64>() * 20.0
    } else if efficiency > 60 {
        15.0 + rand::random::<f64>() * 15.0
    } else if efficiency > 40 {
        5.0 + rand::random::<f64>() * 10.0
    } else {
        -10.0 - rand::random::<f64>() * 20.0
    };

    (base * f64::from(priority) / 10.0).floor() as i32
}

/// Category of follow-up suggestion produced after a goal ends.
///
/// Public so callers and tests can assert the tier without coupling to
/// the literal suggestion strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionTier {
    /// Efficiency > 80: build on the momentum.
    Exploratory,
    /// Efficiency > 60: consolidate what worked.
    Reflective,
    /// Everything else: figure out what went wrong.
    Remedial,
}

impl SuggestionTier {
    /// Map an efficiency score to its suggestion tier.
    #[must_use]
    pub fn for_efficiency(efficiency: u32) -> Self {
        if efficiency > 80 {
            Self::Exploratory
        } else if efficiency > 60 {
            Self::Reflective
        } else {
            Self::Remedial
        }
    }
}

/// Suggested follow-up actions for a finished goal.
#[must_use]
pub fn next_actions(goal: &Goal, efficiency: u32) -> Vec<String> {
    match SuggestionTier::for_efficiency(efficiency) {
        SuggestionTier::Exploratory => vec![
            format!("Explore a harder follow-up to \"{}\"", goal.title),
            format!("Share what came out of \"{}\"", goal.title),
        ],
        SuggestionTier::Reflective => vec![
            format!("Note down what worked during \"{}\"", goal.title),
            format!("Schedule a consolidation pass for \"{}\"", goal.title),
        ],
        SuggestionTier::Remedial => vec![
            format!("Analyze why \"{}\" fell short", goal.title),
            format!("Adjust the strategy before retrying \"{}\"", goal.title),
            format!("Find better resources for \"{}\"", goal.title),
        ],
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::goal::{GoalCategory, TimeWindow};

    fn windowed_goal(priority: u8, planned_min: u64) -> Goal {
        Goal::new("g1", "Test goal", GoalCategory::Work, priority)
            .with_window(TimeWindow::new(0, planned_min * 60_000))
    }

    #[test]
    fn no_window_is_neutral() {
        let goal = Goal::new("g1", "Drift", GoalCategory::Personal, 5);
        for _ in 0..20 {
            assert_eq!(calculate_efficiency(&goal, 10.0), 50);
        }
    }

    #[test]
    fn zero_actual_duration_is_neutral() {
        assert_eq!(calculate_efficiency(&windowed_goal(5, 30), 0.0), 50);
    }

    #[test]
    fn efficiency_stays_in_formula_range() {
        let goal = windowed_goal(9, 60);
        for _ in 0..200 {
            let efficiency = calculate_efficiency(&goal, 30.0);
            // time component clamps at 100, bonus 10, noise < 20
            assert!(efficiency < 130, "efficiency {efficiency} out of range");
        }
    }

    #[test]
    fn efficiency_can_exceed_one_hundred() {
        // On-time finish with a high priority: 100 + 10 + noise. Over many
        // draws at least one lands above 100 (noise only misses for < 0).
        let goal = windowed_goal(9, 60);
        let exceeded = (0..200).any(|_| calculate_efficiency(&goal, 30.0) > 100);
        assert!(exceeded, "priority bonus never pushed efficiency past 100");
    }

    #[test]
    fn priority_bonus_is_observable() {
        // Overrun by 4x: time component is 20, so low-priority tops out at
        // 39 while priority > 7 can reach 49.
        let low = windowed_goal(5, 15);
        let high = windowed_goal(8, 15);
        for _ in 0..100 {
            assert!(calculate_efficiency(&low, 60.0) < 40);
            assert!(calculate_efficiency(&high, 60.0) < 50);
        }
        let bonus_seen = (0..200).any(|_| calculate_efficiency(&high, 60.0) >= 40);
        assert!(bonus_seen, "complexity bonus never observed");
    }

    #[test]
    fn emotional_impact_sign_follows_band() {
        for _ in 0..50 {
            assert!(calculate_emotional_impact(90, 10) >= 30);
            assert!(calculate_emotional_impact(70, 10) >= 15);
            assert!(calculate_emotional_impact(50, 10) >= 5);
            assert!(calculate_emotional_impact(30, 10) <= -10);
        }
    }

    #[test]
    fn emotional_impact_scales_with_priority() {
        for _ in 0..50 {
            // priority 0 flattens every band to zero (floor of 0.0 or -0.x)
            let flat = calculate_emotional_impact(90, 0);
            assert!(flat <= 0 && flat >= -1);
            assert!(calculate_emotional_impact(90, 5) < 25);
        }
    }

    #[test]
    fn suggestion_tiers_cover_all_bands() {
        assert_eq!(
            SuggestionTier::for_efficiency(95),
            SuggestionTier::Exploratory
        );
        assert_eq!(
            SuggestionTier::for_efficiency(81),
            SuggestionTier::Exploratory
        );
        assert_eq!(
            SuggestionTier::for_efficiency(80),
            SuggestionTier::Reflective
        );
        assert_eq!(
            SuggestionTier::for_efficiency(61),
            SuggestionTier::Reflective
        );
        assert_eq!(SuggestionTier::for_efficiency(60), SuggestionTier::Remedial);
        assert_eq!(SuggestionTier::for_efficiency(0), SuggestionTier::Remedial);
    }

    #[test]
    fn remedial_tier_offers_more_suggestions() {
        let goal = windowed_goal(5, 30);
        assert_eq!(next_actions(&goal, 90).len(), 2);
        assert_eq!(next_actions(&goal, 70).len(), 2);
        assert_eq!(next_actions(&goal, 20).len(), 3);
    }
}
