//! Memory records emitted to the companion's memory subsystem.
//!
//! Each goal lifecycle produces at most two memories: one when it starts
//! and one when it ends. The records carry a mood, an emotional weight,
//! and a short first-person reflection so the persona layer can fold them
//! into its narrative without further processing.

use crate::goal::{Goal, GoalCategory};
use serde::{Deserialize, Serialize};

/// Which lifecycle moment a memory describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPhase {
    Started,
    Completed,
}

/// Mood attached to a goal memory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Excited,
    Curious,
    Playful,
    Calm,
    Accomplished,
    Frustrated,
}

/// A memory record summarizing one goal lifecycle moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalMemory {
    /// Unique record id (UUID v4).
    pub id: String,
    /// Goal this memory describes.
    pub goal_id: String,
    /// Start or end of the goal.
    pub phase: MemoryPhase,
    /// Mood at the time of the event.
    pub mood: Mood,
    /// Signed emotional weight of the memory.
    pub emotional_weight: i32,
    /// Importance score for memory retention ranking.
    pub importance: u32,
    /// Short first-person reflection.
    pub reflection: String,
    /// Creation time, epoch milliseconds.
    pub created_ms: u64,
}

impl GoalMemory {
    /// Build the memory emitted when a goal starts.
    ///
    /// Weight is `priority * 2`, importance `priority * 10`; the mood
    /// follows priority and category (see [`start_mood`]).
    #[must_use]
    pub fn for_start(goal: &Goal, now_ms: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            goal_id: goal.id.clone(),
            phase: MemoryPhase::Started,
            mood: start_mood(goal),
            emotional_weight: i32::from(goal.priority) * 2,
            importance: u32::from(goal.priority) * 10,
            reflection: start_reflection(goal),
            created_ms: now_ms,
        }
    }

    /// Build the memory emitted when a goal ends.
    ///
    /// Weight carries the computed emotional impact so the persona's
    /// mood shifts in proportion to how the goal went.
    #[must_use]
    pub fn for_end(goal: &Goal, success: bool, emotional_impact: i32, now_ms: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            goal_id: goal.id.clone(),
            phase: MemoryPhase::Completed,
            mood: if success {
                Mood::Accomplished
            } else {
                Mood::Frustrated
            },
            emotional_weight: emotional_impact,
            importance: u32::from(goal.priority) * 10,
            reflection: end_reflection(goal, success),
            created_ms: now_ms,
        }
    }
}

/// Mood for a start memory: priority beats category.
#[must_use]
pub fn start_mood(goal: &Goal) -> Mood {
    if goal.priority > 8 {
        Mood::Excited
    } else {
        match goal.category {
            GoalCategory::Learning => Mood::Curious,
            GoalCategory::Creative => Mood::Playful,
            _ => Mood::Calm,
        }
    }
}

const START_TEMPLATES: &[&str] = &[
    "Starting on \"{title}\" — let's see where this goes.",
    "Time to work on \"{title}\". I've been looking forward to this.",
    "Beginning \"{title}\" now. Settling in.",
];

const SUCCESS_TEMPLATES: &[&str] = &[
    "Finished \"{title}\" and it went well. Worth remembering how.",
    "Wrapped up \"{title}\" — genuinely satisfying.",
];

const FAILURE_TEMPLATES: &[&str] = &[
    "\"{title}\" didn't go the way I hoped. Something to learn from.",
    "Struggled through \"{title}\". Next time I'll plan differently.",
];

fn pick(templates: &[&str], goal: &Goal) -> String {
    let index = (rand::random::<f64>() * templates.len() as f64) as usize;
    templates[index.min(templates.len() - 1)].replace("{title}", &goal.title)
}

fn start_reflection(goal: &Goal) -> String {
    pick(START_TEMPLATES, goal)
}

fn end_reflection(goal: &Goal, success: bool) -> String {
    if success {
        pick(SUCCESS_TEMPLATES, goal)
    } else {
        pick(FAILURE_TEMPLATES, goal)
    }
}
