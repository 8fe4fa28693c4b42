//! Time-driven goal scheduling.
//!
//! The engine plans future goal executions at wall-clock times, rejects
//! conflicting windows up front, fires lifecycle events via one-shot
//! timers backed by a periodic sweep, and persists its queue so a
//! restarted process resumes a consistent view of pending work.

pub mod engine;
pub mod events;

pub use engine::{GoalHooks, GoalScheduler, STATE_KEY};
pub use events::{EventKind, EventResult, EventState, ScheduleEvent, now_epoch_millis};
