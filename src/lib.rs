//! Wisp: goal scheduling engine for an AI companion.
//!
//! The scheduler plans future goal executions at wall-clock times and
//! guarantees that lifecycle notifications fire when they should:
//!
//! - **Scheduling**: one start and one end event per goal, plus a
//!   midpoint check for long goals; conflicting windows are rejected up
//!   front.
//! - **Firing**: one-shot tokio timers per event, backed by a periodic
//!   sweep that catches drift, coalescing, and events restored from a
//!   previous process.
//! - **Derivation**: each finished goal yields an efficiency score, an
//!   emotional-impact delta, follow-up suggestions, and memory records
//!   for the companion's persona layer.
//! - **Persistence**: the whole queue round-trips through an injected
//!   [`StateStore`] so a restart resumes pending work.
//!
//! Collaborators (persona, UI, storage) are injected at construction;
//! the engine has no globals and no environment sniffing.

pub mod config;
pub mod error;
pub mod goal;
pub mod memory;
pub mod outcome;
pub mod scheduler;
pub mod signal;
pub mod store;

pub use config::SchedulerConfig;
pub use error::{GoalError, Result};
pub use goal::{Goal, GoalCategory, TimeWindow};
pub use memory::{GoalMemory, MemoryPhase, Mood};
pub use outcome::{GoalOutcome, SuggestionTier};
pub use scheduler::{EventKind, EventState, GoalHooks, GoalScheduler, ScheduleEvent, STATE_KEY};
pub use signal::GoalSignal;
pub use store::{FileStore, MemoryStore, NullStore, StateStore};
