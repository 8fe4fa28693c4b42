//! The goal scheduling engine.
//!
//! [`GoalScheduler`] owns the queue of schedule events, arms one one-shot
//! timer per event, and runs a periodic sweep that catches stragglers,
//! persists the queue, and compacts settled history. Timers are spawned
//! tokio tasks racing `tokio::time::sleep` against a [`CancellationToken`]
//! keyed by event id, so cancellation never has to reach into a closure.
//!
//! All scheduler state lives behind one internal mutex that is held only
//! for short synchronous sections and never across an await. Effects
//! (signals, memory records, caller hooks) run after the lock is
//! released, so a hook may call back into the scheduler.

use crate::config::SchedulerConfig;
use crate::error::{GoalError, Result};
use crate::goal::{Goal, TimeWindow};
use crate::memory::GoalMemory;
use crate::outcome::{
    GoalOutcome, SUCCESS_THRESHOLD, calculate_efficiency, calculate_emotional_impact, next_actions,
};
use crate::scheduler::events::{
    EventKind, EventResult, EventState, ScheduleEvent, now_epoch_millis,
};
use crate::signal::GoalSignal;
use crate::store::StateStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Store key under which the whole event queue is persisted.
pub const STATE_KEY: &str = "ai_goal_scheduler";

/// Optional per-goal callbacks, invoked as lifecycle events fire.
#[derive(Default)]
pub struct GoalHooks {
    on_start: Option<Box<dyn Fn(&Goal) + Send + Sync>>,
    on_end: Option<Box<dyn Fn(&GoalOutcome) + Send + Sync>>,
}

impl GoalHooks {
    /// Create empty hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` with the goal when its start event fires.
    #[must_use]
    pub fn on_start(mut self, hook: impl Fn(&Goal) + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Run `hook` with the computed outcome when the end event fires.
    #[must_use]
    pub fn on_end(mut self, hook: impl Fn(&GoalOutcome) + Send + Sync + 'static) -> Self {
        self.on_end = Some(Box::new(hook));
        self
    }
}

/// Persisted scheduler state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedState {
    /// Schema version.
    #[serde(default = "default_state_version")]
    version: u8,
    /// The full event queue, pending and settled.
    #[serde(default)]
    events: Vec<ScheduleEvent>,
    /// Epoch milliseconds of the last save.
    #[serde(default)]
    last_update: u64,
}

fn default_state_version() -> u8 {
    1
}

/// Mutable engine state, guarded by one mutex.
struct EngineCore {
    /// Every event created this process plus restored history. Lifecycle
    /// transitions only settle events; removal happens in compaction.
    events: Vec<ScheduleEvent>,
    /// Cancellation token per armed timer, keyed by event id.
    timers: HashMap<String, CancellationToken>,
    /// Goal snapshots, kept until the goal ends or is cancelled.
    goals: HashMap<String, Goal>,
    /// Caller hooks, keyed by goal id. Not persisted.
    hooks: HashMap<String, Arc<GoalHooks>>,
}

/// Effects gathered under the lock, emitted after it is released.
struct FiredEffects {
    signal: GoalSignal,
    memory: Option<GoalMemory>,
    hooks: Option<Arc<GoalHooks>>,
    goal: Option<Goal>,
    outcome: Option<GoalOutcome>,
}

/// Time-driven scheduler for goal lifecycle events.
///
/// Cheaply cloneable handle; all clones share the same queue. Construct
/// with an injected [`StateStore`] and memory sink, then call
/// [`start`](Self::start) once from within a tokio runtime to load
/// persisted state, re-arm timers, and begin sweeping.
#[derive(Clone)]
pub struct GoalScheduler {
    core: Arc<Mutex<EngineCore>>,
    signal_tx: broadcast::Sender<GoalSignal>,
    memory_tx: mpsc::UnboundedSender<GoalMemory>,
    store: Arc<dyn StateStore>,
    config: SchedulerConfig,
}

impl GoalScheduler {
    /// Create a scheduler with the default configuration.
    pub fn new(store: impl StateStore + 'static, memory_tx: mpsc::UnboundedSender<GoalMemory>) -> Self {
        let config = SchedulerConfig::default();
        let (signal_tx, _) = broadcast::channel(config.signal_capacity.max(1));
        Self {
            core: Arc::new(Mutex::new(EngineCore {
                events: Vec::new(),
                timers: HashMap::new(),
                goals: HashMap::new(),
                hooks: HashMap::new(),
            })),
            signal_tx,
            memory_tx,
            store: Arc::new(store),
            config,
        }
    }

    /// Override the configuration. Call before [`start`](Self::start) and
    /// before subscribing (the signal channel is rebuilt at the new
    /// capacity).
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        let (signal_tx, _) = broadcast::channel(config.signal_capacity.max(1));
        self.signal_tx = signal_tx;
        self.config = config;
        self
    }

    /// Subscribe to lifecycle signals.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GoalSignal> {
        self.signal_tx.subscribe()
    }

    /// Load persisted state, re-arm timers for pending future events, and
    /// spawn the sweep loop. Call once, from within a tokio runtime.
    ///
    /// Restored events that are already overdue are left for the sweep,
    /// whose first tick fires immediately.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        self.load_state();

        let scheduler = self.clone();
        let period = Duration::from_secs(self.config.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            info!(
                pending = scheduler.scheduled_events().len(),
                "goal scheduler started"
            );
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                scheduler.sweep_once();
            }
        })
    }

    /// Schedule a goal for execution over `window`.
    ///
    /// Returns `false` (with a warning logged, queue untouched) when the
    /// start is in the past, the window is inverted, or the window
    /// conflicts with a pending event. On success, creates start and end
    /// events — plus a midpoint check event when the planned duration
    /// exceeds the configured threshold — and arms a timer for each.
    pub fn schedule_goal(&self, goal: Goal, window: TimeWindow) -> bool {
        self.schedule_goal_with_hooks(goal, window, GoalHooks::new())
    }

    /// [`schedule_goal`](Self::schedule_goal) with per-goal callbacks.
    pub fn schedule_goal_with_hooks(
        &self,
        mut goal: Goal,
        window: TimeWindow,
        hooks: GoalHooks,
    ) -> bool {
        let now = now_epoch_millis();
        if window.start_ms < now {
            warn!(
                goal_id = %goal.id,
                start_ms = window.start_ms,
                "rejecting goal scheduled in the past"
            );
            return false;
        }
        if window.end_ms <= window.start_ms {
            warn!(
                goal_id = %goal.id,
                "rejecting goal with inverted or empty window"
            );
            return false;
        }

        let mut core = self.core_lock();
        if let Some(conflict) = Self::find_conflict(&core.events, window) {
            warn!(
                goal_id = %goal.id,
                conflicting_event = %conflict,
                "rejecting goal: window conflicts with a pending event"
            );
            return false;
        }

        // The scheduling window becomes the goal's planned window; the
        // efficiency computation reads it back at end time.
        goal.window = Some(window);

        let mut events = vec![ScheduleEvent::new(EventKind::GoalStart, &goal.id, window.start_ms)];
        let duration_ms = window.end_ms - window.start_ms;
        if duration_ms > self.config.midpoint_check_threshold_ms() {
            events.push(ScheduleEvent::new(
                EventKind::GoalCheck,
                &goal.id,
                window.midpoint_ms(),
            ));
        }
        events.push(ScheduleEvent::new(EventKind::GoalEnd, &goal.id, window.end_ms));

        info!(
            goal_id = %goal.id,
            title = %goal.title,
            events = events.len(),
            start_ms = window.start_ms,
            end_ms = window.end_ms,
            "scheduled goal"
        );

        let goal_id = goal.id.clone();
        core.goals.insert(goal_id.clone(), goal);
        // Hooks are stored even when empty so cancel_goal can drop them
        // uniformly.
        core.hooks.insert(goal_id, Arc::new(hooks));
        for event in events {
            self.arm_event(&mut core, &event);
            core.events.push(event);
        }
        true
    }

    /// Schedule a standalone reminder for a goal at `at_ms`.
    ///
    /// Reminders are point events: no window, no conflict check, no
    /// memory record — just an `ai-goal-reminder` signal when the timer
    /// fires. Returns `false` when `at_ms` is in the past.
    pub fn schedule_reminder(&self, goal_id: &str, at_ms: u64) -> bool {
        if at_ms < now_epoch_millis() {
            warn!(goal_id, at_ms, "rejecting reminder scheduled in the past");
            return false;
        }

        let mut core = self.core_lock();
        let event = ScheduleEvent::new(EventKind::GoalReminder, goal_id, at_ms);
        debug!(goal_id, at_ms, "scheduled reminder");
        self.arm_event(&mut core, &event);
        core.events.push(event);
        true
    }

    /// Cancel every pending event of a goal.
    ///
    /// Disarms timers and marks the events `Cancelled` without running
    /// their effects; the goal's snapshot and hooks are dropped. Returns
    /// `true` iff at least one event was cancelled. Best-effort against
    /// in-flight timers: an event whose timer already fired has already
    /// run and stays `Fired`.
    pub fn cancel_goal(&self, goal_id: &str) -> bool {
        let mut core = self.core_lock();
        let now = now_epoch_millis();

        let pending_ids: Vec<String> = core
            .events
            .iter()
            .filter(|e| e.goal_id == goal_id && e.state.is_pending())
            .map(|e| e.id.clone())
            .collect();

        for event_id in &pending_ids {
            if let Some(token) = core.timers.remove(event_id) {
                token.cancel();
            }
            if let Some(event) = core.events.iter_mut().find(|e| &e.id == event_id) {
                event.state = EventState::Cancelled { at_ms: now };
            }
        }

        core.goals.remove(goal_id);
        core.hooks.remove(goal_id);

        if pending_ids.is_empty() {
            debug!(goal_id, "cancel requested but no pending events");
            false
        } else {
            info!(goal_id, cancelled = pending_ids.len(), "cancelled goal");
            true
        }
    }

    /// All pending events, for UI listing. Order is not guaranteed.
    #[must_use]
    pub fn scheduled_events(&self) -> Vec<ScheduleEvent> {
        self.core_lock()
            .events
            .iter()
            .filter(|e| e.state.is_pending())
            .cloned()
            .collect()
    }

    /// The pending future event with the earliest scheduled time.
    #[must_use]
    pub fn next_scheduled_event(&self) -> Option<ScheduleEvent> {
        let now = now_epoch_millis();
        self.core_lock()
            .events
            .iter()
            .filter(|e| e.state.is_pending() && e.scheduled_ms > now)
            .min_by_key(|e| e.scheduled_ms)
            .cloned()
    }

    /// Persist the full event queue to the store.
    ///
    /// Called by every sweep tick; exposed for embedders that want to
    /// save at their own checkpoints.
    pub fn save(&self) -> Result<()> {
        let state = {
            let core = self.core_lock();
            PersistedState {
                version: default_state_version(),
                events: core.events.clone(),
                last_update: now_epoch_millis(),
            }
        };

        let json = serde_json::to_string(&state)
            .map_err(|e| GoalError::Serialize(format!("cannot serialize scheduler state: {e}")))?;
        self.store.save(STATE_KEY, &json)
    }

    /// One sweep pass: fire due stragglers, persist, compact.
    pub(crate) fn sweep_once(&self) {
        let now = now_epoch_millis();
        let due_ids: Vec<String> = {
            let core = self.core_lock();
            core.events
                .iter()
                .filter(|e| e.state.is_pending() && e.scheduled_ms <= now)
                .map(|e| e.id.clone())
                .collect()
        };

        if !due_ids.is_empty() {
            debug!(count = due_ids.len(), "sweep firing overdue events");
        }
        for event_id in due_ids {
            self.fire_event(&event_id);
        }

        if let Err(e) = self.save() {
            error!("cannot persist scheduler state: {e}");
        }

        let mut core = self.core_lock();
        Self::compact(&mut core, now, self.config.retention_ms());
    }

    /// Drop settled events whose scheduled time fell out of the retention
    /// window. Pending events are never dropped.
    fn compact(core: &mut EngineCore, now: u64, retention_ms: u64) {
        let cutoff = now.saturating_sub(retention_ms);
        let before = core.events.len();
        core.events
            .retain(|e| e.state.is_pending() || e.scheduled_ms >= cutoff);
        let dropped = before - core.events.len();
        if dropped > 0 {
            debug!(dropped, "compacted settled events");
        }
    }

    /// Arm a one-shot timer for an event. `delay <= 0` fires on the
    /// spawned task immediately.
    fn arm_event(&self, core: &mut EngineCore, event: &ScheduleEvent) {
        let token = CancellationToken::new();
        core.timers.insert(event.id.clone(), token.clone());

        let scheduler = self.clone();
        let event_id = event.id.clone();
        let scheduled_ms = event.scheduled_ms;
        tokio::spawn(async move {
            let delay = scheduled_ms.saturating_sub(now_epoch_millis());
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {
                    scheduler.fire_event(&event_id);
                }
            }
        });
    }

    /// Execute an event's effects and mark it fired.
    ///
    /// Idempotent: the pending check under the lock makes a second fire
    /// (timer racing the sweep, or a sweep after a fire) a no-op.
    fn fire_event(&self, event_id: &str) {
        let effects = {
            let mut core = self.core_lock();
            match self.settle_and_collect(&mut core, event_id) {
                Some(effects) => effects,
                None => return,
            }
        };

        debug!(
            signal = effects.signal.name(),
            goal_id = %effects.signal.goal_id,
            "goal event fired"
        );

        // Lock released: memory and hooks first, broadcast last, so a
        // subscriber woken by the signal sees the full effect.
        if let Some(memory) = effects.memory {
            if self.memory_tx.send(memory).is_err() {
                debug!("memory sink closed, dropping goal memory");
            }
        }

        if let Some(hooks) = effects.hooks {
            if let (Some(on_start), Some(goal)) = (&hooks.on_start, &effects.goal) {
                on_start(goal);
            }
            if let (Some(on_end), Some(outcome)) = (&hooks.on_end, &effects.outcome) {
                on_end(outcome);
            }
        }

        // A send error only means nobody is listening right now.
        let _ = self.signal_tx.send(effects.signal);
    }

    /// Under the lock: transition the event to `Fired` and gather the
    /// effects its kind requires. Returns `None` when the event is
    /// unknown or already settled.
    fn settle_and_collect(&self, core: &mut EngineCore, event_id: &str) -> Option<FiredEffects> {
        let now = now_epoch_millis();
        let index = core.events.iter().position(|e| e.id == event_id)?;
        if !core.events[index].state.is_pending() {
            return None;
        }

        core.events[index].state = EventState::Fired { at_ms: now };
        core.timers.remove(event_id);
        let kind = core.events[index].kind;
        let goal_id = core.events[index].goal_id.clone();

        match kind {
            EventKind::GoalStart => {
                let Some(goal) = core.goals.get(&goal_id).cloned() else {
                    // Restored event with no goal snapshot: the signal
                    // still fires on time, derivation is skipped.
                    debug!(goal_id = %goal_id, "start fired for unknown goal, no memory derived");
                    return Some(FiredEffects {
                        signal: GoalSignal { kind, goal_id },
                        memory: None,
                        hooks: None,
                        goal: None,
                        outcome: None,
                    });
                };
                Some(FiredEffects {
                    signal: GoalSignal {
                        kind,
                        goal_id: goal_id.clone(),
                    },
                    memory: Some(GoalMemory::for_start(&goal, now)),
                    hooks: core.hooks.get(&goal_id).cloned(),
                    goal: Some(goal),
                    outcome: None,
                })
            }
            EventKind::GoalEnd => {
                let Some(goal) = core.goals.remove(&goal_id) else {
                    debug!(goal_id = %goal_id, "end fired for unknown goal, no outcome derived");
                    core.hooks.remove(&goal_id);
                    return Some(FiredEffects {
                        signal: GoalSignal { kind, goal_id },
                        memory: None,
                        hooks: None,
                        goal: None,
                        outcome: None,
                    });
                };
                let hooks = core.hooks.remove(&goal_id);

                let actual_start_ms = Self::actual_start_ms(core, &goal, now);
                let actual_duration_min =
                    now.saturating_sub(actual_start_ms) as f64 / 60_000.0;
                let efficiency = calculate_efficiency(&goal, actual_duration_min);
                let success = efficiency > SUCCESS_THRESHOLD;
                let emotional_impact = calculate_emotional_impact(efficiency, goal.priority);
                let memory = GoalMemory::for_end(&goal, success, emotional_impact, now);

                core.events[index].result = Some(EventResult {
                    success,
                    actual_start_ms,
                    actual_end_ms: now,
                    completion_rate: efficiency.min(100),
                    feedback: memory.reflection.clone(),
                });

                let outcome = GoalOutcome {
                    goal_id: goal_id.clone(),
                    success,
                    actual_duration_min,
                    efficiency,
                    emotional_impact,
                    memory: memory.clone(),
                    next_actions: next_actions(&goal, efficiency),
                };

                Some(FiredEffects {
                    signal: GoalSignal { kind, goal_id },
                    memory: Some(memory),
                    hooks,
                    goal: Some(goal),
                    outcome: Some(outcome),
                })
            }
            EventKind::GoalCheck | EventKind::GoalReminder => Some(FiredEffects {
                signal: GoalSignal { kind, goal_id },
                memory: None,
                hooks: None,
                goal: None,
                outcome: None,
            }),
        }
    }

    /// When the goal's start event fired, its fire time is the actual
    /// start; otherwise fall back to the planned start.
    fn actual_start_ms(core: &EngineCore, goal: &Goal, now: u64) -> u64 {
        let fired_start = core.events.iter().find_map(|e| {
            if e.goal_id == goal.id && e.kind == EventKind::GoalStart {
                match e.state {
                    EventState::Fired { at_ms } => Some(at_ms),
                    _ => None,
                }
            } else {
                None
            }
        });
        fired_start
            .or_else(|| goal.window.map(|w| w.start_ms))
            .unwrap_or(now)
    }

    /// Candidate window `[s, e)` conflicts iff a pending event's time
    /// lies strictly inside `(s, e)`. Deliberately asymmetric: existing
    /// intervals are represented only by their point events, and times
    /// exactly at `s` or `e` do not conflict.
    fn find_conflict(events: &[ScheduleEvent], window: TimeWindow) -> Option<&ScheduleEvent> {
        events.iter().find(|e| {
            e.state.is_pending()
                && e.scheduled_ms > window.start_ms
                && e.scheduled_ms < window.end_ms
        })
    }

    /// Restore the persisted queue and re-arm pending future events.
    fn load_state(&self) {
        let raw = match self.store.load(STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!("cannot load scheduler state: {e}");
                return;
            }
        };

        let state: PersistedState = match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!("ignoring malformed scheduler state: {e}");
                return;
            }
        };

        let now = now_epoch_millis();
        let mut core = self.core_lock();
        core.events = state.events;

        let to_arm: Vec<ScheduleEvent> = core
            .events
            .iter()
            .filter(|e| e.state.is_pending() && e.scheduled_ms > now)
            .cloned()
            .collect();
        debug!(
            restored = core.events.len(),
            rearmed = to_arm.len(),
            "loaded scheduler state"
        );
        for event in to_arm {
            self.arm_event(&mut core, &event);
        }
    }

    fn core_lock(&self) -> MutexGuard<'_, EngineCore> {
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
