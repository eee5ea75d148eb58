//! Cooperative interval timers
//!
//! The engine has no threads of its own. Timers record when they are next due
//! and the host polls them with the current time (see
//! [`crate::engine::AffectEngine::advance`]). Every due tick runs to
//! completion before the poll returns.

use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
}

/// A fixed-interval timer polled with millisecond timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    interval_ms: u64,
    next_due_ms: Option<u64>,
}

impl IntervalTimer {
    /// A stopped timer. Zero intervals are raised to one millisecond.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Start counting from `now_ms`. Restarting resets the phase.
    pub fn start(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.interval_ms));
    }

    pub fn stop(&mut self) {
        self.next_due_ms = None;
    }

    pub fn status(&self) -> TimerStatus {
        if self.next_due_ms.is_some() {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_due_ms.is_some()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    /// Number of intervals elapsed up to `now_ms`. Stopped timers never fire.
    pub fn poll(&mut self, now_ms: u64) -> u64 {
        let Some(due) = self.next_due_ms else {
            return 0;
        };
        if now_ms < due {
            return 0;
        }
        let fired = (now_ms - due) / self.interval_ms + 1;
        self.next_due_ms = Some(due.saturating_add(fired.saturating_mul(self.interval_ms)));
        fired
    }
}

/// Work due after a poll, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DueTicks {
    /// Session duration to add (interval times elapsed ticks)
    pub session_elapsed_ms: u64,
    pub refresh_time_of_day: bool,
    /// Missed analysis ticks collapse into one run
    pub run_analysis: bool,
}

impl DueTicks {
    pub fn is_empty(&self) -> bool {
        self.session_elapsed_ms == 0 && !self.refresh_time_of_day && !self.run_analysis
    }
}

/// The engine's three timers
#[derive(Debug, Clone)]
pub struct Scheduler {
    session: IntervalTimer,
    time_of_day: IntervalTimer,
    analysis: IntervalTimer,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Scheduler {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            session: IntervalTimer::new(config.session_tick_ms),
            time_of_day: IntervalTimer::new(config.time_of_day_refresh_ms),
            analysis: IntervalTimer::new(config.analysis_interval_ms),
        }
    }

    pub fn start(&mut self, now_ms: u64) {
        self.session.start(now_ms);
        self.time_of_day.start(now_ms);
        self.analysis.start(now_ms);
    }

    pub fn stop(&mut self) {
        self.session.stop();
        self.time_of_day.stop();
        self.analysis.stop();
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running() || self.time_of_day.is_running() || self.analysis.is_running()
    }

    /// Number of timers currently running
    pub fn active_timers(&self) -> usize {
        [&self.session, &self.time_of_day, &self.analysis]
            .iter()
            .filter(|t| t.is_running())
            .count()
    }

    pub fn poll(&mut self, now_ms: u64) -> DueTicks {
        let session_ticks = self.session.poll(now_ms);
        let tod_ticks = self.time_of_day.poll(now_ms);
        let analysis_ticks = self.analysis.poll(now_ms);

        if analysis_ticks > 1 {
            log::debug!("coalescing {analysis_ticks} missed analysis ticks");
        }

        DueTicks {
            session_elapsed_ms: session_ticks.saturating_mul(self.session.interval_ms()),
            refresh_time_of_day: tod_ticks > 0,
            run_analysis: analysis_ticks > 0,
        }
    }
}
