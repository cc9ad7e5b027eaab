//! Turn countdown for Guest Quest.
//!
//! Each room owns one [`TurnTimer`]. While a game is running it holds a
//! single deadline (turn expiry) and a single periodic sync schedule
//! (`timer_sync` broadcasts). Both live in plain fields of the timer, so
//! restarting or cancelling it replaces them in one step: there is never a
//! second countdown left behind to fire into a later turn.
//!
//! # Integration
//!
//! The timer sits inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         event = room.timer.wait() => {
//!             let msgs = room.on_timer(event, Instant::now());
//!         }
//!     }
//! }
//! ```
//!
//! When the timer is stopped, [`TurnTimer::wait`] pends forever and the
//! select loop only reacts to commands.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timer settings for one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// How long a player has to act before the turn is forced over.
    pub turn_duration: Duration,
    /// How often the remaining time is broadcast.
    pub sync_interval: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            turn_duration: Duration::from_secs(60),
            sync_interval: Duration::from_secs(1),
        }
    }
}

impl TimerConfig {
    /// Smallest accepted sync interval.
    pub const MIN_SYNC_INTERVAL: Duration = Duration::from_millis(10);

    /// Creates a config with the given turn length and a 1 s sync.
    pub fn with_turn_duration(turn_duration: Duration) -> Self {
        Self {
            turn_duration,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TurnTimer::new`]. A zero turn duration
    /// becomes one sync interval; a sync interval below
    /// [`Self::MIN_SYNC_INTERVAL`] is raised to it.
    pub fn validated(mut self) -> Self {
        if self.sync_interval < Self::MIN_SYNC_INTERVAL {
            warn!(
                sync_ms = self.sync_interval.as_millis() as u64,
                "sync interval too small, clamping"
            );
            self.sync_interval = Self::MIN_SYNC_INTERVAL;
        }
        if self.turn_duration.is_zero() {
            warn!("turn duration is zero, using one sync interval");
            self.turn_duration = self.sync_interval;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What the timer wants the room to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Broadcast the remaining whole seconds.
    Sync { remaining_secs: u64 },
    /// The turn's time is up. The timer is stopped until restarted.
    Expired,
}

// ---------------------------------------------------------------------------
// TurnTimer
// ---------------------------------------------------------------------------

/// A restartable countdown with a periodic sync schedule.
///
/// All methods that depend on time take `now` explicitly, which keeps the
/// state machine testable without a runtime. [`TurnTimer::wait`] is the
/// only async entry point.
#[derive(Debug, Clone)]
pub struct TurnTimer {
    config: TimerConfig,
    /// Turn expiry. `None` while stopped.
    deadline: Option<Instant>,
    /// Next `timer_sync`. Only meaningful while `deadline` is set.
    next_sync: Option<Instant>,
    /// Bumped on every start; lets logs tell turns apart.
    generation: u64,
}

impl TurnTimer {
    pub fn new(config: TimerConfig) -> Self {
        let config = config.validated();
        debug!(
            turn_secs = config.turn_duration.as_secs_f64(),
            sync_ms = config.sync_interval.as_millis() as u64,
            "turn timer created"
        );
        Self {
            config,
            deadline: None,
            next_sync: None,
            generation: 0,
        }
    }

    /// Starts a fresh countdown from `now`, replacing any running one.
    pub fn start(&mut self, now: Instant) {
        self.generation += 1;
        self.deadline = Some(now + self.config.turn_duration);
        self.next_sync = Some(now + self.config.sync_interval);
        trace!(generation = self.generation, "turn timer started");
    }

    /// Stops the countdown. Idempotent.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            trace!(generation = self.generation, "turn timer cancelled");
        }
        self.next_sync = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// How many times the timer has been started.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Whole seconds left, rounded up. `0` when stopped or expired.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let Some(deadline) = self.deadline else {
            return 0;
        };
        let left = deadline.saturating_duration_since(now);
        let secs = left.as_secs();
        if left.subsec_nanos() > 0 { secs + 1 } else { secs }
    }

    /// Seconds a freshly started turn begins with.
    pub fn full_turn_secs(&self) -> u64 {
        let d = self.config.turn_duration;
        if d.subsec_nanos() > 0 { d.as_secs() + 1 } else { d.as_secs() }
    }

    /// The next instant at which [`poll`](Self::poll) has something to
    /// report, or `None` while stopped.
    pub fn next_wakeup(&self) -> Option<Instant> {
        let deadline = self.deadline?;
        Some(match self.next_sync {
            Some(sync) if sync < deadline => sync,
            _ => deadline,
        })
    }

    /// Advances the timer to `now` and reports what is due.
    ///
    /// Expiry wins over a sync due at the same instant. A late wake-up
    /// yields one sync (not a burst) and schedules the next one from the
    /// original cadence.
    pub fn poll(&mut self, now: Instant) -> Option<TimerEvent> {
        let deadline = self.deadline?;

        if now >= deadline {
            self.deadline = None;
            self.next_sync = None;
            debug!(generation = self.generation, "turn timer expired");
            return Some(TimerEvent::Expired);
        }

        let sync = self.next_sync?;
        if now < sync {
            return None;
        }

        let mut next = sync + self.config.sync_interval;
        while next <= now {
            next += self.config.sync_interval;
        }
        self.next_sync = Some(next);

        Some(TimerEvent::Sync {
            remaining_secs: self.remaining_secs(now),
        })
    }

    /// Sleeps until the next event and returns it.
    ///
    /// Pends forever while stopped. Cancel-safe: dropping the future
    /// before it resolves leaves the timer unchanged.
    pub async fn wait(&mut self) -> TimerEvent {
        loop {
            let Some(wake) = self.next_wakeup() else {
                std::future::pending::<()>().await;
                continue;
            };
            time::sleep_until(wake).await;
            if let Some(event) = self.poll(Instant::now()) {
                return event;
            }
        }
    }
}
