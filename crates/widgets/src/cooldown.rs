use garden_core::MAX_COOLDOWN_SECS;
use std::time::Duration;
use tokio::time::Instant;

/// Longest cooldown a [`Cooldown`] will run; longer requests are clamped.
pub const MAX_COOLDOWN: Duration = Duration::from_secs(MAX_COOLDOWN_SECS);

/// Where a watering control is in its cooldown cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Control enabled, nothing running.
    Ready,
    /// Request in flight; locked out at `remaining == total`, no loop.
    Pending { total: Duration },
    /// Countdown loop running until `deadline`.
    Counting { deadline: Instant, total: Duration },
}

/// Result of feeding one countdown tick to a [`Cooldown`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Still cooling down.
    Running { remaining: Duration, progress: f32 },
    /// The countdown just reached zero; the control is enabled again.
    /// Reported once per countdown.
    Finished,
    /// Tick from a superseded or cancelled loop, or after completion.
    Ignored,
}

/// Per-widget watering cooldown.
///
/// Remaining time is always derived from a stored deadline, never
/// decremented, so late or coalesced ticks cannot drift the countdown.
/// Each countdown carries a generation; ticks tagged with any other
/// generation are ignored.
#[derive(Debug, Clone)]
pub struct Cooldown {
    phase:      Phase,
    remaining:  Duration,
    /// Total of the last lock-out or countdown; zero before the first one.
    total:      Duration,
    generation: u64,
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new()
    }
}

impl Cooldown {
    pub fn new() -> Self {
        Self {
            phase:      Phase::Ready,
            remaining:  Duration::ZERO,
            total:      Duration::ZERO,
            generation: 0,
        }
    }

    /// (Re)start the cooldown with `remaining` left out of `base`.
    ///
    /// Always replaces whatever was running.  Returns the generation of the
    /// new countdown loop, or `None` when `remaining` is zero and the control
    /// is simply enabled.  If `remaining` exceeds `base` the total grows to
    /// match so the ratio stays within `[0, 1]`.  Both are clamped to
    /// [`MAX_COOLDOWN`]; a deadline the clock can't represent leaves the
    /// control enabled.
    pub fn start(&mut self, remaining: Duration, base: Duration, now: Instant) -> Option<u64> {
        self.generation = crate::next_id();

        let remaining = remaining.min(MAX_COOLDOWN);
        let deadline = match now.checked_add(remaining) {
            Some(deadline) if !remaining.is_zero() => deadline,
            _ => {
                self.phase = Phase::Ready;
                self.remaining = Duration::ZERO;
                return None;
            }
        };

        let total = base.min(MAX_COOLDOWN).max(remaining);
        self.phase = Phase::Counting { deadline, total };
        self.remaining = remaining;
        self.total = total;
        Some(self.generation)
    }

    /// Optimistic lock-out while a watering request is in flight.
    ///
    /// Only valid from `Ready`; returns `false` (and changes nothing)
    /// otherwise.  `base` must be non-zero.
    pub fn lock_out(&mut self, base: Duration) -> bool {
        if self.phase != Phase::Ready {
            return false;
        }
        let base = base.min(MAX_COOLDOWN);
        self.generation = crate::next_id();
        self.phase = Phase::Pending { total: base };
        self.remaining = base;
        self.total = base;
        true
    }

    /// Undo [`Cooldown::lock_out`] after a failed request: no cooldown was
    /// granted, so the control goes straight back to `Ready`.
    pub fn release(&mut self) {
        if matches!(self.phase, Phase::Pending { .. }) {
            self.phase = Phase::Ready;
            self.remaining = Duration::ZERO;
        }
    }

    /// Apply one countdown tick from loop `generation` at time `now`.
    pub fn tick(&mut self, generation: u64, now: Instant) -> Tick {
        if generation != self.generation {
            return Tick::Ignored;
        }
        let Phase::Counting { deadline, total } = self.phase else {
            return Tick::Ignored;
        };

        let remaining = deadline.saturating_duration_since(now).min(self.remaining);
        self.remaining = remaining;

        if remaining.is_zero() {
            self.phase = Phase::Ready;
            // Re-entering after completion must not fire `Finished` again.
            self.generation = crate::next_id();
            return Tick::Finished;
        }

        Tick::Running {
            remaining,
            progress: ratio(total, remaining),
        }
    }

    /// Detach any running loop.  Later ticks are ignored; the phase is left
    /// as it was.  Idempotent.
    pub fn cancel(&mut self) {
        self.generation = crate::next_id();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// When the running countdown reaches zero.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Counting { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Secondary progress ratio in `[0, 1]`; full when ready.
    pub fn progress(&self) -> f32 {
        match self.phase {
            Phase::Ready => 1.0,
            Phase::Pending { .. } => 0.0,
            Phase::Counting { total, .. } => ratio(total, self.remaining),
        }
    }
}

fn ratio(total: Duration, remaining: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    let elapsed = total.saturating_sub(remaining);
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}
