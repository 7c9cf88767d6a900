/// Nourishment level at which a plant counts as fully nourished.
///
/// The server may report higher levels; for progress purposes they are
/// capped here.
pub const MAX_NOURISHMENT: u8 = 21;

/// Longest cooldown a page may describe: one year.
pub const MAX_COOLDOWN_SECS: u64 = 365 * 24 * 60 * 60;

/// Primary progress ratio for a nourishment level, in `[0, 1]`.
#[must_use]
pub fn nourishment_ratio(level: u8) -> f32 {
    f32::from(level.min(MAX_NOURISHMENT)) / f32::from(MAX_NOURISHMENT)
}

/// Page-wide experience display.
///
/// Any component may read it; only the watering-success path writes to it,
/// through [`ExperienceCell::raise`], so the shown value never decreases even
/// when responses arrive out of order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExperienceCell {
    value: u64,
}

impl ExperienceCell {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.value
    }

    /// Apply `max(current, candidate)`.  Returns `true` if the value changed.
    pub fn raise(&mut self, candidate: u64) -> bool {
        if candidate > self.value {
            self.value = candidate;
            true
        } else {
            false
        }
    }
}

/// Outcome of a watering request that reached the Plant Service.
///
/// Transport failures are reported separately as errors; a `Rejected` reply
/// is the server saying no (e.g. the plant is still on cooldown server-side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaterReply {
    Accepted {
        /// New nourishment level, as reported by the server.
        nourishment: u8,
        /// New total user experience, if the server sent one.
        experience: Option<u64>,
        /// Human-readable message from the server.
        text: Option<String>,
        /// Experience bonus breakdown, e.g. `+12 exp, x1.5 You voted!`.
        bonus: Option<String>,
    },
    Rejected {
        /// Why the server refused, when it said.
        reason: Option<String>,
    },
}
