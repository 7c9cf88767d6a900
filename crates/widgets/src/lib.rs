pub mod cooldown;
pub mod plant;

pub use cooldown::{Cooldown, Phase, Tick, MAX_COOLDOWN};
pub use plant::{PlantView, PlantWidget, WaterOutcome};

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique id for countdown loops and water requests, so a
/// message from a removed widget can never match its same-named successor.
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
