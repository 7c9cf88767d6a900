pub mod error;
pub mod event;
pub mod state;

pub use error::{GardenError, Result};
pub use event::Message;
pub use state::{nourishment_ratio, ExperienceCell, WaterReply, MAX_COOLDOWN_SECS, MAX_NOURISHMENT};
