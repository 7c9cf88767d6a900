use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root structure parsed from `garden.toml`.
///
/// The file stands in for the server-rendered page: it lists the plant
/// widgets and the values the markup would have embedded for each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    /// Where the Plant Service lives.
    pub service: ServiceConfig,
    /// Page-wide settings.
    pub page: PageConfig,
    /// One entry per plant widget, in display order.
    pub plants: Vec<PlantConfig>,
}

/// Plant Service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL; endpoint paths are appended to it.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url:     "http://127.0.0.1:8080".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Page-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Countdown tick period in milliseconds.
    pub tick_ms: u64,
    /// Delay before the delete modal's confirm button becomes usable.
    pub delete_confirm_delay_ms: u64,
    /// Experience shown when the page loads.
    pub experience: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            tick_ms:                 1_000,
            delete_confirm_delay_ms: 1_000,
            experience:              0,
        }
    }
}

impl PageConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn delete_confirm_delay(&self) -> Duration {
        Duration::from_millis(self.delete_confirm_delay_ms)
    }
}

/// Config block for a single plant widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantConfig {
    /// Plant name; unique on the page and used as the request key.
    pub name: String,
    /// Nourishment level at render time (0 – 21).
    #[serde(default)]
    pub nourishment: u8,
    /// Cooldown started after every successful watering.
    #[serde(default = "default_base_cooldown")]
    pub base_cooldown_secs: u64,
    /// Cooldown still running when the page was rendered.
    #[serde(default)]
    pub cooldown_remaining_secs: u64,
    /// Dead plants show a revive button.
    #[serde(default)]
    pub dead: bool,
    /// Hue rotation of the plant image, in degrees.
    #[serde(default)]
    pub hue: i32,
}

fn default_base_cooldown() -> u64 {
    15 * 60
}

impl PlantConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:                    name.into(),
            nourishment:             0,
            base_cooldown_secs:      default_base_cooldown(),
            cooldown_remaining_secs: 0,
            dead:                    false,
            hue:                     0,
        }
    }

    pub fn base_cooldown(&self) -> Duration {
        Duration::from_secs(self.base_cooldown_secs)
    }

    pub fn cooldown_remaining(&self) -> Duration {
        Duration::from_secs(self.cooldown_remaining_secs)
    }
}
