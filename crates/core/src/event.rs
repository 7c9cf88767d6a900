use crate::{error::GardenError, state::WaterReply};

/// All messages (events) that can flow through the page event bus.
///
/// Sources:
/// - stdin command reader   → user actions (`Water*`, `DeleteModal*`, …)
/// - spawned HTTP requests  → `Watered`, `Deleted`, `Revived`
/// - per-widget timers      → `CooldownTick`, `DeleteConfirmArmed`
/// - config watcher task    → `ConfigReloaded`
///
/// Every message names its plant directly; the page looks the widget up by
/// key and drops the message if the widget is gone.
#[derive(Debug)]
pub enum Message {
    // ── User actions ──────────────────────────────────────────────────────────
    /// Water button pressed.
    WaterRequested(String),
    /// Delete button pressed; opens the confirmation modal.
    DeleteModalOpened(String),
    /// Confirmation modal dismissed.
    DeleteModalClosed(String),
    /// Confirm button inside the modal pressed.
    DeleteConfirmed(String),
    /// Revive button pressed.
    ReviveRequested(String),
    /// Colour slider moved (degrees of hue rotation).
    HueChanged(String, i32),
    /// Print every widget.
    Render,

    // ── Plant Service responses ───────────────────────────────────────────────
    /// `/water_plant` finished.  `ticket` identifies the request.
    Watered {
        plant:  String,
        ticket: u64,
        result: Result<WaterReply, GardenError>,
    },
    /// `/delete_plant` finished.  `ticket` identifies the request.
    Deleted {
        plant:  String,
        ticket: u64,
        result: Result<bool, GardenError>,
    },
    /// `/revive_plant` finished.
    Revived {
        plant:  String,
        result: Result<bool, GardenError>,
    },

    // ── Timers ────────────────────────────────────────────────────────────────
    /// Periodic countdown tick from the loop started with `generation`.
    CooldownTick { plant: String, generation: u64 },
    /// The modal's confirm button delay elapsed for modal opening `token`.
    DeleteConfirmArmed { plant: String, token: u64 },

    // ── Internal ──────────────────────────────────────────────────────────────
    /// Page description changed on disk; reconcile the widgets.
    ConfigReloaded,
    /// Graceful shutdown requested.
    Shutdown,
}
