use crate::cooldown::{Cooldown, Tick, MAX_COOLDOWN};
use garden_config::PlantConfig;
use garden_core::{nourishment_ratio, ExperienceCell, GardenError, Result, WaterReply, MAX_NOURISHMENT};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Shortest base cooldown a widget accepts.  A zero base can't express the
/// lock-out, which needs `remaining > 0`.
const MIN_BASE_COOLDOWN: Duration = Duration::from_secs(1);

/// Width of the text progress bars, in cells.
const BAR_WIDTH: usize = 10;

/// Everything the page shows for one plant.
///
/// This is the "DOM" of the widget: the controller writes it, the renderer
/// and the tests read it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantView {
    pub title: String,
    /// Nourishment number shown next to the bar.
    pub nourishment: u8,
    /// Nourishment bar; `None` while a watering request is in flight.
    pub primary_progress: Option<f32>,
    /// Cooldown bar.
    pub secondary_progress: f32,
    /// Water button state.
    pub action_enabled: bool,
    /// Whole seconds left on the cooldown, rounded up.
    pub remaining_secs: u64,
    pub modal_open: bool,
    /// Confirm button inside the delete modal.
    pub confirm_enabled: bool,
    /// Hue rotation of the plant image, `[0, 360)`.
    pub hue: i32,
    pub dead: bool,
}

/// What came of a watering response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterOutcome {
    /// Server accepted; a new cooldown started (`generation` of its loop).
    Watered {
        nourishment: u8,
        generation:  Option<u64>,
    },
    /// Server refused or the request failed; indicator and control restored.
    Rejected,
    /// Response for a request this widget is no longer waiting on.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct PendingWater {
    ticket: u64,
    primary_before: Option<f32>,
}

/// One plant on the page: its server-owned values, its cooldown and the view
/// they drive.
#[derive(Debug)]
pub struct PlantWidget {
    name:          String,
    base_cooldown: Duration,
    cooldown:      Cooldown,
    view:          PlantView,
    pending:       Option<PendingWater>,
    modal_token:   u64,
    /// Ticket of the delete request in flight.
    deleting:      Option<u64>,
}

impl PlantWidget {
    /// Build a widget from its page description.  The cooldown starts
    /// enabled; call [`PlantWidget::initialize`] with the embedded remaining
    /// time to finish the setup.
    pub fn new(config: &PlantConfig) -> Self {
        let nourishment = config.nourishment.min(MAX_NOURISHMENT);
        Self {
            name:          config.name.clone(),
            base_cooldown: config.base_cooldown().clamp(MIN_BASE_COOLDOWN, MAX_COOLDOWN),
            cooldown:      Cooldown::new(),
            view: PlantView {
                title:              config.name.clone(),
                nourishment,
                primary_progress:   Some(nourishment_ratio(nourishment)),
                secondary_progress: 1.0,
                action_enabled:     true,
                remaining_secs:     0,
                modal_open:         false,
                confirm_enabled:    false,
                hue:                normalize_hue(config.hue),
                dead:               config.dead,
            },
            pending:       None,
            modal_token:   0,
            deleting:      None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view(&self) -> &PlantView {
        &self.view
    }

    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Whether a watering request is in flight.
    pub fn is_watering(&self) -> bool {
        self.pending.is_some()
    }

    // ── Cooldown ──────────────────────────────────────────────────────────────

    /// Start (or restart) the cooldown with `remaining` left.
    ///
    /// Returns the generation the caller must tag its countdown loop with, or
    /// `None` if no loop should run.
    pub fn initialize(&mut self, remaining: Duration, now: Instant) -> Option<u64> {
        let generation = self.cooldown.start(remaining, self.base_cooldown, now);
        self.sync_cooldown();
        if generation.is_some() {
            debug!(
                "Water button for '{}' disabled for {:.1}s",
                self.name,
                remaining.as_secs_f32()
            );
        }
        generation
    }

    /// Feed one countdown tick.
    pub fn tick(&mut self, generation: u64, now: Instant) -> Tick {
        let tick = self.cooldown.tick(generation, now);
        match tick {
            Tick::Running { .. } => self.sync_cooldown(),
            Tick::Finished => {
                self.sync_cooldown();
                debug!("Water button for '{}' enabled", self.name);
            }
            Tick::Ignored => {}
        }
        tick
    }

    /// Detach the countdown loop; used when the widget leaves the page.
    pub fn cancel(&mut self) {
        self.cooldown.cancel();
    }

    fn sync_cooldown(&mut self) {
        self.view.action_enabled = self.cooldown.is_ready();
        self.view.secondary_progress = self.cooldown.progress();
        self.view.remaining_secs = ceil_secs(self.cooldown.remaining());
    }

    // ── Watering ──────────────────────────────────────────────────────────────

    /// Lock the control and blank the nourishment bar before a watering
    /// request is sent.  Returns the ticket to hand back to
    /// [`PlantWidget::finish_water`].
    ///
    /// Refuses with [`GardenError::ActionDisabled`] (changing nothing) while
    /// the control is disabled or the plant is dead.
    pub fn begin_water(&mut self) -> Result<u64> {
        if !self.view.action_enabled || self.view.dead || self.pending.is_some() {
            return Err(GardenError::ActionDisabled(self.name.clone()));
        }
        if !self.cooldown.lock_out(self.base_cooldown) {
            return Err(GardenError::ActionDisabled(self.name.clone()));
        }

        let ticket = crate::next_id();
        self.pending = Some(PendingWater {
            ticket,
            primary_before: self.view.primary_progress,
        });
        self.view.primary_progress = None;
        self.sync_cooldown();
        Ok(ticket)
    }

    /// Apply the outcome of the watering request `ticket`.
    ///
    /// On acceptance the nourishment bar and the page experience are updated
    /// and a full base cooldown starts.  Otherwise the nourishment bar gets
    /// its pre-request value back and the control is enabled again.
    pub fn finish_water(
        &mut self,
        ticket: u64,
        result: Result<WaterReply>,
        experience: &mut ExperienceCell,
        now: Instant,
    ) -> WaterOutcome {
        let pending = match self.pending {
            Some(p) if p.ticket == ticket => p,
            _ => {
                debug!("Dropping stale watering response for '{}'", self.name);
                return WaterOutcome::Stale;
            }
        };
        self.pending = None;

        match result {
            Ok(WaterReply::Accepted {
                nourishment,
                experience: new_experience,
                text,
                bonus,
            }) => {
                let nourishment = nourishment.min(MAX_NOURISHMENT);
                self.view.nourishment = nourishment;
                self.view.primary_progress = Some(nourishment_ratio(nourishment));
                if let Some(xp) = new_experience {
                    experience.raise(xp);
                }
                info!(
                    "Watered '{}': nourishment {nourishment}/{MAX_NOURISHMENT}{}{}",
                    self.name,
                    text.map(|t| format!(" ({t})")).unwrap_or_default(),
                    bonus.map(|b| format!(" [{b}]")).unwrap_or_default()
                );
                let generation = self.initialize(self.base_cooldown, now);
                WaterOutcome::Watered {
                    nourishment,
                    generation,
                }
            }
            Ok(WaterReply::Rejected { reason }) => {
                info!(
                    "Watering '{}' refused: {}",
                    self.name,
                    reason.as_deref().unwrap_or("no reason given")
                );
                self.revert_water(pending);
                WaterOutcome::Rejected
            }
            Err(e) => {
                warn!("Watering '{}' failed: {e}", self.name);
                self.revert_water(pending);
                WaterOutcome::Rejected
            }
        }
    }

    fn revert_water(&mut self, pending: PendingWater) {
        self.view.primary_progress = pending.primary_before;
        self.cooldown.release();
        self.sync_cooldown();
    }

    // ── Delete modal ──────────────────────────────────────────────────────────

    /// Show the delete confirmation.  The confirm button stays disabled until
    /// [`PlantWidget::arm_delete_confirm`] is called with the returned token.
    pub fn open_delete_modal(&mut self) -> u64 {
        self.modal_token = crate::next_id();
        self.view.modal_open = true;
        self.view.confirm_enabled = false;
        self.modal_token
    }

    /// Hide the modal and disarm its confirm button.
    pub fn close_delete_modal(&mut self) {
        self.modal_token = crate::next_id();
        self.view.modal_open = false;
        self.view.confirm_enabled = false;
    }

    /// Enable the confirm button if the modal is still the one opened with
    /// `token`.
    pub fn arm_delete_confirm(&mut self, token: u64) -> bool {
        if !self.view.modal_open || token != self.modal_token {
            return false;
        }
        self.view.confirm_enabled = true;
        true
    }

    /// Check that a delete may be sent and return the ticket to hand back to
    /// [`PlantWidget::finish_delete`].  Only one delete is in flight at a time.
    pub fn begin_delete(&mut self) -> Result<u64> {
        if !self.view.modal_open || !self.view.confirm_enabled || self.deleting.is_some() {
            return Err(GardenError::ActionDisabled(self.name.clone()));
        }
        let ticket = crate::next_id();
        self.deleting = Some(ticket);
        Ok(ticket)
    }

    /// Settle the delete request `ticket`.  Returns `false` for a response
    /// this widget is not waiting on.
    pub fn finish_delete(&mut self, ticket: u64) -> bool {
        if self.deleting != Some(ticket) {
            debug!("Dropping stale delete response for '{}'", self.name);
            return false;
        }
        self.deleting = None;
        true
    }

    // ── Misc ──────────────────────────────────────────────────────────────────

    /// Rotate the plant image hue.  Purely local.
    pub fn set_hue(&mut self, degrees: i32) {
        self.view.hue = normalize_hue(degrees);
    }

    /// Check that a revive may be sent.
    pub fn begin_revive(&self) -> Result<()> {
        if self.view.dead {
            Ok(())
        } else {
            Err(GardenError::ActionDisabled(self.name.clone()))
        }
    }

    /// The server brought the plant back.
    pub fn revived(&mut self) {
        self.view.dead = false;
    }

    /// One text line for the plant.
    pub fn render(&self) -> String {
        let v = &self.view;
        let nourishment = match v.primary_progress {
            Some(ratio) => bar(ratio),
            None => "·".repeat(BAR_WIDTH),
        };
        let water = if v.dead {
            "dead".to_string()
        } else if v.action_enabled {
            "ready".to_string()
        } else {
            format!("{}s", v.remaining_secs)
        };
        let modal = if v.modal_open {
            if v.confirm_enabled { "  [delete? confirm]" } else { "  [delete? …]" }
        } else {
            ""
        };

        format!(
            "{:<16} {} {:>2}/{MAX_NOURISHMENT}  {} {:<6} hue {:>3}°{modal}",
            v.title,
            nourishment,
            v.nourishment,
            bar(v.secondary_progress),
            water,
            v.hue,
        )
    }
}

fn normalize_hue(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

fn bar(ratio: f32) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}
