use garden_client::PlantService;
use garden_config::{GardenConfig, PlantConfig};
use garden_core::{ExperienceCell, GardenError, Message, Result};
use garden_widgets::{PlantWidget, Tick, WaterOutcome, MAX_COOLDOWN};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Shortest countdown tick period the page will schedule.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Whether the event loop should keep going after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A widget on the page plus the countdown task driving it.
#[derive(Debug)]
struct Mounted {
    widget:    PlantWidget,
    countdown: Option<JoinHandle<()>>,
}

impl Mounted {
    fn stop_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.widget.cancel();
        self.stop_countdown();
    }
}

/// The plant page.
///
/// Every state change goes through [`Page::update`], called from a single
/// task draining one queue.  Requests and timers run as spawned tasks that
/// only post messages back, so they never touch widget state directly.
/// Must be created inside a tokio runtime.
pub struct Page<S> {
    service:       Arc<S>,
    queue:         mpsc::Sender<Message>,
    widgets:       BTreeMap<String, Mounted>,
    experience:    ExperienceCell,
    tick_period:   Duration,
    confirm_delay: Duration,
    /// Plant whose revive request is in flight, if any.
    reviving:      Option<String>,
    /// Page description to re-read on `ConfigReloaded`.
    source:        Option<PathBuf>,
}

impl<S: PlantService> Page<S> {
    /// Mount every plant of `config`, starting any cooldown already running.
    pub fn new(service: S, config: &GardenConfig, queue: mpsc::Sender<Message>) -> Self {
        let mut page = Self {
            service:       Arc::new(service),
            queue,
            widgets:       BTreeMap::new(),
            experience:    ExperienceCell::new(config.page.experience),
            tick_period:   tick_period(config),
            confirm_delay: confirm_delay(config),
            reviving:      None,
            source:        None,
        };
        for plant in &config.plants {
            page.mount(plant);
        }
        page
    }

    /// Remember where the page description lives so reloads can re-read it.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn experience(&self) -> u64 {
        self.experience.get()
    }

    pub fn widget(&self, name: &str) -> Option<&PlantWidget> {
        self.widgets.get(name).map(|m| &m.widget)
    }

    pub fn widgets(&self) -> impl Iterator<Item = &PlantWidget> {
        self.widgets.values().map(|m| &m.widget)
    }

    /// Whether a countdown task is currently attached to `name`.
    pub fn has_countdown(&self, name: &str) -> bool {
        self.widgets
            .get(name)
            .is_some_and(|m| m.countdown.as_ref().is_some_and(|h| !h.is_finished()))
    }

    // ── Update ────────────────────────────────────────────────────────────────

    pub fn update(&mut self, message: Message) -> Flow {
        match message {
            Message::WaterRequested(plant) => self.request_water(&plant),
            Message::Watered { plant, ticket, result } => {
                let Some(mounted) = self.widgets.get_mut(&plant) else {
                    debug!("Watering response for removed plant '{plant}' dropped");
                    return Flow::Continue;
                };
                let now = Instant::now();
                let outcome =
                    mounted.widget.finish_water(ticket, result, &mut self.experience, now);
                if let WaterOutcome::Watered { generation, .. } = outcome {
                    restart_countdown(mounted, generation, now, &self.queue, self.tick_period);
                }
            }
            Message::CooldownTick { plant, generation } => {
                let Some(mounted) = self.widgets.get_mut(&plant) else {
                    return Flow::Continue;
                };
                if mounted.widget.tick(generation, Instant::now()) == Tick::Finished {
                    mounted.stop_countdown();
                }
            }
            Message::DeleteModalOpened(plant) => {
                if let Some(mounted) = self.widgets.get_mut(&plant) {
                    let token = mounted.widget.open_delete_modal();
                    let queue = self.queue.clone();
                    let delay = self.confirm_delay;
                    tokio::spawn(async move {
                        time::sleep(delay).await;
                        let _ = queue.send(Message::DeleteConfirmArmed { plant, token }).await;
                    });
                } else {
                    warn!("{}", GardenError::UnknownPlant(plant));
                }
            }
            Message::DeleteConfirmArmed { plant, token } => {
                if let Some(mounted) = self.widgets.get_mut(&plant) {
                    mounted.widget.arm_delete_confirm(token);
                }
            }
            Message::DeleteModalClosed(plant) => {
                if let Some(mounted) = self.widgets.get_mut(&plant) {
                    mounted.widget.close_delete_modal();
                }
            }
            Message::DeleteConfirmed(plant) => self.request_delete(&plant),
            Message::Deleted { plant, ticket, result } => {
                let Some(mounted) = self.widgets.get_mut(&plant) else {
                    debug!("Delete response for removed plant '{plant}' dropped");
                    return Flow::Continue;
                };
                if !mounted.widget.finish_delete(ticket) {
                    return Flow::Continue;
                }
                match result {
                    Ok(true) => {
                        self.unmount(&plant);
                        info!("Deleted plant '{plant}'");
                    }
                    Ok(false) => warn!("Server refused to delete '{plant}'"),
                    Err(e) => warn!("Deleting '{plant}' failed: {e}"),
                }
            }
            Message::ReviveRequested(plant) => self.request_revive(&plant),
            Message::Revived { plant, result } => {
                if self.reviving.as_deref() == Some(plant.as_str()) {
                    self.reviving = None;
                }
                match result {
                    Ok(true) => {
                        if let Some(mounted) = self.widgets.get_mut(&plant) {
                            mounted.widget.revived();
                            info!("Revived plant '{plant}'");
                        }
                    }
                    Ok(false) => warn!("Server refused to revive '{plant}'"),
                    Err(e) => warn!("Reviving '{plant}' failed: {e}"),
                }
            }
            Message::HueChanged(plant, degrees) => {
                if let Some(mounted) = self.widgets.get_mut(&plant) {
                    mounted.widget.set_hue(degrees);
                }
            }
            Message::Render => println!("{}", self.render()),
            Message::ConfigReloaded => match self.source.clone() {
                Some(path) => match garden_config::load(&path) {
                    Ok(config) => {
                        self.reload(&config);
                        info!("Page description reloaded");
                    }
                    Err(e) => warn!("Page reload failed: {e}"),
                },
                None => debug!("No page description to reload"),
            },
            Message::Shutdown => {
                self.shutdown();
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    // ── Operations ────────────────────────────────────────────────────────────

    /// Restart `plant`'s cooldown with `remaining` left, replacing any
    /// running countdown.
    pub fn initialize(&mut self, plant: &str, remaining: Duration) -> Result<()> {
        let mounted = self
            .widgets
            .get_mut(plant)
            .ok_or_else(|| GardenError::UnknownPlant(plant.to_string()))?;
        let now = Instant::now();
        let generation = mounted.widget.initialize(remaining, now);
        restart_countdown(mounted, generation, now, &self.queue, self.tick_period);
        Ok(())
    }

    /// Stop `plant`'s countdown.  Idempotent.
    pub fn cancel(&mut self, plant: &str) {
        if let Some(mounted) = self.widgets.get_mut(plant) {
            mounted.widget.cancel();
            mounted.stop_countdown();
        }
    }

    /// Reconcile the page with a new description: plants no longer listed
    /// are removed, new ones mounted, surviving ones keep their live state.
    pub fn reload(&mut self, config: &GardenConfig) {
        let gone: Vec<String> = self
            .widgets
            .keys()
            .filter(|name| !config.plants.iter().any(|p| &p.name == *name))
            .cloned()
            .collect();
        for name in gone {
            self.unmount(&name);
            info!("Plant '{name}' left the page");
        }

        for plant in &config.plants {
            if !self.widgets.contains_key(&plant.name) {
                self.mount(plant);
                info!("Plant '{}' joined the page", plant.name);
            }
        }

        self.tick_period = tick_period(config);
        self.confirm_delay = confirm_delay(config);
        self.experience.raise(config.page.experience);
    }

    /// Cancel every countdown.
    pub fn shutdown(&mut self) {
        for mounted in self.widgets.values_mut() {
            mounted.widget.cancel();
            mounted.stop_countdown();
        }
    }

    /// The whole page as text: experience header, then one line per plant.
    pub fn render(&self) -> String {
        let mut out = format!("experience: {}", self.experience.get());
        for widget in self.widgets() {
            out.push('\n');
            out.push_str(&widget.render());
        }
        out
    }

    fn mount(&mut self, plant: &PlantConfig) {
        let mut mounted = Mounted {
            widget:    PlantWidget::new(plant),
            countdown: None,
        };
        let now = Instant::now();
        let generation = mounted.widget.initialize(plant.cooldown_remaining(), now);
        restart_countdown(&mut mounted, generation, now, &self.queue, self.tick_period);
        self.widgets.insert(plant.name.clone(), mounted);
    }

    fn unmount(&mut self, plant: &str) -> bool {
        // Dropping `Mounted` cancels the widget and aborts its countdown.
        self.widgets.remove(plant).is_some()
    }

    fn revive_guard(&self, action: &str, plant: &str) -> bool {
        if let Some(reviving) = &self.reviving {
            info!("Ignoring {action} on '{plant}' while '{reviving}' is being revived");
            return false;
        }
        true
    }

    fn request_water(&mut self, plant: &str) {
        if !self.revive_guard("water", plant) {
            return;
        }
        let Some(mounted) = self.widgets.get_mut(plant) else {
            warn!("{}", GardenError::UnknownPlant(plant.to_string()));
            return;
        };
        let ticket = match mounted.widget.begin_water() {
            Ok(ticket) => ticket,
            Err(e) => {
                info!("Not watering: {e}");
                return;
            }
        };

        let service = Arc::clone(&self.service);
        let queue = self.queue.clone();
        let plant = plant.to_string();
        tokio::spawn(async move {
            let result = service.water(&plant).await;
            let _ = queue.send(Message::Watered { plant, ticket, result }).await;
        });
    }

    fn request_delete(&mut self, plant: &str) {
        if !self.revive_guard("delete", plant) {
            return;
        }
        let Some(mounted) = self.widgets.get_mut(plant) else {
            warn!("{}", GardenError::UnknownPlant(plant.to_string()));
            return;
        };
        let ticket = match mounted.widget.begin_delete() {
            Ok(ticket) => ticket,
            Err(e) => {
                info!("Not deleting: {e}");
                return;
            }
        };

        let service = Arc::clone(&self.service);
        let queue = self.queue.clone();
        let plant = plant.to_string();
        tokio::spawn(async move {
            let result = service.delete(&plant).await;
            let _ = queue.send(Message::Deleted { plant, ticket, result }).await;
        });
    }

    fn request_revive(&mut self, plant: &str) {
        if !self.revive_guard("revive", plant) {
            return;
        }
        let Some(mounted) = self.widgets.get(plant) else {
            warn!("{}", GardenError::UnknownPlant(plant.to_string()));
            return;
        };
        if let Err(e) = mounted.widget.begin_revive() {
            info!("Not reviving: {e}");
            return;
        }

        self.reviving = Some(plant.to_string());
        let service = Arc::clone(&self.service);
        let queue = self.queue.clone();
        let plant = plant.to_string();
        tokio::spawn(async move {
            let result = service.revive(&plant).await;
            let _ = queue.send(Message::Revived { plant, result }).await;
        });
    }
}

/// Replace `mounted`'s countdown task with one for `generation`, if any.
fn restart_countdown(
    mounted: &mut Mounted,
    generation: Option<u64>,
    start: Instant,
    queue: &mpsc::Sender<Message>,
    period: Duration,
) {
    mounted.stop_countdown();
    let (Some(generation), Some(deadline)) = (generation, mounted.widget.cooldown().deadline())
    else {
        return;
    };
    mounted.countdown = Some(spawn_countdown(
        queue.clone(),
        mounted.widget.name().to_string(),
        generation,
        start,
        deadline,
        period,
    ));
}

/// Post a `CooldownTick` every `period` after `start`, plus one exactly at
/// `deadline`, then stop.
fn spawn_countdown(
    queue: mpsc::Sender<Message>,
    plant: String,
    generation: u64,
    start: Instant,
    deadline: Instant,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut next = start.checked_add(period).unwrap_or(deadline);
        loop {
            let at = next.min(deadline);
            time::sleep_until(at).await;
            let tick = Message::CooldownTick {
                plant: plant.clone(),
                generation,
            };
            if queue.send(tick).await.is_err() || at >= deadline {
                break;
            }
            next = next.checked_add(period).unwrap_or(deadline);
        }
    })
}

fn tick_period(config: &GardenConfig) -> Duration {
    config.page.tick_period().clamp(MIN_TICK, MAX_COOLDOWN)
}

fn confirm_delay(config: &GardenConfig) -> Duration {
    config.page.delete_confirm_delay().min(MAX_COOLDOWN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::WaterReply;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;

    const SEC: Duration = Duration::from_secs(1);

    /// In-memory Plant Service: replies are queued up front, calls recorded.
    #[derive(Default)]
    struct FakeService {
        water_replies: Mutex<VecDeque<Result<WaterReply>>>,
        delete_ok:     bool,
        revive_ok:     bool,
        latency:       Duration,
        calls:         Mutex<Vec<String>>,
    }

    impl FakeService {
        fn with_water(replies: Vec<Result<WaterReply>>) -> Self {
            Self {
                water_replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str, plant: &str) {
            self.calls.lock().unwrap().push(format!("{call} {plant}"));
        }
    }

    impl PlantService for FakeService {
        fn water(&self, plant: &str) -> impl Future<Output = Result<WaterReply>> + Send {
            self.record("water", plant);
            let reply = self
                .water_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GardenError::Http("no reply queued".into())));
            let latency = self.latency;
            async move {
                time::sleep(latency).await;
                reply
            }
        }

        fn delete(&self, plant: &str) -> impl Future<Output = Result<bool>> + Send {
            self.record("delete", plant);
            let (ok, latency) = (self.delete_ok, self.latency);
            async move {
                time::sleep(latency).await;
                Ok(ok)
            }
        }

        fn revive(&self, plant: &str) -> impl Future<Output = Result<bool>> + Send {
            self.record("revive", plant);
            let (ok, latency) = (self.revive_ok, self.latency);
            async move {
                time::sleep(latency).await;
                Ok(ok)
            }
        }
    }

    fn plant(name: &str, base_secs: u64, remaining_secs: u64) -> PlantConfig {
        let mut config = PlantConfig::new(name);
        config.nourishment = 7;
        config.base_cooldown_secs = base_secs;
        config.cooldown_remaining_secs = remaining_secs;
        config
    }

    fn config(plants: Vec<PlantConfig>) -> GardenConfig {
        GardenConfig {
            plants,
            ..GardenConfig::default()
        }
    }

    fn page_with(
        plants: Vec<PlantConfig>,
        service: FakeService,
    ) -> (Page<FakeService>, mpsc::Receiver<Message>) {
        let (queue, events) = mpsc::channel(64);
        (Page::new(service, &config(plants), queue), events)
    }

    fn accepted(nourishment: u8, experience: u64) -> Result<WaterReply> {
        Ok(WaterReply::Accepted {
            nourishment,
            experience: Some(experience),
            text: None,
            bonus: None,
        })
    }

    fn enabled(page: &Page<FakeService>, name: &str) -> bool {
        page.widget(name).unwrap().view().action_enabled
    }

    fn assert_invariant(page: &Page<FakeService>) {
        for w in page.widgets() {
            assert_eq!(w.view().action_enabled, w.cooldown().remaining().is_zero());
        }
    }

    /// Apply every message that arrives within the next `window`.
    async fn run_for(
        page: &mut Page<FakeService>,
        events: &mut mpsc::Receiver<Message>,
        window: Duration,
    ) {
        let until = Instant::now() + window;
        while let Ok(Some(message)) = time::timeout_at(until, events.recv()).await {
            page.update(message);
            assert_invariant(page);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn watering_runs_a_full_cooldown() {
        let service = FakeService::with_water(vec![accepted(14, 50)]);
        let (mut page, mut events) = page_with(vec![plant("rose", 8, 0)], service);
        assert!(enabled(&page, "rose"));
        assert!(!page.has_countdown("rose"));

        page.update(Message::WaterRequested("rose".into()));
        // Locked out before the response arrives.
        assert!(!enabled(&page, "rose"));

        let message = events.recv().await.unwrap();
        assert!(matches!(message, Message::Watered { .. }));
        page.update(message);

        let view = page.widget("rose").unwrap().view();
        assert_eq!(view.nourishment, 14);
        assert_eq!(view.remaining_secs, 8);
        assert_eq!(page.experience(), 50);
        assert!(page.has_countdown("rose"));

        for k in 1..=8 {
            let message = events.recv().await.unwrap();
            assert!(matches!(message, Message::CooldownTick { .. }));
            page.update(message);
            assert_invariant(&page);
            assert_eq!(enabled(&page, "rose"), k == 8, "after tick {k}");
        }

        assert!(!page.has_countdown("rose"));
        time::sleep(5 * SEC).await;
        assert!(events.try_recv().is_err());
        assert_eq!(page.service().calls(), vec!["water rose"]);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_control_sends_nothing() {
        let (mut page, _events) = page_with(vec![plant("rose", 5, 5)], FakeService::default());
        let before = page.widget("rose").unwrap().view().clone();
        assert!(!before.action_enabled);

        page.update(Message::WaterRequested("rose".into()));

        assert!(page.service().calls().is_empty());
        assert_eq!(page.widget("rose").unwrap().view(), &before);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_watering_restores_everything() {
        let service = FakeService::with_water(vec![Ok(WaterReply::Rejected { reason: None })]);
        let (mut page, mut events) = page_with(vec![plant("rose", 8, 0)], service);
        let before = page.widget("rose").unwrap().view().clone();

        page.update(Message::WaterRequested("rose".into()));
        assert_eq!(page.widget("rose").unwrap().view().primary_progress, None);
        run_for(&mut page, &mut events, SEC).await;

        assert_eq!(page.widget("rose").unwrap().view(), &before);
        assert!(!page.has_countdown("rose"));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_returns_control() {
        // No reply queued: the fake answers with an HTTP error.
        let (mut page, mut events) = page_with(vec![plant("rose", 8, 0)], FakeService::default());

        page.update(Message::WaterRequested("rose".into()));
        run_for(&mut page, &mut events, SEC).await;

        assert!(enabled(&page, "rose"));
        assert_eq!(page.widget("rose").unwrap().view().nourishment, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn removed_widget_ignores_late_ticks() {
        let (mut page, mut events) = page_with(
            vec![plant("rose", 5, 5), plant("tulip", 5, 0)],
            FakeService::default(),
        );

        let first = events.recv().await.unwrap();
        let Message::CooldownTick { generation, .. } = first else {
            panic!("expected a tick, got {first:?}");
        };
        page.update(first);
        assert!(page.has_countdown("rose"));

        page.reload(&config(vec![plant("tulip", 5, 0)]));
        assert!(page.widget("rose").is_none());
        let tulip = page.widget("tulip").unwrap().view().clone();

        // The countdown was aborted: nothing else arrives.
        time::sleep(10 * SEC).await;
        assert!(events.try_recv().is_err());

        // A straggler tick is harmless.
        page.update(Message::CooldownTick {
            plant: "rose".into(),
            generation,
        });
        assert!(page.widget("rose").is_none());
        assert_eq!(page.widget("tulip").unwrap().view(), &tulip);
    }

    #[tokio::test(start_paused = true)]
    async fn initializing_twice_keeps_one_countdown() {
        let (mut page, mut events) = page_with(vec![plant("rose", 3, 0)], FakeService::default());

        page.initialize("rose", 3 * SEC).unwrap();
        page.initialize("rose", 3 * SEC).unwrap();

        let mut ticks = 0;
        while let Ok(Some(message)) = time::timeout(5 * SEC, events.recv()).await {
            if matches!(message, Message::CooldownTick { .. }) {
                ticks += 1;
            }
            page.update(message);
        }
        assert_eq!(ticks, 3);
        assert!(enabled(&page, "rose"));
        assert!(page.initialize("lily", SEC).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_countdown() {
        let (mut page, mut events) = page_with(vec![plant("rose", 4, 4)], FakeService::default());
        page.cancel("rose");
        page.cancel("rose");
        assert!(!page.has_countdown("rose"));

        time::sleep(10 * SEC).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn experience_keeps_the_highest_reply() {
        let mut service = FakeService::with_water(vec![accepted(9, 300), accepted(11, 200)]);
        service.latency = SEC;
        let (mut page, mut events) = page_with(
            vec![plant("rose", 8, 0), plant("tulip", 8, 0)],
            service,
        );

        page.update(Message::WaterRequested("rose".into()));
        page.update(Message::WaterRequested("tulip".into()));
        run_for(&mut page, &mut events, 20 * SEC).await;

        assert_eq!(page.experience(), 300);
        for w in page.widgets() {
            assert_ne!(w.view().nourishment, 7, "{} was not watered", w.name());
            assert!(w.view().action_enabled);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delete_waits_for_confirmation() {
        let service = FakeService {
            delete_ok: true,
            ..FakeService::default()
        };
        let (mut page, mut events) = page_with(vec![plant("rose", 8, 0)], service);

        page.update(Message::DeleteModalOpened("rose".into()));
        page.update(Message::DeleteConfirmed("rose".into()));
        assert!(page.service().calls().is_empty());

        // Confirm button arms after the delay.
        let armed = events.recv().await.unwrap();
        assert!(matches!(armed, Message::DeleteConfirmArmed { .. }));
        page.update(armed);
        assert!(page.widget("rose").unwrap().view().confirm_enabled);

        page.update(Message::DeleteConfirmed("rose".into()));
        run_for(&mut page, &mut events, SEC).await;

        assert_eq!(page.service().calls(), vec!["delete rose"]);
        assert!(page.widget("rose").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn refused_delete_keeps_the_plant() {
        let (mut page, mut events) = page_with(vec![plant("rose", 8, 0)], FakeService::default());

        page.update(Message::DeleteModalOpened("rose".into()));
        run_for(&mut page, &mut events, 2 * SEC).await;
        page.update(Message::DeleteConfirmed("rose".into()));
        run_for(&mut page, &mut events, SEC).await;

        assert!(page.widget("rose").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn delete_reply_for_replaced_plant_is_ignored() {
        let service = FakeService {
            delete_ok: true,
            latency: 2 * SEC,
            ..FakeService::default()
        };
        let (mut page, mut events) = page_with(vec![plant("rose", 8, 0)], service);

        page.update(Message::DeleteModalOpened("rose".into()));
        run_for(&mut page, &mut events, Duration::from_millis(1_500)).await;
        page.update(Message::DeleteConfirmed("rose".into()));

        // The plant leaves and comes back while the delete is in flight.
        page.reload(&config(vec![]));
        page.reload(&config(vec![plant("rose", 8, 0)]));
        run_for(&mut page, &mut events, 3 * SEC).await;

        assert_eq!(page.service().calls(), vec!["delete rose"]);
        assert!(page.widget("rose").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_cooldowns_do_not_panic() {
        let service = FakeService::with_water(vec![accepted(9, 0)]);
        let (mut page, mut events) = page_with(
            vec![plant("rose", u64::MAX, u64::MAX), plant("tulip", u64::MAX, 0)],
            service,
        );
        assert!(!enabled(&page, "rose"));
        assert!(page.has_countdown("rose"));
        assert_eq!(page.widget("rose").unwrap().cooldown().remaining(), MAX_COOLDOWN);

        page.update(Message::WaterRequested("tulip".into()));
        let message = events.recv().await.unwrap();
        assert!(matches!(message, Message::Watered { .. }));
        page.update(message);

        assert!(!enabled(&page, "tulip"));
        assert!(page.has_countdown("tulip"));
        assert_eq!(page.widget("tulip").unwrap().cooldown().remaining(), MAX_COOLDOWN);
        assert_invariant(&page);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_tick_period_still_counts_down() {
        let mut description = config(vec![plant("rose", 2, 2)]);
        description.page.tick_ms = 0;
        let (queue, mut events) = mpsc::channel(64);
        let mut page = Page::new(FakeService::default(), &description, queue);

        run_for(&mut page, &mut events, 3 * SEC).await;
        assert!(enabled(&page, "rose"));
    }

    #[tokio::test(start_paused = true)]
    async fn revive_in_flight_blocks_other_actions() {
        let mut dead = plant("fern", 8, 0);
        dead.dead = true;
        let service = FakeService {
            revive_ok: true,
            latency: 2 * SEC,
            ..FakeService::default()
        };
        let (mut page, mut events) = page_with(vec![dead, plant("rose", 8, 0)], service);

        page.update(Message::ReviveRequested("fern".into()));
        page.update(Message::WaterRequested("rose".into()));
        page.update(Message::ReviveRequested("fern".into()));
        assert!(enabled(&page, "rose"));

        run_for(&mut page, &mut events, 5 * SEC).await;

        assert_eq!(page.service().calls(), vec!["revive fern"]);
        assert!(!page.widget("fern").unwrap().view().dead);
    }

    #[tokio::test(start_paused = true)]
    async fn reload_reconciles_widgets() {
        let (mut page, mut events) = page_with(
            vec![plant("rose", 10, 10), plant("tulip", 8, 0)],
            FakeService::default(),
        );
        run_for(&mut page, &mut events, Duration::from_millis(3_500)).await;
        let rose_left = page.widget("rose").unwrap().cooldown().remaining();
        assert_eq!(rose_left, 7 * SEC);

        // The reloaded description still says 10s for rose; live state wins.
        let mut next = config(vec![plant("rose", 10, 10), plant("lily", 4, 2)]);
        next.page.experience = 90;
        page.reload(&next);

        assert!(page.widget("tulip").is_none());
        assert_eq!(page.widget("rose").unwrap().cooldown().remaining(), rose_left);
        assert!(!enabled(&page, "lily"));
        assert!(page.has_countdown("lily"));
        assert_eq!(page.experience(), 90);

        run_for(&mut page, &mut events, Duration::from_millis(2_500)).await;
        assert!(enabled(&page, "lily"));
        assert!(!enabled(&page, "rose"));
    }

    #[tokio::test(start_paused = true)]
    async fn render_lists_every_plant() {
        let (mut page, _events) = page_with(
            vec![plant("rose", 8, 0), plant("tulip", 8, 3)],
            FakeService::default(),
        );
        page.update(Message::HueChanged("rose".into(), 380));

        let text = page.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "experience: 0");
        assert!(lines[1].starts_with("rose") && lines[1].contains("ready"));
        assert!(lines[1].contains(" 20°"));
        assert!(lines[2].starts_with("tulip") && lines[2].contains("3s"));
        assert_eq!(page.update(Message::Shutdown), Flow::Exit);
    }
}
