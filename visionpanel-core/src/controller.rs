//! Settings controller.
//!
//! Owns every control's state, assembles the configuration snapshot, runs the
//! debounced autosave and drives the inference start/stop lifecycle. Backend
//! calls run as tasks on the tokio runtime; their results are applied in
//! `tick()`, which the front end calls once per frame.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::binding::{BoundRange, RangeSet, ToggleSet};
use crate::configuration::{
    Configuration, DisplayBounds, PartialConfiguration, RangeName, ToggleName,
};
use crate::gateway::{BackendGateway, GatewayError};
use crate::hotkey::{HotkeyCapture, KeyDown, KeyInterceptor, KeyOutcome};
use crate::models::{ModelMap, ModelRegistry, ModelUpload};
use crate::notify::{NotificationSink, NotifyLevel, DEFAULT_NOTIFY_DURATION};
use crate::scheduler::{Clock, Debouncer};
use crate::task::{drain_ready, PendingTask, TaskPoll};

const INITIALIZED_DURATION: Duration = Duration::from_secs(2);
const INIT_FAILED_DURATION: Duration = Duration::from_secs(8);

/// Where initialization stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    NotStarted,
    Loading,
    Ready,
    /// Failed once; not retried.
    Failed,
}

/// Which lifecycle call is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Start,
    Stop,
}

/// What the startup load got before it stopped.
enum InitOutcome {
    ModelsFailed(GatewayError),
    ConfigFailed(ModelMap, GatewayError),
    Loaded(ModelMap, PartialConfiguration),
}

enum InitPhase {
    NotStarted,
    Loading {
        task: PendingTask<InitOutcome>,
        display: DisplayBounds,
    },
    Ready,
    Failed,
}

/// The panel's single owner of configuration state.
pub struct SettingsController {
    ranges: RangeSet,
    toggles: ToggleSet,
    registry: ModelRegistry,
    hotkey: HotkeyCapture,
    autosave: Debouncer,
    clock: Arc<dyn Clock>,
    gateway: Arc<dyn BackendGateway>,
    sink: Arc<dyn NotificationSink>,
    runtime: Handle,
    display: DisplayBounds,
    running: bool,
    lifecycle: Option<(Transition, PendingTask<Result<(), GatewayError>>)>,
    saves: Vec<PendingTask<()>>,
    init: InitPhase,
    wired: bool,
}

impl SettingsController {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        sink: Arc<dyn NotificationSink>,
        runtime: Handle,
        clock: Arc<dyn Clock>,
        interceptor: Box<dyn KeyInterceptor>,
        autosave_delay: Duration,
    ) -> Self {
        let registry = ModelRegistry::new(Arc::clone(&gateway), Arc::clone(&sink), runtime.clone());
        Self {
            ranges: RangeSet::with_defaults(),
            toggles: ToggleSet::with_defaults(),
            registry,
            hotkey: HotkeyCapture::new(String::new(), interceptor),
            autosave: Debouncer::new(autosave_delay),
            clock,
            gateway,
            sink,
            runtime,
            display: DisplayBounds::FALLBACK,
            running: false,
            lifecycle: None,
            saves: Vec::new(),
            init: InitPhase::NotStarted,
            wired: false,
        }
    }

    /// Replace the toggles present on the rendering surface.
    pub fn with_toggles(mut self, toggles: ToggleSet) -> Self {
        self.toggles = toggles;
        self
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Load models, then the saved configuration, then narrow the display-bound
    /// ranges and start autosaving. Runs once.
    pub fn initialize(&mut self, display: DisplayBounds) {
        if !matches!(self.init, InitPhase::NotStarted) {
            debug!(state = ?self.init_state(), "Initialization already started");
            return;
        }

        let gateway = Arc::clone(&self.gateway);
        let task = PendingTask::spawn(&self.runtime, async move {
            let models = match gateway.list_models().await {
                Ok(models) => models,
                Err(e) => return InitOutcome::ModelsFailed(e),
            };
            match gateway.load_config().await {
                Ok(config) => InitOutcome::Loaded(models, config),
                Err(e) => InitOutcome::ConfigFailed(models, e),
            }
        });

        let DisplayBounds { width, height } = display;
        info!(width, height, "Initializing panel");
        self.init = InitPhase::Loading { task, display };
    }

    pub fn init_state(&self) -> InitState {
        match self.init {
            InitPhase::NotStarted => InitState::NotStarted,
            InitPhase::Loading { .. } => InitState::Loading,
            InitPhase::Ready => InitState::Ready,
            InitPhase::Failed => InitState::Failed,
        }
    }

    fn poll_init(&mut self) {
        let InitPhase::Loading { task, display } = &mut self.init else {
            return;
        };
        let display = *display;

        let outcome = match task.poll() {
            TaskPoll::Pending => return,
            TaskPoll::Ready(outcome) => outcome,
            TaskPoll::Lost => {
                self.fail_init("initialization task ended unexpectedly");
                return;
            }
        };

        match outcome {
            InitOutcome::ModelsFailed(e) => self.fail_init(&e.user_message()),
            InitOutcome::ConfigFailed(models, e) => {
                self.registry.apply_models(models);
                self.fail_init(&e.user_message());
            }
            InitOutcome::Loaded(models, config) => {
                self.registry.apply_models(models);
                // Bounds first, so loaded values are clamped to the real display
                self.display = display;
                self.ranges.apply_display(display);
                self.apply_config(&config);
                self.wired = true;
                self.init = InitPhase::Ready;

                info!(models = self.registry.len(), "Panel initialized");
                self.sink
                    .notify(NotifyLevel::Success, "Initialized.", INITIALIZED_DURATION);
            }
        }
    }

    fn fail_init(&mut self, message: &str) {
        error!(error = %message, "Initialization failed");
        self.init = InitPhase::Failed;
        self.sink.notify(
            NotifyLevel::Error,
            &format!(
                "Initialization failed: {message}. Make sure the backend service is running."
            ),
            INIT_FAILED_DURATION,
        );
    }

    /// Apply the defined fields of a loaded configuration. Not a commit.
    fn apply_config(&mut self, config: &PartialConfiguration) {
        if let Some(model) = config.model.as_deref() {
            self.registry.apply_loaded(model);
        }
        if let Some(hotkey) = config.hotkey.as_deref() {
            self.hotkey.apply(hotkey);
        }
        for name in RangeName::ALL {
            if let Some(value) = config.range(name) {
                self.ranges.get_mut(name).apply(value);
            }
        }
        for name in ToggleName::ALL {
            if let Some(value) = config.toggle(name) {
                self.toggles.apply(name, value);
            }
        }
    }

    // =========================================================================
    // Snapshot & autosave
    // =========================================================================

    /// Full configuration from live control state.
    pub fn snapshot(&self) -> Configuration {
        Configuration {
            model: self.registry.selected().unwrap_or_default().to_string(),
            hotkey: self.hotkey.hotkey().to_string(),
            range_width: self.ranges.value(RangeName::RangeWidth),
            range_height: self.ranges.value(RangeName::RangeHeight),
            aim_speed: self.ranges.value(RangeName::AimSpeed),
            offset_x: self.ranges.value(RangeName::OffsetX),
            offset_y: self.ranges.value(RangeName::OffsetY),
            show_scope: self.toggles.get(ToggleName::ShowScope),
            enable_draw: self.toggles.get(ToggleName::EnableDraw),
        }
    }

    /// A control committed a change.
    fn committed(&mut self, source: &str) {
        if !self.wired {
            debug!(source, "Change before initialization, not scheduling save");
            return;
        }
        self.autosave.schedule(self.clock.now());
        debug!(source, delay_ms = self.autosave.delay().as_millis() as u64, "Autosave scheduled");
    }

    fn flush(&mut self) {
        let config = self.snapshot();
        let gateway = Arc::clone(&self.gateway);
        let sink = Arc::clone(&self.sink);

        debug!("Flushing configuration");
        self.saves.push(PendingTask::spawn(&self.runtime, async move {
            match gateway.save_config(&config).await {
                Ok(()) => debug!("Configuration saved"),
                Err(e) => {
                    error!(error = %e, "Failed to save configuration");
                    sink.notify(
                        NotifyLevel::Error,
                        &format!("Auto-save failed: {}", e.user_message()),
                        DEFAULT_NOTIFY_DURATION,
                    );
                }
            }
        }));
    }

    // =========================================================================
    // Control events
    // =========================================================================

    pub fn range(&self, name: RangeName) -> &BoundRange {
        self.ranges.get(name)
    }

    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    /// Slider moved.
    pub fn slide_range(&mut self, name: RangeName, value: i64) {
        let _ = self.ranges.get_mut(name).slide(value);
        self.committed(name.key());
    }

    /// Numeric field text changed.
    pub fn edit_range_text(&mut self, name: RangeName, text: impl Into<String>) {
        self.ranges.get_mut(name).edit_text(text);
    }

    /// Numeric field lost focus or saw Enter.
    pub fn commit_range_text(&mut self, name: RangeName) {
        if self.ranges.get_mut(name).commit_text().is_some() {
            self.committed(name.key());
        }
    }

    pub fn toggles(&self) -> &ToggleSet {
        &self.toggles
    }

    pub fn set_toggle(&mut self, name: ToggleName, value: bool) {
        if self.toggles.set(name, value) {
            self.committed(name.key());
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn select_model(&mut self, model_id: &str) {
        if self.registry.select(model_id) {
            self.committed("model");
        }
    }

    pub fn refresh_models(&mut self) {
        self.registry.refresh();
    }

    pub fn import_model(&mut self, upload: ModelUpload) {
        self.registry.import(upload);
    }

    pub fn delete_model(&mut self, model_id: &str) {
        self.registry.delete(model_id);
    }

    pub fn hotkey(&self) -> &HotkeyCapture {
        &self.hotkey
    }

    pub fn begin_hotkey_capture(&mut self) {
        self.hotkey.begin();
    }

    /// Key press while the panel has focus. Returns whether the key's default
    /// handling must be suppressed.
    pub fn hotkey_key_down(&mut self, event: &KeyDown) -> bool {
        let outcome = self.hotkey.key_down(event);
        if matches!(outcome, KeyOutcome::Captured(_)) {
            self.committed("hotkey");
        }
        outcome.suppresses_default()
    }

    pub fn hotkey_click_outside(&mut self) {
        if self.hotkey.click_outside().is_some() {
            self.committed("hotkey");
        }
    }

    // =========================================================================
    // Inference lifecycle
    // =========================================================================

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a start or stop call is awaiting the backend.
    pub fn lifecycle_pending(&self) -> bool {
        self.lifecycle.is_some()
    }

    pub fn start(&mut self) {
        if self.running {
            debug!("Inference already running, ignoring start");
            return;
        }
        if self.lifecycle.is_some() {
            debug!("Lifecycle call in flight, ignoring start");
            return;
        }

        let config = self.snapshot();
        let gateway = Arc::clone(&self.gateway);
        let task = PendingTask::spawn(&self.runtime, async move {
            gateway.start_inference(&config).await
        });
        self.lifecycle = Some((Transition::Start, task));
    }

    pub fn stop(&mut self) {
        if !self.running {
            debug!("Inference not running, ignoring stop");
            return;
        }
        if self.lifecycle.is_some() {
            debug!("Lifecycle call in flight, ignoring stop");
            return;
        }

        let gateway = Arc::clone(&self.gateway);
        let task = PendingTask::spawn(&self.runtime, async move { gateway.stop_inference().await });
        self.lifecycle = Some((Transition::Stop, task));
    }

    fn poll_lifecycle(&mut self) {
        let Some((transition, task)) = self.lifecycle.as_mut() else {
            return;
        };
        let transition = *transition;

        let result = match task.poll() {
            TaskPoll::Pending => return,
            TaskPoll::Ready(result) => result,
            TaskPoll::Lost => Err(GatewayError::Transport(
                "request ended unexpectedly".to_string(),
            )),
        };
        self.lifecycle = None;

        match (transition, result) {
            (Transition::Start, Ok(())) => {
                self.running = true;
                info!("Inference started");
            }
            (Transition::Stop, Ok(())) => {
                self.running = false;
                info!("Inference stopped");
            }
            (Transition::Start, Err(e)) => {
                warn!(error = %e, "Failed to start inference");
                self.sink.notify(
                    NotifyLevel::Error,
                    &format!("Failed to start inference: {}", e.user_message()),
                    DEFAULT_NOTIFY_DURATION,
                );
            }
            (Transition::Stop, Err(e)) => {
                warn!(error = %e, "Failed to stop inference");
                self.sink.notify(
                    NotifyLevel::Error,
                    &format!("Failed to stop inference: {}", e.user_message()),
                    DEFAULT_NOTIFY_DURATION,
                );
            }
        }
    }

    // =========================================================================
    // Event pump
    // =========================================================================

    /// Apply finished backend calls and fire a due autosave.
    pub fn tick(&mut self) {
        self.poll_init();
        self.registry.poll();
        self.poll_lifecycle();
        drain_ready(&mut self.saves, "autosave");

        if self.autosave.take_due(self.clock.now()) {
            self.flush();
        }
    }

    /// Whether anything is outstanding: a backend call or a pending autosave.
    pub fn is_busy(&self) -> bool {
        self.tasks_outstanding() || self.autosave.is_pending()
    }

    /// When the pending autosave is due, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    pub fn display(&self) -> DisplayBounds {
        self.display
    }

    fn tasks_outstanding(&self) -> bool {
        matches!(self.init, InitPhase::Loading { .. })
            || self.registry.is_busy()
            || self.lifecycle.is_some()
            || !self.saves.is_empty()
    }
}

impl std::fmt::Debug for SettingsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsController")
            .field("init", &self.init_state())
            .field("running", &self.running)
            .field("wired", &self.wired)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
