//! Noise engine orchestrator
//!
//! The only component with lifecycle state. On each tick it consults the
//! pacer for pacing, the idle probe for context, the synthesizer for
//! content, and the dispatcher for execution, then persists statistics and
//! reschedules. One logical flow: at most one tick is pending at any time,
//! and a new tick is armed only after the current cycle's asynchronous
//! steps have settled. `stop()` cancels the pending tick; an in-flight
//! request is allowed to finish and its result is simply not acted upon.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use chaff_core::random::RandomSource;
use chaff_core::{
    IdleProbe, Pacer, QuerySynthesizer, StateStore, StatusIndicator, ThreadRngSource,
};
use chaff_domain::constants::{AUTO_RESUME_COOLDOWN_MS, IDLE_THRESHOLD_SECS};
use chaff_domain::{Schedule, Settings, SettingsPatch, Statistics, UserState};
use chaff_infra::{DispatchOutcome, QueryDispatcher};
use chrono::{DateTime, Duration as ChronoDuration, Local, Timelike, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::control::{ControlRequest, ControlResponse, StatusReport};
use crate::error::{EngineError, EngineResult};

/// Fallback tick spacing when schedule arithmetic cannot produce a boundary.
const SCHEDULE_FALLBACK: Duration = Duration::from_secs(3_600);

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = AsyncMutex<Option<JoinHandle<()>>>;

/// Mutable engine state plus injected collaborators.
///
/// Everything here is touched from the single engine flow or from control
/// requests; locks are held only across synchronous sections.
struct EngineState {
    settings: StdMutex<Settings>,
    statistics: StdMutex<Statistics>,
    pacer: StdMutex<Pacer>,
    synthesizer: StdMutex<QuerySynthesizer>,
    paused: AtomicBool,
    auto_resume_at: StdMutex<Option<DateTime<Utc>>>,
    store: Arc<dyn StateStore>,
    idle_probe: Arc<dyn IdleProbe>,
    indicator: Arc<dyn StatusIndicator>,
    dispatcher: Arc<QueryDispatcher>,
}

fn lock_unpoisoned<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl EngineState {
    fn settings(&self) -> Settings {
        lock_unpoisoned(&self.settings).clone()
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    fn update_indicator(&self, active: bool) {
        let (text, color) = if active && self.is_paused() {
            ("||", "#FFA500")
        } else if active {
            ("ON", "#00AA00")
        } else {
            ("OFF", "#AA0000")
        };
        self.indicator.set_text(text);
        self.indicator.set_color(color);
    }

    async fn persist_settings(&self) {
        let settings = self.settings();
        if let Err(err) = self.store.save_settings(&settings).await {
            warn!(error = %err, "failed to persist settings, continuing in memory");
        }
    }

    async fn persist_statistics(&self) {
        let statistics = lock_unpoisoned(&self.statistics).clone();
        if let Err(err) = self.store.save_statistics(&statistics).await {
            warn!(error = %err, "failed to persist statistics, continuing in memory");
        }
    }
}

/// The orchestrating state machine.
pub struct NoiseEngine {
    state: Arc<EngineState>,
    cancellation_token: StdMutex<CancellationToken>,
    task_handle: TaskHandle,
}

impl NoiseEngine {
    /// Build an engine with production randomness.
    pub fn new(
        store: Arc<dyn StateStore>,
        idle_probe: Arc<dyn IdleProbe>,
        indicator: Arc<dyn StatusIndicator>,
        dispatcher: Arc<QueryDispatcher>,
    ) -> Self {
        Self::with_sources(
            store,
            idle_probe,
            indicator,
            dispatcher,
            Box::new(ThreadRngSource),
            Box::new(ThreadRngSource),
        )
    }

    /// Build an engine with injected random sources, for deterministic tests.
    pub fn with_sources(
        store: Arc<dyn StateStore>,
        idle_probe: Arc<dyn IdleProbe>,
        indicator: Arc<dyn StatusIndicator>,
        dispatcher: Arc<QueryDispatcher>,
        pacer_rng: Box<dyn RandomSource>,
        synthesizer_rng: Box<dyn RandomSource>,
    ) -> Self {
        let now = Utc::now();
        let state = EngineState {
            settings: StdMutex::new(Settings::default()),
            statistics: StdMutex::new(Statistics::started_at(now)),
            pacer: StdMutex::new(Pacer::new(pacer_rng, now)),
            synthesizer: StdMutex::new(QuerySynthesizer::new(synthesizer_rng)),
            paused: AtomicBool::new(false),
            auto_resume_at: StdMutex::new(None),
            store,
            idle_probe,
            indicator,
            dispatcher,
        };
        Self {
            state: Arc::new(state),
            cancellation_token: StdMutex::new(CancellationToken::new()),
            task_handle: AsyncMutex::new(None),
        }
    }

    /// Load persisted state and, if noise generation was left enabled,
    /// resume it. Missing or unreadable records degrade to defaults.
    pub async fn init(&self) {
        match self.state.store.load_settings().await {
            Ok(Some(settings)) => {
                lock_unpoisoned(&self.state.synthesizer).update_topic_settings(&settings.topics);
                *lock_unpoisoned(&self.state.settings) = settings;
            }
            Ok(None) => debug!("no persisted settings, using defaults"),
            Err(err) => warn!(error = %err, "failed to load settings, using defaults"),
        }

        match self.state.store.load_statistics().await {
            Ok(Some(statistics)) => *lock_unpoisoned(&self.state.statistics) = statistics,
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to load statistics, starting fresh"),
        }

        self.state.update_indicator(self.is_running());

        if self.state.settings().enabled {
            self.start().await;
        }
    }

    /// Whether the background loop is running.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    /// Start noise generation. No-op if already active.
    ///
    /// Resets per-session counters, persists `enabled = true`, and arms the
    /// first tick.
    pub async fn start(&self) {
        if self.is_running() {
            return;
        }

        info!("starting noise generation");
        self.state.set_paused(false);
        *lock_unpoisoned(&self.state.auto_resume_at) = None;
        lock_unpoisoned(&self.state.statistics).begin_session(Utc::now());
        lock_unpoisoned(&self.state.settings).enabled = true;
        self.state.persist_settings().await;

        let cancel = CancellationToken::new();
        *lock_unpoisoned(&self.cancellation_token) = cancel.clone();

        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            Self::run_loop(state, cancel).await;
        });
        *self.task_handle.lock().await = Some(handle);

        self.state.update_indicator(true);
    }

    /// Stop noise generation. No-op if already stopped.
    ///
    /// Cancels the pending tick and persists `enabled = false`.
    pub async fn stop(&self) -> EngineResult<()> {
        if !self.is_running() {
            return Ok(());
        }

        info!("stopping noise generation");
        lock_unpoisoned(&self.cancellation_token).cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(EngineError::JoinFailed(err.to_string())),
                Err(_) => {
                    return Err(EngineError::StopTimeout { seconds: join_timeout.as_secs() })
                }
            }
        }

        lock_unpoisoned(&self.state.settings).enabled = false;
        self.state.persist_settings().await;
        self.state.update_indicator(false);
        Ok(())
    }

    /// Set the paused flag without altering the active state.
    pub fn pause(&self, paused: bool) {
        self.state.set_paused(paused);
        if !paused {
            *lock_unpoisoned(&self.state.auto_resume_at) = None;
        }
        self.state.update_indicator(self.is_running());
    }

    /// Merge a settings patch, persist it, and re-apply timing-affecting
    /// changes immediately by restarting the loop if it is active.
    pub async fn update_settings(&self, patch: SettingsPatch) {
        {
            let mut settings = lock_unpoisoned(&self.state.settings);
            settings.apply(&patch);
            if let Some(topics) = &patch.topics {
                lock_unpoisoned(&self.state.synthesizer).update_topic_settings(topics);
            }
        }
        self.state.persist_settings().await;

        if self.is_running() {
            if let Err(err) = self.stop().await {
                warn!(error = %err, "restart after settings update: stop failed");
            }
            self.start().await;
        }
    }

    /// Current status for the control surface.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            is_active: self.is_running(),
            is_paused: self.is_paused(),
            settings: self.state.settings(),
            statistics: lock_unpoisoned(&self.state.statistics).clone(),
            dispatch_stats: self.state.dispatcher.stats(),
        }
    }

    /// Manual trigger: run one cycle now, bypassing the rate cap, the idle
    /// gate, and the schedule window.
    pub async fn generate_now(&self) {
        Self::run_cycle(&self.state, true).await;
    }

    /// Handle one control request.
    pub async fn handle(&self, request: ControlRequest) -> ControlResponse {
        match request {
            ControlRequest::GetStatus => ControlResponse::Status(Box::new(self.status())),
            ControlRequest::UpdateSettings(patch) => {
                self.update_settings(patch).await;
                ControlResponse::Updated { success: true }
            }
            ControlRequest::Toggle => {
                if self.is_running() {
                    if let Err(err) = self.stop().await {
                        warn!(error = %err, "toggle: stop failed");
                    }
                } else {
                    self.start().await;
                }
                ControlResponse::Toggled { is_active: self.is_running() }
            }
            ControlRequest::Pause { paused } => {
                self.pause(paused);
                ControlResponse::Paused { is_paused: self.is_paused() }
            }
            ControlRequest::GenerateNow => {
                self.generate_now().await;
                ControlResponse::Generated { success: true }
            }
        }
    }

    /// Background loop: sleep until the next tick, run it, repeat.
    async fn run_loop(state: Arc<EngineState>, cancel: CancellationToken) {
        loop {
            let delay = Self::next_delay(&state);
            debug!(delay_secs = delay.as_secs(), "next tick armed");

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("engine loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(delay) => {
                    Self::tick(&state).await;
                }
            }
        }
    }

    /// Delay until the next tick.
    ///
    /// Outside the schedule window this is the gap to the next start-hour
    /// boundary; otherwise the pacer's delay stretched by the dispatch
    /// backoff multiplier.
    fn next_delay(state: &EngineState) -> Duration {
        let settings = state.settings();
        let now = Local::now();

        if settings.schedule.enabled && !within_schedule(&settings.schedule, now.hour()) {
            let wait = until_next_window(&settings.schedule, now);
            debug!(wait_secs = wait.as_secs(), "outside schedule window");
            return wait;
        }

        let base = lock_unpoisoned(&state.pacer).next_query_delay(&settings, now);
        base.mul_f64(state.dispatcher.backoff_multiplier())
    }

    /// One scheduled tick: resolve pause state, then run a cycle.
    async fn tick(state: &Arc<EngineState>) {
        // Auto-resume once the failure cooldown has elapsed.
        let resume_due = {
            let mut resume_at = lock_unpoisoned(&state.auto_resume_at);
            match *resume_at {
                Some(at) if Utc::now() >= at => {
                    *resume_at = None;
                    true
                }
                _ => false,
            }
        };
        if resume_due {
            info!("failure cooldown elapsed, resuming noise generation");
            state.set_paused(false);
            state.update_indicator(true);
        }

        if state.is_paused() {
            debug!("paused, skipping cycle");
            return;
        }

        if state.dispatcher.should_pause() {
            warn!("too many dispatch failures, pausing for cooldown");
            state.set_paused(true);
            *lock_unpoisoned(&state.auto_resume_at) =
                Some(Utc::now() + ChronoDuration::milliseconds(AUTO_RESUME_COOLDOWN_MS));
            state.update_indicator(true);
            return;
        }

        Self::run_cycle(state, false).await;
    }

    /// One query cycle.
    ///
    /// Aborts are silent skips: every failure degrades to "resume at the
    /// next scheduled tick". `manual` bypasses the rate and idle gates.
    async fn run_cycle(state: &Arc<EngineState>, manual: bool) {
        let settings = state.settings();

        if !manual {
            if !lock_unpoisoned(&state.pacer).can_execute_query(&settings) {
                debug!("hourly rate cap reached, skipping cycle");
                return;
            }

            let user_state = match state.idle_probe.query_state(IDLE_THRESHOLD_SECS).await {
                Ok(user_state) => user_state,
                Err(err) => {
                    debug!(error = %err, "idle probe unavailable, assuming active");
                    UserState::Active
                }
            };
            if !lock_unpoisoned(&state.pacer).should_mix_with_activity(user_state) {
                debug!(?user_state, "not mixing with current user state, skipping cycle");
                return;
            }
        }

        let query = {
            let mut pacer = lock_unpoisoned(&state.pacer);
            let mut synthesizer = lock_unpoisoned(&state.synthesizer);

            let complexity = pacer.query_complexity();
            let query =
                match synthesizer.generate_query(complexity, &settings, pacer.session_mut()) {
                    Ok(query) => query,
                    Err(err) => {
                        warn!(error = %err, "query synthesis failed, skipping cycle");
                        return;
                    }
                };

            if pacer.should_add_typo() {
                synthesizer.add_typo(&query)
            } else {
                query
            }
        };

        if settings.debug_mode {
            debug!(%query, "executing noise query");
        }

        let outcome = state.dispatcher.execute_query(settings.search_engine, &query).await;

        let search_url = match outcome {
            DispatchOutcome::Success { url, .. } => url,
            DispatchOutcome::Failure { error } => {
                warn!(%error, "noise query failed");
                return;
            }
        };

        lock_unpoisoned(&state.pacer).record_query();
        lock_unpoisoned(&state.statistics).record_query();
        state.persist_statistics().await;

        let wants_click =
            settings.enable_result_clicks && lock_unpoisoned(&state.pacer).should_click_result();
        if wants_click {
            let position = state.dispatcher.result_position();
            let dwell = lock_unpoisoned(&state.pacer).result_dwell_time();
            let result_url = state.dispatcher.mock_result_url(&query, position);
            let click = state.dispatcher.simulate_result_click(&result_url, &search_url, dwell).await;
            if !click.success {
                debug!(error = ?click.error, "result click simulation failed");
            }
        }

        if lock_unpoisoned(&state.pacer).should_refine_search() {
            let refined = lock_unpoisoned(&state.synthesizer).refine_query(&query);
            let delay = lock_unpoisoned(&state.pacer).refinement_delay();
            if settings.debug_mode {
                debug!(%refined, "issuing refinement query");
            }
            tokio::time::sleep(delay).await;
            let refinement = state.dispatcher.execute_query(settings.search_engine, &refined).await;
            if !refinement.is_success() {
                debug!("refinement query failed");
            }
        }
    }
}

/// Ensure the background loop is cancelled when the engine is dropped.
impl Drop for NoiseEngine {
    fn drop(&mut self) {
        lock_unpoisoned(&self.cancellation_token).cancel();
    }
}

/// Whether `hour` falls inside the `[start_hour, end_hour)` window.
fn within_schedule(schedule: &Schedule, hour: u32) -> bool {
    hour >= schedule.start_hour && hour < schedule.end_hour
}

/// Gap until the next start-hour boundary, today if still ahead, else
/// tomorrow.
fn until_next_window(schedule: &Schedule, now: DateTime<Local>) -> Duration {
    let start_hour = schedule.start_hour.min(23);
    let Some(today_start) = now.date_naive().and_hms_opt(start_hour, 0, 0) else {
        return SCHEDULE_FALLBACK;
    };

    let next = if today_start > now.naive_local() {
        today_start
    } else {
        today_start + ChronoDuration::days(1)
    };

    (next - now.naive_local()).to_std().unwrap_or(SCHEDULE_FALLBACK)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn local(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 3, hour, minute, 0).single().expect("valid local time")
    }

    #[test]
    fn schedule_window_is_half_open() {
        let schedule = Schedule { enabled: true, start_hour: 9, end_hour: 23 };
        assert!(!within_schedule(&schedule, 8));
        assert!(within_schedule(&schedule, 9));
        assert!(within_schedule(&schedule, 22));
        assert!(!within_schedule(&schedule, 23));
    }

    #[test]
    fn next_window_is_later_today_when_start_is_ahead() {
        let schedule = Schedule { enabled: true, start_hour: 9, end_hour: 23 };
        let wait = until_next_window(&schedule, local(7, 30));
        assert_eq!(wait, Duration::from_secs(90 * 60));
    }

    #[test]
    fn next_window_rolls_to_tomorrow_when_start_has_passed() {
        let schedule = Schedule { enabled: true, start_hour: 9, end_hour: 23 };
        let wait = until_next_window(&schedule, local(23, 0));
        assert_eq!(wait, Duration::from_secs(10 * 3_600));
    }
}
