//! Price series controller: owns the rolling buffer, the active mode and the
//! single refresh task that keeps the buffer in sync with upstream.
//!
//! Lifecycle:
//! - [`PriceSeriesController::start`] arms the refresh strategy of the active mode
//!   (historical backfill, then a live poll on the mode's cadence).
//! - [`PriceSeriesController::set_mode`] cancels the running task, switches mode and
//!   arms the new one. Re-selecting near-real-time after its history was loaded
//!   only re-arms the poll.
//! - [`PriceSeriesController::stop`] / [`PriceSeriesController::shutdown`] cancel it.
//!
//! Every mode switch bumps a generation counter; responses requested under an
//! older generation are discarded instead of overwriting the new mode's data.
//! Fetch failures are logged and leave the series untouched.

use super::convert::label_series;
use super::mode::Mode;
use super::source::PriceSource;
use super::state::{SeriesBuffer, SERIES_CAPACITY};
use super::PricePoint;
use crate::error::SdkError;
use crate::shared::fmt::time::chart_label;
use crate::shared::{direction_color, Direction, Granularity};

use chrono::Local;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Legend text of the chart dataset.
pub const DATASET_LABEL: &str = "Bitcoin price (USD)";

/// Result of applying a fetched response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A mode switch happened while the request was in flight.
    Stale,
}

/// Controller construction options.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub initial_mode: Mode,
    pub capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initial_mode: Mode::default(),
            capacity: SERIES_CAPACITY,
        }
    }
}

/// What the chart surface renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSnapshot {
    pub mode: Mode,
    pub points: Vec<PricePoint>,
    /// `None` until two prices have been compared.
    pub direction: Option<Direction>,
}

impl SeriesSnapshot {
    /// Line colour for the current direction.
    pub fn color(&self) -> &'static str {
        direction_color(self.direction)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

struct SeriesState {
    buffer: SeriesBuffer,
    mode: Mode,
    direction: Option<Direction>,
    last_price: Option<f64>,
    /// Cleared whenever a non-realtime mode is selected.
    historical_loaded_for_realtime: bool,
    generation: u64,
}

impl SeriesState {
    fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot {
            mode: self.mode,
            points: self.buffer.to_vec(),
            direction: self.direction,
        }
    }
}

struct Shared<S> {
    source: S,
    state: Mutex<SeriesState>,
    publisher: watch::Sender<SeriesSnapshot>,
    armed_timers: AtomicUsize,
}

impl<S: PriceSource> Shared<S> {
    fn state(&self) -> MutexGuard<'_, SeriesState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: SeriesSnapshot) {
        self.publisher.send_replace(snapshot);
    }

    fn generation(&self) -> u64 {
        self.state().generation
    }

    fn switch_mode(&self, mode: Mode) {
        let snapshot = {
            let mut state = self.state();
            if !mode.is_realtime() {
                state.historical_loaded_for_realtime = false;
            }
            state.mode = mode;
            state.generation = state.generation.wrapping_add(1);
            state.snapshot()
        };
        self.publish(snapshot);
    }

    async fn load_historical(&self, mode: Mode, generation: u64) -> Result<ApplyOutcome, SdkError> {
        let raw = self.source.history(mode.window_days()).await?;
        let points = label_series(raw, mode.granularity(), &Local);

        let snapshot = {
            let mut state = self.state();
            if state.generation != generation {
                tracing::debug!(
                    mode = %mode,
                    requested = generation,
                    current = state.generation,
                    "Discarding stale historical prices"
                );
                return Ok(ApplyOutcome::Stale);
            }

            state.buffer.replace(points);
            if let Some((previous, latest)) = state.buffer.last_pair() {
                state.direction = Some(Direction::between(previous, latest));
            }
            state.last_price = state.buffer.latest().map(|p| p.value);
            if mode.is_realtime() {
                state.historical_loaded_for_realtime = true;
            }
            state.snapshot()
        };

        tracing::debug!(mode = %mode, points = snapshot.points.len(), "Historical prices loaded");
        self.publish(snapshot);
        Ok(ApplyOutcome::Applied)
    }

    async fn poll_latest(&self, generation: u64) -> Result<ApplyOutcome, SdkError> {
        let price = self.source.current().await?;
        let now = chrono::Utc::now().timestamp_millis();
        let point = PricePoint::new(now, chart_label(now, Granularity::Minute, &Local), price);

        let snapshot = {
            let mut state = self.state();
            if state.generation != generation {
                tracing::debug!(requested = generation, current = state.generation, "Discarding stale live price");
                return Ok(ApplyOutcome::Stale);
            }

            state.buffer.push(point);
            if let Some(previous) = state.last_price {
                state.direction = Some(Direction::between(previous, price));
            }
            state.last_price = Some(price);
            state.snapshot()
        };

        self.publish(snapshot);
        Ok(ApplyOutcome::Applied)
    }
}

/// Counts a recurring timer as armed for as long as it lives.
struct ArmedTimer<'a>(&'a AtomicUsize);

impl<'a> ArmedTimer<'a> {
    fn arm(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ArmedTimer<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ─── Public controller ───────────────────────────────────────────────────────

/// Keeps a bounded price series synchronized with exactly one refresh
/// strategy at a time.
///
/// Must be driven from within a tokio runtime.
pub struct PriceSeriesController<S: PriceSource> {
    shared: Arc<Shared<S>>,
    refresh: Option<JoinHandle<()>>,
}

impl<S: PriceSource> PriceSeriesController<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ControllerConfig::default())
    }

    pub fn with_config(source: S, config: ControllerConfig) -> Self {
        let state = SeriesState {
            buffer: SeriesBuffer::new(config.capacity),
            mode: config.initial_mode,
            direction: None,
            last_price: None,
            historical_loaded_for_realtime: false,
            generation: 0,
        };
        let (publisher, _) = watch::channel(state.snapshot());

        Self {
            shared: Arc::new(Shared {
                source,
                state: Mutex::new(state),
                publisher,
                armed_timers: AtomicUsize::new(0),
            }),
            refresh: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.shared.state().mode
    }

    pub fn snapshot(&self) -> SeriesSnapshot {
        self.shared.state().snapshot()
    }

    /// Receive a fresh [`SeriesSnapshot`] after every applied change.
    pub fn subscribe(&self) -> watch::Receiver<SeriesSnapshot> {
        self.shared.publisher.subscribe()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.shared.state().direction
    }

    pub fn historical_loaded_for_realtime(&self) -> bool {
        self.shared.state().historical_loaded_for_realtime
    }

    /// Whether a refresh task (backfill or live polling) is still running.
    pub fn is_refreshing(&self) -> bool {
        self.refresh.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Arm the refresh strategy of the active mode, replacing any running one.
    pub async fn start(&mut self) {
        self.stop().await;
        self.arm();
    }

    /// Cancel the running refresh task and wait until it is gone.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.refresh.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Teardown: stop refreshing and drop the controller.
    pub async fn shutdown(mut self) {
        self.stop().await;
    }

    /// Switch the chart to `mode`.
    ///
    /// Cancels the pending refresh, clears the realtime history flag when the
    /// new mode is not near-real-time, then arms the new mode.
    pub async fn set_mode(&mut self, mode: Mode) {
        self.stop().await;
        let previous = self.mode();
        self.shared.switch_mode(mode);
        tracing::info!(from = %previous, to = %mode, "Chart mode switched");
        self.arm();
    }

    /// Fetch `mode`'s historical window and replace the series with it.
    ///
    /// `mode` must be the active mode; switch with [`Self::set_mode`] first.
    pub async fn load_historical(&self, mode: Mode) -> Result<ApplyOutcome, SdkError> {
        let generation = {
            let state = self.shared.state();
            if state.mode != mode {
                return Err(SdkError::Validation(format!(
                    "cannot load {} history while the chart shows {}",
                    mode, state.mode
                )));
            }
            state.generation
        };
        self.shared.load_historical(mode, generation).await
    }

    /// Fetch the current price and append it to the series.
    pub async fn poll_latest(&self) -> Result<ApplyOutcome, SdkError> {
        let generation = self.shared.generation();
        self.shared.poll_latest(generation).await
    }

    fn arm(&mut self) {
        let (mode, generation, load_history) = {
            let state = self.shared.state();
            let skip = state.mode.is_realtime() && state.historical_loaded_for_realtime;
            (state.mode, state.generation, !skip)
        };

        if !load_history {
            tracing::debug!(mode = %mode, "History already loaded; re-arming live polling only");
        }

        self.refresh = Some(tokio::spawn(run_refresh(
            Arc::clone(&self.shared),
            mode,
            generation,
            load_history,
        )));
    }

    #[cfg(test)]
    fn armed_timers(&self) -> usize {
        self.shared.armed_timers.load(Ordering::SeqCst)
    }
}

impl<S: PriceSource> Drop for PriceSeriesController<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh.take() {
            handle.abort();
        }
    }
}

// ─── Refresh task ────────────────────────────────────────────────────────────

async fn run_refresh<S: PriceSource>(
    shared: Arc<Shared<S>>,
    mode: Mode,
    generation: u64,
    load_history: bool,
) {
    if load_history {
        match shared.load_historical(mode, generation).await {
            Ok(ApplyOutcome::Applied) => {}
            Ok(ApplyOutcome::Stale) => return,
            Err(e) => {
                tracing::warn!(mode = %mode, error = %e, "Historical price load failed; keeping current series");
            }
        }
    }

    let Some(cadence) = mode.cadence() else {
        return;
    };

    let _armed = ArmedTimer::arm(&shared.armed_timers);
    let mut ticker = tokio::time::interval_at(Instant::now() + cadence, cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(mode = %mode, cadence_secs = cadence.as_secs(), "Live price polling armed");

    loop {
        ticker.tick().await;
        match shared.poll_latest(generation).await {
            Ok(ApplyOutcome::Applied) => {}
            Ok(ApplyOutcome::Stale) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Live price poll failed; keeping current series");
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
