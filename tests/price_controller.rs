//! End-to-end behaviour of the price series controller against a scripted
//! price source, driven on paused tokio time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use market_pulse::async_trait;
use market_pulse::domain::price::wire::MarketChartPoint;
use market_pulse::prelude::*;

/// History keyed by requested window; live prices served from a queue.
#[derive(Default)]
struct ScriptedSource {
    windows: Mutex<Vec<(f64, Vec<f64>)>>,
    live: Mutex<VecDeque<f64>>,
    latency: Duration,
    history_calls: AtomicUsize,
    current_calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    fn window(self, days: f64, values: Vec<f64>) -> Self {
        self.windows.lock().unwrap().push((days, values));
        self
    }

    fn live(self, values: impl IntoIterator<Item = f64>) -> Self {
        self.live.lock().unwrap().extend(values);
        self
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn history(&self, days: f64) -> Result<Vec<MarketChartPoint>, SdkError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        let values = self
            .windows
            .lock()
            .unwrap()
            .iter()
            .find(|(d, _)| *d == days)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| SdkError::Other(format!("no window for {} days", days)))?;
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(i, price)| MarketChartPoint {
                time_ms: 1_792_332_202_000 + i as i64 * 60_000,
                price,
            })
            .collect())
    }

    async fn current(&self) -> Result<f64, SdkError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.live
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SdkError::Http(HttpError::Timeout))
    }
}

#[tokio::test(start_paused = true)]
async fn near_realtime_backfills_then_appends_every_30s() {
    let source = Arc::new(
        ScriptedSource::new(Duration::from_millis(50))
            .window(30.0, vec![100.0, 101.0])
            .live([102.0, 102.0, 103.0]),
    );
    let mut chart = PriceSeriesController::new(Arc::clone(&source));
    chart.start().await;

    tokio::time::sleep(Duration::from_secs(95)).await;

    let snapshot = chart.snapshot();
    assert_eq!(snapshot.mode, Mode::NearRealtime);
    assert_eq!(snapshot.values(), [100.0, 101.0, 102.0, 102.0, 103.0]);
    assert_eq!(snapshot.direction, Some(Direction::Up));
    assert_eq!(source.history_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.current_calls.load(Ordering::SeqCst), 3);

    chart.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_polls_are_skipped_and_polling_continues() {
    let source = Arc::new(
        ScriptedSource::new(Duration::ZERO).window(30.0, vec![10.0, 11.0]),
    );
    let mut chart = PriceSeriesController::new(Arc::clone(&source));
    chart.start().await;

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(source.current_calls.load(Ordering::SeqCst), 2);
    assert_eq!(chart.snapshot().values(), [10.0, 11.0]);
    assert!(chart.is_refreshing());

    source.live.lock().unwrap().push_back(9.0);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(chart.snapshot().values(), [10.0, 11.0, 9.0]);
    assert_eq!(chart.direction(), Some(Direction::Down));
}

#[tokio::test(start_paused = true)]
async fn oversized_history_and_polls_stay_within_capacity() {
    let history: Vec<f64> = (0..600).map(f64::from).collect();
    let source = Arc::new(
        ScriptedSource::new(Duration::ZERO)
            .window(30.0, history)
            .live([1_000.0, 1_001.0]),
    );
    let mut chart = PriceSeriesController::new(Arc::clone(&source));
    chart.start().await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    let values = chart.snapshot().values();
    assert_eq!(values.len(), SERIES_CAPACITY);
    assert_eq!(values[0], 100.0);
    assert_eq!(values[SERIES_CAPACITY - 1], 599.0);

    tokio::time::sleep(Duration::from_secs(60)).await;
    let values = chart.snapshot().values();
    assert_eq!(values.len(), SERIES_CAPACITY);
    assert_eq!(values[0], 102.0);
    assert_eq!(&values[SERIES_CAPACITY - 2..], [1_000.0, 1_001.0]);
}

#[tokio::test(start_paused = true)]
async fn switching_modes_mid_backfill_shows_only_the_new_window() {
    let source = Arc::new(
        ScriptedSource::new(Duration::from_secs(5))
            .window(30.0, vec![1.0, 2.0])
            .window(1.0, vec![10.0, 9.0]),
    );
    let mut chart = PriceSeriesController::new(Arc::clone(&source));
    let mut updates = chart.subscribe();

    chart.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    chart.set_mode(Mode::LastDay).await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    let snapshot = chart.snapshot();
    assert_eq!(snapshot.mode, Mode::LastDay);
    assert_eq!(snapshot.values(), [10.0, 9.0]);
    // Labels are rendered in the local zone; only the hourly shape is stable.
    let labels = snapshot.labels();
    assert_eq!(labels.len(), 2);
    assert!(labels.iter().all(|l| l.len() == "dd/mm, HH:MM".len()));
    assert_eq!(snapshot.color(), Direction::Down.color());
    assert_eq!(source.current_calls.load(Ordering::SeqCst), 0);
    assert!(!chart.historical_loaded_for_realtime());

    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().mode, Mode::LastDay);
}

#[tokio::test(start_paused = true)]
async fn returning_to_realtime_after_another_mode_refetches_history() {
    let source = Arc::new(
        ScriptedSource::new(Duration::ZERO)
            .window(30.0, vec![1.0, 2.0])
            .window(0.041, vec![5.0, 6.0]),
    );
    let mut chart = PriceSeriesController::new(Arc::clone(&source));

    chart.set_mode(Mode::NearRealtime).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    chart.set_mode(Mode::NearRealtime).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.history_calls.load(Ordering::SeqCst), 1);

    chart.set_mode(Mode::LastHour).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(chart.snapshot().values(), [5.0, 6.0]);

    chart.set_mode(Mode::NearRealtime).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.history_calls.load(Ordering::SeqCst), 3);
    assert_eq!(chart.snapshot().values(), [1.0, 2.0]);
}

#[tokio::test]
async fn direct_operations_report_outcomes() {
    let source = ScriptedSource::new(Duration::ZERO)
        .window(1.0, vec![100.0, 105.0])
        .live([104.0]);
    let chart = PriceSeriesController::with_config(
        source,
        ControllerConfig {
            initial_mode: Mode::LastDay,
            capacity: 3,
        },
    );

    assert_eq!(chart.load_historical(Mode::LastDay).await.unwrap(), ApplyOutcome::Applied);
    assert_eq!(chart.direction(), Some(Direction::Up));

    assert_eq!(chart.poll_latest().await.unwrap(), ApplyOutcome::Applied);
    assert_eq!(chart.direction(), Some(Direction::Down));
    assert_eq!(chart.snapshot().values(), [100.0, 105.0, 104.0]);

    assert!(chart.poll_latest().await.is_err());
    assert_eq!(chart.snapshot().values(), [100.0, 105.0, 104.0]);
    assert_eq!(price_tick(chart.snapshot().latest().unwrap().value), "$104.00");
}
