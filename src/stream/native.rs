//! Native feed stream client: `reqwest` streaming body over tokio.
//!
//! Full implementation with:
//! - Background tokio task for connection management
//! - Local JSON tree rebuilt from `put`/`patch` events
//! - Idle timeout on top of the server's 30s keep-alive
//! - Exponential backoff reconnection with jitter
//! - Stream-based event delivery to consumer

use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::Stream;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::StreamError;
use crate::stream::{FeedEvent, FeedTree, ReadyState, RtdbEvent, SseDecoder, SseEvent, StreamConfig};

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Disconnect,
}

// ─── Disconnect reasons for reconnection decision ────────────────────────────

enum DisconnectReason {
    UserRequested,
    /// `cancel` / `auth_revoked`: reconnecting would be refused again.
    Revoked,
    Error,
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: StreamConfig,
    client: reqwest::Client,
    event_tx: mpsc::Sender<FeedEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    reconnect_attempts: u32,
    ready_state: Arc<AtomicU16>,
    tree: FeedTree,
}

impl TaskState {
    fn emit(&self, event: FeedEvent) {
        if self.event_tx.try_send(event).is_err() {
            tracing::warn!("Feed event channel full or closed; dropping event");
        }
    }

    fn should_reconnect(&self) -> bool {
        self.config.reconnect && self.reconnect_attempts < self.config.max_reconnect_attempts
    }

    fn set_ready_state(&self, state: ReadyState) {
        self.ready_state.store(state as u16, Ordering::SeqCst);
    }

    /// Apply one server event. `Some` ends the connection.
    fn handle_event(&mut self, event: &SseEvent) -> Option<DisconnectReason> {
        match RtdbEvent::from_sse(event) {
            Ok(RtdbEvent::KeepAlive) => None,
            Ok(RtdbEvent::Cancel(reason)) => {
                tracing::warn!("Feed stream cancelled by server: {}", reason);
                self.emit(FeedEvent::Disconnected {
                    reason: format!("Cancelled: {}", reason),
                });
                Some(DisconnectReason::Revoked)
            }
            Ok(RtdbEvent::AuthRevoked) => {
                tracing::warn!("Feed stream auth revoked");
                self.emit(FeedEvent::Disconnected {
                    reason: "Auth revoked".into(),
                });
                Some(DisconnectReason::Revoked)
            }
            Ok(RtdbEvent::Unknown(name)) => {
                tracing::debug!("Ignoring feed stream event {:?}", name);
                None
            }
            Ok(data_event) => {
                self.tree.apply(data_event);
                self.emit(FeedEvent::Snapshot(self.tree.value().clone()));
                None
            }
            Err(e) => {
                tracing::warn!("Feed stream protocol error: {}", e);
                self.emit(FeedEvent::Error(e.to_string()));
                None
            }
        }
    }
}

// ─── Public FeedStream ───────────────────────────────────────────────────────

/// Native push-feed client for the realtime database's streaming REST API.
///
/// Uses a background tokio task for connection management.
/// The public API communicates with it via mpsc channels.
pub struct FeedStream {
    config: StreamConfig,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<FeedEvent>>,
    event_tx: mpsc::Sender<FeedEvent>,
    task_handle: Option<JoinHandle<()>>,
    ready_state: Arc<AtomicU16>,
}

impl FeedStream {
    /// Create a new stream client. Does not connect yet.
    pub fn new(config: StreamConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            config,
            cmd_tx: None,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            ready_state: Arc::new(AtomicU16::new(ReadyState::Closed as u16)),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Start streaming the channel.
    ///
    /// Spawns a background tokio task that manages the connection,
    /// keeps the local tree and reconnects on failure. A no-op while that
    /// task is running; once it has ended on its own a fresh task is started.
    pub async fn connect(&mut self) -> Result<(), StreamError> {
        if self.task_handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Ok(());
        }
        self.cmd_tx = None;
        self.task_handle = None;
        if self.config.database_url.trim().is_empty() {
            return Err(StreamError::ConnectionFailed(
                "no database URL configured".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(self.config.connect_timeout_ms))
            .build()
            .map_err(|e| StreamError::ConnectionFailed(e.to_string()))?;

        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        self.cmd_tx = Some(cmd_tx);
        self.ready_state
            .store(ReadyState::Connecting as u16, Ordering::SeqCst);

        let state = TaskState {
            config: self.config.clone(),
            client,
            event_tx: self.event_tx.clone(),
            cmd_rx,
            reconnect_attempts: 0,
            ready_state: Arc::clone(&self.ready_state),
            tree: FeedTree::new(),
        };

        self.task_handle = Some(tokio::spawn(run_task(state)));
        Ok(())
    }

    /// Stop streaming and wait for the background task to finish.
    pub async fn disconnect(&mut self) -> Result<(), StreamError> {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Disconnect).await;
        }

        if let Some(mut handle) = self.task_handle.take() {
            if tokio::time::timeout(Duration::from_secs(5), &mut handle)
                .await
                .is_err()
            {
                tracing::warn!("Feed stream task did not stop in time; aborting");
                handle.abort();
            }
        }

        self.ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);
        Ok(())
    }

    /// Whether the stream is currently open.
    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.ready_state.load(Ordering::SeqCst))
    }

    /// Get a stream of events from the feed connection.
    ///
    /// The returned stream borrows `self`, so it must be dropped
    /// before calling `disconnect()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = FeedEvent> + Send + '_>> {
        Box::pin(async_stream::stream! {
            let mut rx = self.event_rx.lock().await;
            while let Some(event) = rx.recv().await {
                yield event;
            }
        })
    }
}

impl Drop for FeedStream {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    loop {
        // ── 1. Attempt connection ────────────────────────────────────────
        let response = match attempt_connect(&state.client, &state.config).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Feed stream connection failed: {}", e);
                state.emit(FeedEvent::Error(e.to_string()));

                if state.should_reconnect() {
                    if !backoff_sleep(&mut state).await {
                        return;
                    }
                    continue;
                }
                state.set_ready_state(ReadyState::Closed);
                state.emit(FeedEvent::MaxReconnectReached);
                return;
            }
        };

        // ── 2. Connected ─────────────────────────────────────────────────
        state.reconnect_attempts = 0;
        state.set_ready_state(ReadyState::Open);
        state.emit(FeedEvent::Connected);
        tracing::info!("Feed stream connected to channel {:?}", state.config.channel);

        // ── 3. Read events until the connection breaks ───────────────────
        let reason = run_connected(&mut state, response).await;

        // ── 4. Post-disconnect decision ──────────────────────────────────
        state.set_ready_state(ReadyState::Closed);

        match reason {
            DisconnectReason::UserRequested | DisconnectReason::Revoked => return,
            DisconnectReason::Error => {
                if state.should_reconnect() {
                    state.set_ready_state(ReadyState::Connecting);
                    if !backoff_sleep(&mut state).await {
                        state.set_ready_state(ReadyState::Closed);
                        return;
                    }
                    continue;
                }
                state.emit(FeedEvent::MaxReconnectReached);
                return;
            }
        }
    }
}

/// The inner connected loop: runs until the connection breaks.
async fn run_connected(state: &mut TaskState, response: reqwest::Response) -> DisconnectReason {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    let idle = Duration::from_millis(state.config.idle_timeout_ms);
    let idle_sleep = tokio::time::sleep(idle);
    tokio::pin!(idle_sleep);

    loop {
        tokio::select! {
            // ── a) Body chunk ────────────────────────────────────────────
            chunk = body.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        idle_sleep.as_mut().reset(tokio::time::Instant::now() + idle);
                        for event in decoder.push(&bytes) {
                            if let Some(reason) = state.handle_event(&event) {
                                return reason;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("Feed stream error: {}", reason);
                        state.emit(FeedEvent::Disconnected { reason });
                        return DisconnectReason::Error;
                    }
                    None => {
                        state.emit(FeedEvent::Disconnected {
                            reason: "Stream ended".into(),
                        });
                        return DisconnectReason::Error;
                    }
                }
            }

            // ── b) Command from public API ───────────────────────────────
            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Disconnect) | None => return DisconnectReason::UserRequested,
                }
            }

            // ── c) Idle timeout ──────────────────────────────────────────
            () = &mut idle_sleep => {
                tracing::warn!(
                    "Feed stream idle for {}ms; reconnecting",
                    state.config.idle_timeout_ms
                );
                state.emit(FeedEvent::Disconnected {
                    reason: "Idle timeout".into(),
                });
                return DisconnectReason::Error;
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open the event stream, bounded by the configured connect timeout.
async fn attempt_connect(
    client: &reqwest::Client,
    config: &StreamConfig,
) -> Result<reqwest::Response, StreamError> {
    let request = client
        .get(config.endpoint())
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send();

    let response = tokio::time::timeout(Duration::from_millis(config.connect_timeout_ms), request)
        .await
        .map_err(|_| StreamError::ConnectionFailed("Connection timeout".into()))?
        .map_err(|e| StreamError::ConnectionFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StreamError::ConnectionFailed(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body.trim()
        )));
    }
    Ok(response)
}

// ─── Reconnection backoff ────────────────────────────────────────────────────

fn reconnect_delay_ms(attempt: u32, base_ms: u32) -> u32 {
    let exp = attempt.saturating_sub(1).min(10);
    let base = base_ms.saturating_mul(1u32 << exp);
    let jitter = rand::random::<u32>() % 500;
    base.saturating_add(jitter).min(60_000)
}

/// Sleep before the next attempt. Returns `false` if a disconnect arrived meanwhile.
async fn backoff_sleep(state: &mut TaskState) -> bool {
    state.reconnect_attempts += 1;
    let delay = reconnect_delay_ms(state.reconnect_attempts, state.config.base_reconnect_delay_ms);

    tracing::info!(
        "Reconnect attempt {}/{} in {}ms",
        state.reconnect_attempts,
        state.config.max_reconnect_attempts,
        delay
    );

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(delay as u64)) => true,
        cmd = state.cmd_rx.recv() => match cmd {
            Some(Command::Disconnect) | None => false,
        },
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
