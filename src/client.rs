//! The telemetry client.
//!
//! One client is created at startup and shared by handle. It holds the
//! resolved mode, the identity from the last `setup` and the event buffer
//! behind a single lock. Pushes run as detached tasks on the runtime the
//! client was built with, so `record` never waits on the network.
//!
//! ```text
//! setup ──▶ pull get_mode ──▶ mode ──▶ (SESSION | PERFORMANCE) push session report
//! record ──▶ buffer ──(5 events)──▶ swap out batch ──▶ push performance batch
//! ```

use crate::aggregate::{AggregateReader, PullError};
use crate::buffer::{EventBuffer, EventRecord};
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::identity::ClientIdentity;
use crate::mode::{ModeState, OperatingMode};
use crate::session::session_form_body;
use crate::stats::{StatsSnapshot, TelemetryStats};
use crate::transport::{Interpretation, Transport, TransportError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::Notify;

/// Mutable state shared by `setup`, `record` and the pulls.
#[derive(Debug, Default)]
struct ClientState {
    mode: ModeState,
    identity: Option<ClientIdentity>,
    buffer: EventBuffer,
    /// Bumped by every `setup`; a mode pull only lands if it is still current
    setup_generation: u64,
}

impl ClientState {
    fn root_url(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.root_url.as_str())
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    runtime: Handle,
    device_id: String,
    state: Mutex<ClientState>,
    stats: TelemetryStats,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count even if a push task is cancelled.
struct InFlightGuard(Arc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Mode-gated telemetry client.
#[derive(Clone)]
pub struct TelemetryClient {
    inner: Arc<Inner>,
}

impl TelemetryClient {
    /// Create a client that spawns its pushes on `runtime`.
    pub fn new(
        transport: Arc<dyn Transport>,
        device_id: impl Into<String>,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                runtime,
                device_id: device_id.into(),
                state: Mutex::new(ClientState::default()),
                stats: TelemetryStats::new(),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Create a client over HTTP, configured from `config`.
    #[cfg(feature = "http")]
    pub fn http(
        config: &ClientConfig,
        device_id: impl Into<String>,
        runtime: Handle,
    ) -> Result<Self, TransportError> {
        let transport = crate::transport::HttpTransport::new(config.request_timeout())?;
        Ok(Self::new(Arc::new(transport), device_id, runtime))
    }

    /// Record the identity and resolve the operating mode.
    ///
    /// Returns the mode in effect once the pull completes. If the server
    /// cannot be reached, the previous mode stays in effect and no session
    /// report is sent. Any HTTP answer, including an error status, resolves
    /// the mode; error statuses resolve to `Off`. Calling this again
    /// re-resolves and, if allowed, reports again.
    pub async fn setup(
        &self,
        root_url: impl Into<String>,
        app_id: impl Into<String>,
        app_version: impl Into<String>,
    ) -> OperatingMode {
        let identity = ClientIdentity::new(
            root_url,
            app_id,
            app_version,
            self.inner.device_id.clone(),
        );
        self.setup_identity(identity).await
    }

    /// [`TelemetryClient::setup`] with values taken from a config.
    pub async fn setup_with(&self, config: &ClientConfig) -> OperatingMode {
        self.setup_identity(config.identity(self.inner.device_id.clone()))
            .await
    }

    async fn setup_identity(&self, identity: ClientIdentity) -> OperatingMode {
        let generation = {
            let mut state = self.lock_state();
            state.setup_generation += 1;
            state.identity = Some(identity.clone());
            state.setup_generation
        };

        self.resolve(&identity, generation).await
    }

    async fn resolve(&self, identity: &ClientIdentity, generation: u64) -> OperatingMode {
        let url = Endpoint::GetMode.url(&identity.root_url);

        let mode = match self.inner.transport.pull(&url, Interpretation::Text).await {
            Ok(response) => OperatingMode::from_wire(&response.text()),
            Err(TransportError::Status { status, .. }) => {
                tracing::warn!(url = %url, status, "mode sync got an error status, turning off");
                OperatingMode::Off
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "mode sync failed, keeping current mode");
                return self.mode();
            }
        };

        {
            let mut state = self.lock_state();
            if state.setup_generation != generation {
                tracing::debug!(mode = %mode, "mode sync superseded by a newer setup");
                return state.mode.effective();
            }
            state.mode = ModeState::Resolved(mode);
        }
        self.inner.stats.record_mode_resolution();
        tracing::debug!(mode = %mode, "mode synced");

        if mode.reports_session() {
            self.report_session(identity);
        }

        mode
    }

    fn report_session(&self, identity: &ClientIdentity) {
        self.inner.stats.record_session_report();
        self.spawn_push(
            "session",
            Endpoint::PushSessionData.url(&identity.root_url),
            session_form_body(identity),
        );
    }

    /// Record one interaction.
    ///
    /// Does nothing unless the mode is [`OperatingMode::SessionAndPerformance`].
    /// Every fifth accepted event empties the buffer and sends the batch in
    /// the background. The buffer is emptied before the send, so a failed
    /// send loses that batch.
    pub fn record(&self, instrument: i64, key: i64) {
        let (batch, root_url) = {
            let mut state = self.lock_state();
            if !state.mode.effective().records_events() {
                return;
            }

            self.inner.stats.record_event();
            match state.buffer.push(EventRecord::new(instrument, key)) {
                Some(batch) => (batch, state.root_url().unwrap_or_default().to_string()),
                None => return,
            }
        };

        self.inner.stats.record_batch_flushed();
        self.spawn_push(
            "performance",
            Endpoint::PushPerformanceData.url(&root_url),
            batch.to_form_body(),
        );
    }

    fn spawn_push(&self, kind: &'static str, url: String, body: String) {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.inner));

        self.inner.runtime.spawn(async move {
            let inner = &guard.0;
            match inner.transport.push(&url, body.into_bytes()).await {
                Ok(response) => {
                    tracing::debug!(kind, url = %url, response = %response.text(), "push sent");
                }
                Err(e) => {
                    inner.stats.record_push_failure();
                    tracing::warn!(kind, url = %url, error = %e, "push failed, data dropped");
                }
            }
        });
    }

    /// Wait until every push started so far has finished.
    ///
    /// Pending events that have not filled a batch are not sent.
    pub async fn settle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Pull aggregated session reports (master role).
    pub async fn pull_session_data(&self) -> Result<serde_json::Value, PullError> {
        self.aggregate_reader()?.pull_session_data().await
    }

    /// Pull aggregated performance batches (master role).
    pub async fn pull_performance_data(&self) -> Result<serde_json::Value, PullError> {
        self.aggregate_reader()?.pull_performance_data().await
    }

    fn aggregate_reader(&self) -> Result<AggregateReader, PullError> {
        let root_url = self
            .lock_state()
            .root_url()
            .map(str::to_string)
            .ok_or(PullError::NotConfigured)?;

        Ok(AggregateReader::new(
            Arc::clone(&self.inner.transport),
            root_url,
        ))
    }

    /// Mode used for gating; `Off` until resolved.
    pub fn mode(&self) -> OperatingMode {
        self.lock_state().mode.effective()
    }

    /// Whether the mode has been resolved, and to what.
    pub fn mode_state(&self) -> ModeState {
        self.lock_state().mode
    }

    /// Identity from the last `setup`, if any.
    pub fn identity(&self) -> Option<ClientIdentity> {
        self.lock_state().identity.clone()
    }

    /// Device ID sent with session reports.
    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    /// Events waiting for the batch to fill.
    pub fn pending_events(&self) -> usize {
        self.lock_state().buffer.len()
    }

    /// Get the current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Get a summary string for display.
    pub fn stats_summary(&self) -> String {
        self.inner.stats.summary()
    }

    fn lock_state(&self) -> MutexGuard<'_, ClientState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
