//! Delayed, cancel-and-replace hub recovery.
//!
//! At most one recovery is pending per coordinator. A new request cancels
//! the pending one, and waits for an executing one to finish before it is
//! accepted. The recovery sequence itself runs on the blocking pool.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sensorhub_frame::{HubNotice, ReportSink};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RecoveryConfig;
use crate::control::{ApCommand, HubControl};
use crate::error::RecoveryError;
use crate::state::ResetState;

/// Where the coordinator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Idle,
    Scheduled,
    Running,
}

impl RecoveryState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => RecoveryState::Scheduled,
            2 => RecoveryState::Running,
            _ => RecoveryState::Idle,
        }
    }
}

/// Result of one finished recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Reset counter value for this attempt.
    pub attempt: u64,
    pub outcome: Result<(), RecoveryError>,
}

impl RecoveryReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

struct Pending {
    id: u64,
    cancel: CancellationToken,
}

struct Inner {
    control: Arc<dyn HubControl>,
    sink: Arc<dyn ReportSink>,
    reset: Arc<ResetState>,
    config: RecoveryConfig,
    pending: Mutex<Option<Pending>>,
    // Held while a request swaps the pending slot and while a recovery runs.
    exec: tokio::sync::Mutex<()>,
    phase: AtomicU8,
    next_id: AtomicU64,
    reports: watch::Sender<Option<RecoveryReport>>,
}

/// Schedules and runs hub recovery for one session.
#[derive(Clone)]
pub struct RecoveryCoordinator {
    inner: Arc<Inner>,
}

impl RecoveryCoordinator {
    pub fn new(
        control: Arc<dyn HubControl>,
        sink: Arc<dyn ReportSink>,
        config: RecoveryConfig,
    ) -> Self {
        let (reports, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                control,
                sink,
                reset: Arc::new(ResetState::new()),
                config,
                pending: Mutex::new(None),
                exec: tokio::sync::Mutex::new(()),
                phase: AtomicU8::new(RecoveryState::Idle as u8),
                next_id: AtomicU64::new(1),
                reports,
            }),
        }
    }

    /// Schedule a recovery after `delay`, replacing any pending one.
    ///
    /// If a recovery is executing, this waits for it to finish first.
    /// Must be called from within a tokio runtime.
    pub async fn request_recovery(&self, delay: Duration) {
        let exec = self.inner.exec.lock().await;

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let replaced = self.inner.pending().replace(Pending {
            id,
            cancel: cancel.clone(),
        });
        if let Some(previous) = replaced {
            previous.cancel.cancel();
            debug!(replaced = previous.id, id, "replacing pending recovery");
        }
        self.inner.set_phase(RecoveryState::Scheduled);
        drop(exec);

        debug!(id, delay_ms = delay.as_millis() as u64, "recovery scheduled");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_scheduled(id, cancel, delay).await });
    }

    /// Count a transport timeout. Returns true when this one escalated to a
    /// recovery request. A `timeout_limit` of zero disables escalation.
    pub async fn on_timeout(&self) -> bool {
        let count = self.inner.reset.record_timeout();
        let limit = self.inner.config.timeout_limit;
        if limit == 0 || count < limit {
            debug!(count, limit, "transport timeout");
            return false;
        }
        warn!(count, limit, "hub unresponsive, requesting recovery");
        self.request_recovery(self.inner.config.delay()).await;
        true
    }

    /// A transfer arrived, so the timeout streak is over.
    pub fn on_transfer(&self) {
        self.inner.reset.clear_timeouts();
    }

    /// Drop the pending recovery, if any. An executing one is unaffected.
    pub fn cancel_pending(&self) -> bool {
        let Some(pending) = self.inner.pending().take() else {
            return false;
        };
        pending.cancel.cancel();
        let _ = self.inner.phase.compare_exchange(
            RecoveryState::Scheduled as u8,
            RecoveryState::Idle as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        debug!(id = pending.id, "pending recovery cancelled");
        true
    }

    /// Send a command on the normal path and remember it for replay.
    ///
    /// Blocks on bus I/O.
    pub fn send_command(&self, command: ApCommand) -> Result<(), RecoveryError> {
        self.inner.control.send_command(command)?;
        self.inner.reset.record_command(command);
        Ok(())
    }

    pub fn state(&self) -> RecoveryState {
        RecoveryState::from_u8(self.inner.phase.load(Ordering::Acquire))
    }

    pub fn reset_count(&self) -> u64 {
        self.inner.reset.reset_count()
    }

    pub fn timeout_count(&self) -> u32 {
        self.inner.reset.timeout_count()
    }

    pub fn reset_state(&self) -> &Arc<ResetState> {
        &self.inner.reset
    }

    /// Watch finished attempts. Holds `None` until the first one.
    pub fn subscribe(&self) -> watch::Receiver<Option<RecoveryReport>> {
        self.inner.reports.subscribe()
    }
}

impl std::fmt::Debug for RecoveryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryCoordinator")
            .field("state", &self.state())
            .field("reset_count", &self.reset_count())
            .field("timeout_count", &self.timeout_count())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, Option<Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: RecoveryState) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    async fn run_scheduled(self: Arc<Self>, id: u64, cancel: CancellationToken, delay: Duration) {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(id, "recovery timer cancelled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        let _exec = self.exec.lock().await;
        {
            let mut pending = self.pending();
            match pending.as_ref() {
                Some(current) if current.id == id => {
                    pending.take();
                }
                _ => {
                    debug!(id, "recovery superseded before it ran");
                    return;
                }
            }
        }

        self.set_phase(RecoveryState::Running);
        let attempt = self.reset.begin_attempt();
        info!(attempt, "starting hub recovery");

        let worker = Arc::clone(&self);
        let outcome = match tokio::task::spawn_blocking(move || worker.recover()).await {
            Ok(outcome) => outcome,
            Err(err) => Err(RecoveryError::Aborted(err.to_string())),
        };
        match &outcome {
            Ok(()) => info!(attempt, "hub recovered"),
            Err(err) => warn!(attempt, error = %err, "hub recovery failed"),
        }

        self.set_phase(RecoveryState::Idle);
        self.reports
            .send_replace(Some(RecoveryReport { attempt, outcome }));
    }

    // Blocking. Replay steps after a successful init are best effort.
    fn recover(&self) -> Result<(), RecoveryError> {
        self.control.initialize()?;

        if let Err(err) = self.control.sync_sensor_state() {
            warn!(error = %err, "sensor state resync failed");
        }
        self.sink.notice(HubNotice::Reset);

        let replay = [self.reset.last_ap_state(), self.reset.last_resume_state()];
        for command in replay.into_iter().flatten() {
            debug!(%command, "replaying command");
            if let Err(err) = self.control.send_command(command) {
                warn!(%command, error = %err, "command replay failed");
            }
        }

        self.reset.clear_timeouts();
        Ok(())
    }
}
