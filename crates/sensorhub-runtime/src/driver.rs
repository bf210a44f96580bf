//! Pumps transfers from a transport into a hub session.

use std::io::Read;

use sensorhub_frame::{FrameError, HubSession, ParseSummary};
use sensorhub_transport::TransferReader;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::recovery::RecoveryCoordinator;

/// What one [`HubDriver::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A transfer was parsed.
    Parsed(ParseSummary),
    /// A transfer was dropped on a frame error. The session carries on with
    /// the next transfer.
    Rejected(FrameError),
    /// The transport timed out; `escalated` is true when this requested a
    /// recovery.
    TimedOut { escalated: bool },
    /// The transport ended cleanly.
    End,
}

/// Counters over a [`HubDriver::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub transfers: u64,
    pub rejected: u64,
    pub timeouts: u64,
    pub escalations: u64,
}

/// Reads transfers and feeds them to one session.
///
/// Reads block on the underlying stream; give it a read timeout so stalls
/// surface as timeouts.
pub struct HubDriver<R> {
    reader: TransferReader<R>,
    session: HubSession,
    recovery: Option<RecoveryCoordinator>,
}

impl<R: Read> HubDriver<R> {
    pub fn new(reader: TransferReader<R>, session: HubSession) -> Self {
        Self {
            reader,
            session,
            recovery: None,
        }
    }

    /// Escalate transport timeouts to this coordinator.
    pub fn with_recovery(mut self, recovery: RecoveryCoordinator) -> Self {
        self.recovery = Some(recovery);
        self
    }

    /// Read and dispatch one transfer.
    ///
    /// Frame errors come back as [`Step::Rejected`]; only transport errors
    /// other than a timeout are returned as `Err`.
    pub async fn step(&mut self) -> Result<Step> {
        match self.reader.read_transfer() {
            Ok(Some(transfer)) => {
                if let Some(recovery) = &self.recovery {
                    recovery.on_transfer();
                }
                match self.session.parse(&transfer) {
                    Ok(summary) => Ok(Step::Parsed(summary)),
                    Err(err) => Ok(Step::Rejected(err)),
                }
            }
            Ok(None) => Ok(Step::End),
            Err(err) if err.is_timeout() => {
                let escalated = match &self.recovery {
                    Some(recovery) => recovery.on_timeout().await,
                    None => false,
                };
                Ok(Step::TimedOut { escalated })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Step until the transport ends or `cancel` fires.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<DriverStats> {
        info!(session = self.session.name(), "hub driver started");
        let mut stats = DriverStats::default();

        loop {
            if cancel.is_cancelled() {
                info!("hub driver cancelled");
                break;
            }

            match self.step().await? {
                Step::Parsed(summary) => {
                    stats.transfers += 1;
                    debug!(consumed = summary.consumed, samples = summary.samples, "transfer parsed");
                }
                Step::Rejected(err) => {
                    stats.transfers += 1;
                    stats.rejected += 1;
                    debug!(error = %err, "transfer rejected");
                }
                Step::TimedOut { escalated } => {
                    stats.timeouts += 1;
                    if escalated {
                        stats.escalations += 1;
                        warn!(timeouts = stats.timeouts, "escalated to recovery");
                    }
                    tokio::task::yield_now().await;
                }
                Step::End => break,
            }
        }

        info!(
            transfers = stats.transfers,
            rejected = stats.rejected,
            timeouts = stats.timeouts,
            "hub driver ended"
        );
        Ok(stats)
    }

    pub fn session(&self) -> &HubSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut HubSession {
        &mut self.session
    }

    pub fn into_session(self) -> HubSession {
        self.session
    }
}
