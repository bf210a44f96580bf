//! Concurrency around a sensor hub session.
//!
//! The frame core is synchronous and allocation-light. This crate adds the
//! pieces that need a runtime:
//! - [`RecoveryCoordinator`]: delayed, cancel-and-replace hub re-initialization
//! - [`TaskPool`]: bulk jobs on tokio's blocking pool
//! - [`ChannelSink`]: samples and notices as [`HubEvent`]s on an mpsc channel
//! - [`HubDriver`]: transport reads fed into a session, timeouts escalated

pub mod config;
pub mod control;
pub mod driver;
pub mod error;
pub mod pool;
pub mod recovery;
pub mod sink;
pub mod state;

pub use config::{RecoveryConfig, SessionConfig};
pub use control::{
    ApCommand, HubControl, AP_RESET_NOTICE, AP_RESUME, AP_SLEEP, AP_SUSPEND, AP_WAKEUP,
};
pub use driver::{DriverStats, HubDriver, Step};
pub use error::{RecoveryError, Result, RuntimeError};
pub use pool::{BulkJobHandler, LoggingBulkHandler, TaskPool};
pub use recovery::{RecoveryCoordinator, RecoveryReport, RecoveryState};
pub use sink::{ChannelSink, HubEvent};
pub use state::ResetState;
