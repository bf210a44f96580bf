//! Host-side frame parsing and dispatch for microcontroller sensor hubs.
//!
//! A sensor hub multiplexes samples, debug text, library payloads, bulk
//! transfer headers and time-sync markers into one byte stream. sensorhub
//! walks that stream, decodes samples onto a host time base and hands the
//! rest to the right collaborator.
//!
//! # Crate Structure
//!
//! - [`transport`]: Transfer framing for captures and bridge streams
//! - [`frame`]: Instruction-tag dispatch, decoders, time base, bulk hand-off
//! - [`runtime`]: Recovery, bulk job pool and event channel (behind `runtime` feature)

/// Re-export transport types.
pub mod transport {
    pub use sensorhub_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sensorhub_frame::*;
}

/// Re-export runtime types (requires `runtime` feature).
#[cfg(feature = "runtime")]
pub mod runtime {
    pub use sensorhub_runtime::*;
}
